pub mod configuration;
pub mod delivery_worker;
pub mod domain;
pub mod email_client;
pub mod mail;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
