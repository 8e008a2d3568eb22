use std::io;

use mounty::configuration::Settings;
use mounty::delivery_worker::DeliveryWorker;
use mounty::startup::Application;
use mounty::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
#[allow(clippy::redundant_pub_crate)]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = get_subscriber("mounty".into(), "info".into(), io::stdout);
    init_subscriber(subscriber);

    // Retrieve settings
    let config = Settings::get_config()?;

    // Prepare the application and the mail delivery worker
    let application = Application::build(config.clone())?.run_until_stopped();
    let worker = DeliveryWorker::build(config)?.run_until_stopped();

    // Run both tasks concurrently, return as soon as one of the tasks completes or errors out
    tokio::select! {
        outcome = application => outcome?,
        outcome = worker => outcome?,
    }

    Ok(())
}
