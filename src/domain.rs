mod email_address;
mod new_user;
mod user;
mod user_name;

pub use email_address::EmailAddress;
pub use new_user::NewUser;
pub use user::{User, UserId};
pub use user_name::UserName;
