use crate::domain::{EmailAddress, UserName};

/// User submitted through the registration form, not yet stored
pub struct NewUser {
    pub email: EmailAddress,
    pub name: UserName,
}
