use std::fmt;
use std::ops::Deref;

use uuid::Uuid;

use crate::domain::{EmailAddress, UserName};

/// Registered user identifier
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh identifier for a user about to be stored
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for UserId {
    type Target = Uuid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Registered user, as read back from the `users` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
}

impl User {
    pub const fn new(id: UserId, name: UserName, email: EmailAddress) -> Self {
        Self { id, name, email }
    }
}
