/// Characters that would break out of the mail layout
const NAME_BLACKLIST: [char; 9] = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];

/// Longest display name accepted at registration, in characters
const MAX_NAME_LEN: usize = 256;

/// Display name of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    /// Parse user display name
    pub fn parse(name: String) -> Result<Self, String> {
        let is_empty = name.trim().is_empty();
        let is_too_long = name.chars().count() > MAX_NAME_LEN;
        let contains_blacklisted_chars = name.chars().any(|c| NAME_BLACKLIST.contains(&c));

        if is_empty || is_too_long || contains_blacklisted_chars {
            Err(format!("{name} is not a valid user name"))
        } else {
            Ok(Self(name))
        }
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
