use crate::domain::{EmailAddress, User};
use crate::mail::{Mailable, MailError, Queueable, QueuedMail, Serializable};

/// Subject of the mail sent right after registration
pub const NEW_USER_INTRODUCTION_SUBJECT: &str = "Mountyへの登録完了しました！";

const TEMPLATE: &str = "new_user_introduction";

/// Welcome mail for a user who just registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserIntroduction {
    subject: String,
    new_user: User,
}

impl NewUserIntroduction {
    pub fn new(new_user: User) -> Self {
        Self {
            subject: NEW_USER_INTRODUCTION_SUBJECT.to_string(),
            new_user,
        }
    }

    /// Compose the introduction for a user that may be missing, e.g. the result of a lookup
    pub fn compose(new_user: Option<User>) -> Result<Self, MailError> {
        new_user.map(Self::new).ok_or_else(|| {
            MailError::InvalidInput("a new user introduction needs a user to introduce".into())
        })
    }

    pub const fn user(&self) -> &User {
        &self.new_user
    }
}

impl Mailable for NewUserIntroduction {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn template(&self) -> &'static str {
        TEMPLATE
    }

    fn recipient(&self) -> &EmailAddress {
        &self.new_user.email
    }

    fn context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("user_name", self.new_user.name.as_ref());
        context
    }
}

impl Serializable for NewUserIntroduction {
    fn serialize_for_queue(&self) -> QueuedMail {
        QueuedMail::NewUserIntroduction {
            user_id: self.new_user.id,
        }
    }
}

impl Queueable for NewUserIntroduction {}
