//! Outbound mail: the mailables the application sends, how they are rendered,
//! and how they cross the delivery queue.
//!
//! A mailable is a plain value. Rendering needs a [`MailRenderer`], queueing
//! needs an open transaction, sending is left to the
//! [`delivery_worker`](crate::delivery_worker).

use std::fmt;

mod mailable;
mod new_user_introduction;
mod queue;
mod renderer;

pub use mailable::{Mailable, Queueable, RenderedEmail, Serializable};
pub use new_user_introduction::{NewUserIntroduction, NEW_USER_INTRODUCTION_SUBJECT};
pub use queue::{enqueue_task, MailJobId, QueuedMail};
pub use renderer::{MailRenderer, POSTS_INDEX_PATH};

use crate::utils::error_chain_fmt;

/// Mail composition and rendering error
#[derive(thiserror::Error)]
pub enum MailError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Failed to load the mail templates")]
    TemplateLoad(#[source] tera::Error),
    #[error("Failed to render the `{template}` mail template")]
    Render {
        template: String,
        #[source]
        source: tera::Error,
    },
    #[error("Invalid application base URL")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl fmt::Debug for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}
