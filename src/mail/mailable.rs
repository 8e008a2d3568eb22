use crate::domain::EmailAddress;
use crate::mail::{enqueue_task, MailJobId, QueuedMail};
use crate::utils::PgTransaction;

/// An email before rendering: who it goes to, what it is called, which
/// template it uses and what the template gets to interpolate
pub trait Mailable {
    fn subject(&self) -> &str;

    /// Template name, without the `.html`/`.txt` extension
    fn template(&self) -> &'static str;

    fn recipient(&self) -> &EmailAddress;

    /// Variables exposed to the template
    fn context(&self) -> tera::Context;
}

/// Mailable that can be turned into its queue representation
pub trait Serializable {
    /// Produce the transport-safe form; entities are referenced by id only
    fn serialize_for_queue(&self) -> QueuedMail;
}

/// Mailable that can be handed to the delivery worker
#[allow(async_fn_in_trait)]
pub trait Queueable: Serializable {
    /// Push the mailable onto the delivery queue within the caller's transaction
    async fn queue(&self, transaction: &mut PgTransaction) -> anyhow::Result<MailJobId> {
        enqueue_task(transaction, &self.serialize_for_queue()).await
    }
}

/// Rendered email, ready to be handed to the email client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub to: EmailAddress,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}
