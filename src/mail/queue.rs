use std::fmt;
use std::ops::Deref;

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::UserId;
use crate::mail::{Mailable, MailError, NewUserIntroduction};
use crate::utils::{get_user, PgTransaction};

/// Mailable as it is stored in the delivery queue.
///
/// Users cross the queue boundary as a `user_id` and are read back from the
/// database on delivery, so a mail always goes out with the current name and
/// address, and never to a user that has been deleted in the meantime.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mailable", rename_all = "snake_case")]
pub enum QueuedMail {
    NewUserIntroduction { user_id: UserId },
}

impl QueuedMail {
    /// Rebuild the mailable, looking up the entities it references
    #[tracing::instrument(name = "Restore queued mail", skip(db_pool))]
    pub async fn restore(
        &self,
        db_pool: &PgPool,
    ) -> Result<Box<dyn Mailable + Send + Sync>, MailError> {
        match *self {
            Self::NewUserIntroduction { user_id } => {
                let user = get_user(user_id, db_pool)
                    .await
                    .map_err(|e| lookup_error(user_id, e))?;
                Ok(Box::new(NewUserIntroduction::compose(user)?))
            }
        }
    }
}

/// Tell a user whose stored record is unusable apart from a failed query.
///
/// Only the former is `InvalidInput`; the latter stays `UnexpectedError` so
/// the job is kept for another attempt.
fn lookup_error(user_id: UserId, e: sqlx::Error) -> MailError {
    match e {
        sqlx::Error::Decode(e) => {
            MailError::InvalidInput(format!("user {user_id} has invalid stored details: {e}"))
        }
        e => MailError::UnexpectedError(
            anyhow::Error::new(e).context(format!("Failed to fetch user {user_id}")),
        ),
    }
}

/// Mail delivery job identifier
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MailJobId(Uuid);

impl MailJobId {
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for MailJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Deref for MailJobId {
    type Target = Uuid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Add a mail to the delivery queue
#[tracing::instrument(skip(transaction))]
pub async fn enqueue_task(
    transaction: &mut PgTransaction,
    mail: &QueuedMail,
) -> anyhow::Result<MailJobId> {
    let job_id = MailJobId::new(Uuid::new_v4());
    let payload = serde_json::to_string(mail).context("Failed to serialize the queued mail")?;

    sqlx::query(
        r#"
        INSERT INTO mail_delivery_queue (job_id, payload, enqueued_at)
        VALUES ($1, $2, now())
        "#,
    )
    .bind(*job_id)
    .bind(payload)
    .execute(&mut **transaction)
    .await
    .context("Failed to insert the mail into the delivery queue")?;

    Ok(job_id)
}
