use std::time;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::field::display;
use tracing::Span;
use uuid::Uuid;

use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::mail::{MailError, MailJobId, MailRenderer, QueuedMail};
use crate::utils::PgTransaction;

/// Pause after finding the queue empty
const EMPTY_QUEUE_BACKOFF: time::Duration = time::Duration::from_secs(10);

/// Pause after an unexpected error, e.g. the database being unreachable
const ERROR_BACKOFF: time::Duration = time::Duration::from_secs(1);

/// Outcome of a single pass over the mail delivery queue
#[derive(Debug, PartialEq, Eq)]
pub enum ExecutionOutcome {
    TaskCompleted,
    EmptyQueue,
}

/// Background worker draining the mail delivery queue
pub struct DeliveryWorker {
    db_pool: PgPool,
    email_client: EmailClient,
    renderer: MailRenderer,
}

impl DeliveryWorker {
    /// Build a delivery worker based on settings
    pub fn build(config: Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .acquire_timeout(time::Duration::from_secs(2))
            .connect_lazy_with(config.database.db_options());
        let email_client = config.email_client.client()?;
        let renderer = MailRenderer::new(&config.application.base_url)?;

        Ok(Self {
            db_pool,
            email_client,
            renderer,
        })
    }

    /// Run the worker until it is stopped
    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        loop {
            match try_execute_task(&self.db_pool, &self.email_client, &self.renderer).await {
                Ok(ExecutionOutcome::EmptyQueue) => tokio::time::sleep(EMPTY_QUEUE_BACKOFF).await,
                Err(_) => tokio::time::sleep(ERROR_BACKOFF).await,
                Ok(ExecutionOutcome::TaskCompleted) => {}
            }
        }
    }
}

/// Try executing a task in the mail delivery queue
#[tracing::instrument(
    skip_all,
    fields(
        mail_job_id=tracing::field::Empty,
        recipient=tracing::field::Empty
    ),
    err
)]
pub async fn try_execute_task(
    db_pool: &PgPool,
    email_client: &EmailClient,
    renderer: &MailRenderer,
) -> anyhow::Result<ExecutionOutcome> {
    let Some((transaction, job_id, payload)) = dequeue_task(db_pool).await? else {
        return Ok(ExecutionOutcome::EmptyQueue);
    };
    Span::current().record("mail_job_id", display(job_id));

    // Apart from a failed user lookup, failures past this point are logged and
    // the job is dropped, there is no retry
    match serde_json::from_str::<QueuedMail>(&payload) {
        Ok(mail) => match mail.restore(db_pool).await {
            Ok(mailable) => {
                Span::current().record("recipient", display(mailable.recipient()));
                let outcome = match renderer.render(&*mailable) {
                    Ok(email) => email_client.send_rendered(&email).await,
                    Err(e) => Err(e.into()),
                };
                if let Err(e) = outcome {
                    tracing::error!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        "Failed to deliver a queued mail"
                    );
                }
            }

            // Returning early rolls back the dequeue, the job is picked up on a later poll
            Err(MailError::UnexpectedError(e)) => return Err(e),

            // The referenced user is gone or its stored contact details are invalid
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Skipping a queued mail that could not be restored"
                );
            }
        },

        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Skipping a queued mail with an unreadable payload"
            );
        }
    }

    delete_task(transaction, job_id).await?;
    Ok(ExecutionOutcome::TaskCompleted)
}

/// Fetch the oldest task from the mail delivery queue
#[tracing::instrument(skip_all)]
async fn dequeue_task(
    db_pool: &PgPool,
) -> anyhow::Result<Option<(PgTransaction, MailJobId, String)>> {
    let mut transaction = db_pool.begin().await?;
    let r = sqlx::query_as::<_, (Uuid, String)>(
        r#"
        SELECT job_id, payload
        FROM mail_delivery_queue
        ORDER BY enqueued_at
        LIMIT 1
        FOR UPDATE
        SKIP LOCKED
        "#,
    )
    .fetch_optional(&mut *transaction)
    .await?;

    Ok(r.map(|(job_id, payload)| (transaction, MailJobId::new(job_id), payload)))
}

/// Remove a task from the mail delivery queue
#[tracing::instrument(skip_all)]
async fn delete_task(mut transaction: PgTransaction, job_id: MailJobId) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        DELETE FROM mail_delivery_queue
        WHERE job_id = $1
        "#,
    )
    .bind(*job_id)
    .execute(&mut *transaction)
    .await?;
    transaction.commit().await?;
    Ok(())
}
