use std::{error, fmt};

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{EmailAddress, User, UserId, UserName};

/// Postgres transaction that may outlive the function that opened it
pub type PgTransaction = Transaction<'static, Postgres>;

/// Provide a representation for any type that implements `Error`
pub fn error_chain_fmt(e: &impl error::Error, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{e}\n")?;

    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }

    Ok(())
}

/// Retrieve the user that matches a `user_id` from the database.
///
/// Stored contact details that no longer parse are reported as
/// [`sqlx::Error::Decode`], they may predate the current validation rules.
#[tracing::instrument(name = "Get user", skip(db_pool))]
pub async fn get_user(user_id: UserId, db_pool: &PgPool) -> sqlx::Result<Option<User>> {
    let row = sqlx::query_as::<_, (Uuid, String, String)>(
        r#"
        SELECT id, name, email
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(*user_id)
    .fetch_optional(db_pool)
    .await?;

    row.map(|(id, name, email)| -> sqlx::Result<User> {
        let name = UserName::parse(name).map_err(|e| sqlx::Error::Decode(e.into()))?;
        let email = EmailAddress::parse(email).map_err(|e| sqlx::Error::Decode(e.into()))?;
        Ok(User::new(UserId::new(id), name, email))
    })
    .transpose()
}
