use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::{EmailAddress, NewUser, User, UserId, UserName};
use crate::mail::{NewUserIntroduction, Queueable};
use crate::utils::{error_chain_fmt, PgTransaction};

/// Web form data
#[derive(serde::Deserialize)]
pub struct FormData {
    email: String,
    name: String,
}

impl TryFrom<FormData> for NewUser {
    type Error = String;

    fn try_from(value: FormData) -> Result<Self, Self::Error> {
        let email = EmailAddress::parse(value.email)?;
        let name = UserName::parse(value.name)?;
        Ok(Self { email, name })
    }
}

/// Registration error
#[derive(thiserror::Error)]
pub enum RegisterError {
    #[error("{0}")]
    ValidationError(String),
    #[error("A user with this email address is already registered")]
    DuplicateEmail,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl fmt::Debug for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for RegisterError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Registration handler: store the user and queue their introduction mail
#[tracing::instrument(
    name = "Registering a new user",
    skip(form, db_pool),
    fields(
        user_email = %form.email,
        user_name = %form.name
    )
)]
pub async fn register(
    form: web::Form<FormData>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, RegisterError> {
    let new_user: NewUser = form.0.try_into().map_err(RegisterError::ValidationError)?;

    let mut transaction = db_pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let user = match insert_user(new_user, &mut transaction).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => return Err(RegisterError::DuplicateEmail),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context("Failed to insert the new user in the database")
                .into())
        }
    };
    NewUserIntroduction::new(user)
        .queue(&mut transaction)
        .await
        .context("Failed to queue the new user introduction mail")?;
    transaction
        .commit()
        .await
        .context("Failed to commit the SQL transaction to store a new user")?;

    Ok(HttpResponse::Ok().finish())
}

/// Whether the query failed on a unique constraint, i.e. `users.email`
fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

/// Insert a user into the database and return it
#[tracing::instrument(
    name = "Saving new user details in the database",
    skip(new_user, transaction)
)]
pub async fn insert_user(
    new_user: NewUser,
    transaction: &mut PgTransaction,
) -> Result<User, sqlx::Error> {
    let user_id = UserId::generate();
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(*user_id)
    .bind(new_user.name.as_ref())
    .bind(new_user.email.as_ref())
    .bind(Utc::now())
    .execute(&mut **transaction)
    .await?;

    Ok(User::new(user_id, new_user.name, new_user.email))
}
