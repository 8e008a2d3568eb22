use sqlx::PgPool;
use uuid::Uuid;

use crate::helpers::{lazy_db_pool, TestApp};

#[sqlx::test]
async fn register_returns_a_200_for_valid_form_data(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    let body = "name=Taro&email=taro%40mounty.jp";

    let response = app.post_register(body.into()).await;
    assert_eq!(200, response.status());

    let saved: (String, String) = sqlx::query_as("SELECT name, email FROM users")
        .fetch_one(&db_pool)
        .await
        .expect("Failed to fetch saved user");
    assert_eq!(saved.0, "Taro");
    assert_eq!(saved.1, "taro@mounty.jp");
}

#[sqlx::test]
async fn register_queues_one_introduction_referencing_the_new_user(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    let body = "name=Taro&email=taro%40mounty.jp";

    app.post_register(body.into())
        .await
        .error_for_status()
        .unwrap();

    let user_id: Uuid = sqlx::query_scalar("SELECT id FROM users")
        .fetch_one(&db_pool)
        .await
        .expect("Failed to fetch saved user");
    let payload: String = sqlx::query_scalar("SELECT payload FROM mail_delivery_queue")
        .fetch_one(&db_pool)
        .await
        .expect("Failed to fetch queued mail");
    let payload: serde_json::Value = serde_json::from_str(&payload).unwrap();

    assert_eq!(payload["mailable"], "new_user_introduction");
    assert_eq!(payload["user_id"], user_id.to_string());
    assert_eq!(app.queued_mail_count().await, 1);
}

#[sqlx::test]
async fn register_fails_without_queueing_if_there_is_a_fatal_database_error(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    let body = "name=Taro&email=taro%40mounty.jp";

    // Sabotage the database
    sqlx::query("ALTER TABLE mail_delivery_queue DROP COLUMN payload;")
        .execute(&db_pool)
        .await
        .unwrap();

    let response = app.post_register(body.into()).await;
    assert_eq!(500, response.status());

    // The user insert is rolled back together with the failed enqueue
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&db_pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[sqlx::test]
async fn registering_an_email_twice_is_a_conflict(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    let body = "name=Taro&email=taro%40mounty.jp";

    app.post_register(body.into())
        .await
        .error_for_status()
        .unwrap();
    let response = app.post_register("name=Hanako&email=taro%40mounty.jp".into()).await;
    assert_eq!(409, response.status());

    // The rejected registration queued nothing
    assert_eq!(app.queued_mail_count().await, 1);
}

#[tokio::test]
async fn register_returns_a_400_when_data_is_missing() {
    let app = TestApp::spawn(&lazy_db_pool()).await;
    let test_cases = vec![
        ("name=Taro", "missing the email"),
        ("email=taro%40mounty.jp", "missing the name"),
        ("", "missing both name and email"),
    ];

    for (body, description) in test_cases {
        let response = app.post_register(body.into()).await;

        assert_eq!(
            400,
            response.status(),
            "The API did not fail with 400 Bad Request when the payload was {description}"
        );
    }
}

#[tokio::test]
async fn register_returns_a_400_when_fields_are_present_but_invalid() {
    let app = TestApp::spawn(&lazy_db_pool()).await;
    let test_cases = vec![
        ("name=&email=taro%40mounty.jp", "empty name"),
        ("name=Taro&email=", "empty email"),
        ("name=Taro&email=definitely-not-an-email", "invalid email"),
        ("name=%3CTaro%3E&email=taro%40mounty.jp", "name with markup"),
    ];

    for (body, description) in test_cases {
        let response = app.post_register(body.into()).await;

        assert_eq!(
            400,
            response.status(),
            "The API did not return a 400 Bad Request when the payload was {description}",
        );
    }
}
