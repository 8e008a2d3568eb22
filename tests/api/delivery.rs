use sqlx::PgPool;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use claim::assert_err;
use mounty::delivery_worker::try_execute_task;
use mounty::mail::NEW_USER_INTRODUCTION_SUBJECT;

use crate::helpers::{only_link, TestApp};

#[sqlx::test]
async fn registered_users_receive_an_introduction_mail(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    app.post_register("name=Taro&email=taro%40mounty.jp".into())
        .await
        .error_for_status()
        .unwrap();

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    app.dispatch_all_pending_mail().await;

    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&email_request.body).unwrap();
    assert_eq!(body["To"], "taro@mounty.jp");
    assert_eq!(body["Subject"], NEW_USER_INTRODUCTION_SUBJECT);

    let html = body["HtmlBody"].as_str().unwrap();
    let text = body["TextBody"].as_str().unwrap();
    assert!(html.contains("Taroさんこんにちは！"));
    assert!(text.contains("Taroさんこんにちは！"));

    // Both bodies point at the posts listing
    let html_link = only_link(html);
    let text_link = only_link(text);
    assert_eq!(html_link, text_link);
    assert_eq!(html_link.path(), "/tweets");

    assert_eq!(app.queued_mail_count().await, 0);
}

#[sqlx::test]
async fn no_mail_is_sent_to_a_user_deleted_before_delivery(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    app.post_register("name=Taro&email=taro%40mounty.jp".into())
        .await
        .error_for_status()
        .unwrap();

    sqlx::query("DELETE FROM users")
        .execute(&db_pool)
        .await
        .unwrap();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    app.dispatch_all_pending_mail().await;

    assert_eq!(app.queued_mail_count().await, 0);
}

#[sqlx::test]
async fn a_failed_delivery_is_dropped_and_not_retried(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    app.post_register("name=Taro&email=taro%40mounty.jp".into())
        .await
        .error_for_status()
        .unwrap();

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    app.dispatch_all_pending_mail().await;

    assert_eq!(app.queued_mail_count().await, 0);
}

#[sqlx::test]
async fn every_registration_gets_its_own_mail(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    for body in [
        "name=Taro&email=taro%40mounty.jp",
        "name=Hanako&email=hanako%40mounty.jp",
    ] {
        app.post_register(body.into())
            .await
            .error_for_status()
            .unwrap();
    }

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    app.dispatch_all_pending_mail().await;

    let recipients: Vec<String> = app
        .email_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["To"].as_str().unwrap().to_owned()
        })
        .collect();
    assert_eq!(recipients, vec!["taro@mounty.jp", "hanako@mounty.jp"]);
}

#[sqlx::test]
async fn a_mail_stays_queued_when_the_user_lookup_fails(db_pool: PgPool) {
    let app = TestApp::spawn(&db_pool).await;
    app.post_register("name=Taro&email=taro%40mounty.jp".into())
        .await
        .error_for_status()
        .unwrap();

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // Break the lookup, the way a lost connection would
    sqlx::query("ALTER TABLE users RENAME TO users_unavailable")
        .execute(&db_pool)
        .await
        .unwrap();

    assert_err!(try_execute_task(&app.db_pool, &app.email_client, &app.renderer).await);
    assert_eq!(app.queued_mail_count().await, 1);

    // Once the database recovers the mail goes out
    sqlx::query("ALTER TABLE users_unavailable RENAME TO users")
        .execute(&db_pool)
        .await
        .unwrap();

    app.dispatch_all_pending_mail().await;
    assert_eq!(app.queued_mail_count().await, 0);
}
