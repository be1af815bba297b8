use reqwest::StatusCode;

use sqlx::PgPool;

use crate::helpers::{create_newsletter, TestApp};

#[sqlx::test]
async fn newsletter_can_be_retrieved_by_slug(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    create_newsletter(&pool, "newsletter-001").await;

    let res = app
        .newsletter("newsletter-001")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("NewsLetter 001", body["title"]);
    assert_eq!("newsletter-001", body["slug"]);
    assert_eq!("sender-001@example.com", body["email"]);
    assert_eq!("Sender 001", body["sender"]);
    // Templates are internal
    assert!(body.get("subject_template").is_none());

    Ok(())
}

#[sqlx::test]
async fn unknown_newsletter_is_not_found(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    let res = app
        .newsletter("missing")
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("not_found", body["error"]);

    Ok(())
}

#[sqlx::test]
async fn subscribing_to_unknown_newsletter_is_not_found(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    app.mock_email_api(200, 0).await;

    let res = app
        .subscribe("missing", &[("email", "dummy@example.com")], None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    Ok(())
}
