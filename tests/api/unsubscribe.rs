use fake::faker::internet::en::SafeEmail;
use fake::Fake;

use reqwest::StatusCode;

use sqlx::PgPool;

use newsletter::settings::UnverifiedUnsubscribe;

use crate::helpers::{create_newsletter, TestApp, TestUser};

async fn status_body(app: &TestApp, email: &str) -> serde_json::Value {
    let res = app
        .status("newsletter-001", Some(email), None)
        .await
        .expect("Failed to execute request");
    assert_eq!(StatusCode::OK, res.status());

    res.json().await.expect("Failed to parse body")
}

#[sqlx::test]
async fn unsubscribe_link_deactivates_verified_subscription(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    create_newsletter(&pool, "newsletter-001").await;
    app.mock_email_api(200, 1).await;
    app.verified_subscription("newsletter-001", "dummy@example.com")
        .await;

    let res = app
        .unsubscribe_link("newsletter-001", Some("dummy@example.com"), None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let status = status_body(&app, "dummy@example.com").await;
    assert_eq!(false, status["active"]);
    // Unsubscribing keeps the verification
    assert!(!status["verified_at"].is_null());

    Ok(())
}

#[sqlx::test]
async fn unsubscribe_form_deactivates_verified_subscription(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    create_newsletter(&pool, "newsletter-001").await;
    app.mock_email_api(200, 1).await;
    let email: String = SafeEmail().fake();
    app.verified_subscription("newsletter-001", &email).await;

    assert_eq!(true, status_body(&app, &email).await["active"]);

    let res = app
        .unsubscribe_form("newsletter-001", &[("email", email.as_str())], None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());
    assert_eq!(false, status_body(&app, &email).await["active"]);

    // Unsubscribing again is harmless
    let res = app
        .unsubscribe_form("newsletter-001", &[("email_field", email.as_str())], None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    Ok(())
}

#[sqlx::test]
async fn following_the_link_after_unsubscribing_changes_nothing(
    pool: PgPool,
) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    create_newsletter(&pool, "newsletter-001").await;
    app.mock_email_api(200, 1).await;
    app.verified_subscription("newsletter-001", "dummy@example.com")
        .await;

    app.unsubscribe_link("newsletter-001", Some("dummy@example.com"), None)
        .await
        .expect("Failed to execute request");
    let unsubscribed = status_body(&app, "dummy@example.com").await;

    let link = app.verification_link(0).await;
    let res = app.follow(&link).await.expect("Failed to follow link");

    assert_eq!(StatusCode::OK, res.status());
    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!(false, body["active"]);

    let status = status_body(&app, "dummy@example.com").await;
    assert_eq!(false, status["active"]);
    assert_eq!(unsubscribed["verified_at"], status["verified_at"]);

    Ok(())
}

#[sqlx::test]
async fn unverified_unsubscribe_is_rejected_by_default(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    create_newsletter(&pool, "newsletter-001").await;
    app.mock_email_api(200, 1).await;

    app.subscribe("newsletter-001", &[("email", "dummy@example.com")], None)
        .await
        .expect("Failed to execute request");

    let res = app
        .unsubscribe_link("newsletter-001", Some("dummy@example.com"), None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::CONFLICT, res.status());

    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("not_verified", body["error"]);

    Ok(())
}

#[sqlx::test]
async fn unverified_unsubscribe_can_be_ignored(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn_with(&pool, UnverifiedUnsubscribe::Ignore).await;
    create_newsletter(&pool, "newsletter-001").await;
    app.mock_email_api(200, 1).await;

    app.subscribe("newsletter-001", &[("email", "dummy@example.com")], None)
        .await
        .expect("Failed to execute request");

    let res = app
        .unsubscribe_link("newsletter-001", Some("dummy@example.com"), None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let status = status_body(&app, "dummy@example.com").await;
    assert_eq!(false, status["active"]);
    assert!(status["verified_at"].is_null());

    Ok(())
}

#[sqlx::test]
async fn unsubscribing_unknown_identity_is_not_found(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    create_newsletter(&pool, "newsletter-001").await;

    let res = app
        .unsubscribe_link("newsletter-001", Some("nobody@example.com"), None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    let res = app
        .unsubscribe_link("missing", Some("nobody@example.com"), None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::NOT_FOUND, res.status());

    Ok(())
}

#[sqlx::test]
async fn user_unsubscribes_with_credentials(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    create_newsletter(&pool, "newsletter-001").await;
    let user = TestUser::register(&pool, "user1@example.com", "User One", "password").await;
    app.mock_email_api(200, 1).await;

    app.subscribe("newsletter-001", &[], Some(&user))
        .await
        .expect("Failed to execute request");
    let link = app.verification_link(0).await;
    app.follow(&link).await.expect("Failed to follow link");

    let res = app
        .unsubscribe_form("newsletter-001", &[], Some(&user))
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let res = app
        .status("newsletter-001", None, Some(&user))
        .await
        .expect("Failed to execute request");
    let status: serde_json::Value = res.json().await.expect("Failed to parse body");

    assert_eq!("user1@example.com", status["email"]);
    assert_eq!("User One", status["name"]);
    assert_eq!(false, status["active"]);

    Ok(())
}

#[sqlx::test]
async fn status_requires_an_identity(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    create_newsletter(&pool, "newsletter-001").await;

    let res = app
        .status("newsletter-001", None, None)
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::BAD_REQUEST, res.status());

    let body: serde_json::Value = res.json().await.expect("Failed to parse body");
    assert_eq!("identity_missing", body["reason"]);

    Ok(())
}
