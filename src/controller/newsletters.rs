use actix_web::dev::HttpServiceFactory;
use actix_web::{get, post, web, HttpResponse};

use chrono::Utc;

use serde::Deserialize;

use sqlx::{PgConnection, PgPool};

use url::Url;

use crate::auth::Caller;
use crate::client::EmailClient;
use crate::domain::{EmailAddress, PersonName, VerificationToken};
use crate::error::{Error, Result};
use crate::model::{
    Identity, NewSubscription, Newsletter, NewsletterView, Subscriber, Subscription,
    SubscriptionStatus,
};
use crate::repo::{NewsletterRepo, SubscriptionRepo, UsersRepo};
use crate::settings::{SubscriptionConfig, UnverifiedUnsubscribe};
use crate::templates;

/// Subscribe form, field names of the legacy form are accepted too
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default, alias = "email_field")]
    email: Option<String>,
    #[serde(default, alias = "name_field")]
    name: Option<String>,
}

/// Identifies an anonymous subscription in unsubscribe and status requests
#[derive(Debug, Deserialize)]
pub struct IdentityForm {
    #[serde(default, alias = "email_field")]
    email: Option<String>,
}

/// Public link confirming the subscription holding `token`
pub fn verification_link(base_url: &Url, slug: &str, token: &str) -> Result<Url> {
    let link = format!(
        "{}/newsletters/{}/verify/{}",
        base_url.as_str().trim_end_matches('/'),
        slug,
        token
    );
    Url::parse(&link).map_err(|e| Error::Other(e.into()))
}

/// Blank form fields count as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_email(value: Option<String>) -> Result<Option<EmailAddress>> {
    non_blank(value).map(|email| email.parse()).transpose()
}

async fn fetch_newsletter(pool: &PgPool, slug: &str) -> Result<Newsletter> {
    NewsletterRepo::fetch_by_slug(pool, slug)
        .await?
        .ok_or(Error::NotFound("Newsletter"))
}

/// Resolve the recipient of a stored subscription, loading its user if any
async fn resolve_subscriber(
    conn: &mut PgConnection,
    subscription: &Subscription,
) -> Result<Subscriber> {
    let user = match subscription.user_id {
        Some(user_id) => Some(
            UsersRepo::fetch_by_id(&mut *conn, user_id)
                .await?
                .ok_or(Error::NotFound("User"))?,
        ),
        None => None,
    };
    Subscriber::resolve(subscription, user.as_ref())
}

/// Find the subscription of the caller, or of the given email address
async fn find_subscription(
    conn: &mut PgConnection,
    newsletter: &Newsletter,
    caller: &Caller,
    email: Option<String>,
) -> Result<(Subscription, Subscriber)> {
    let user = caller.user();
    let identity = Identity::from_parts(user.map(|user| user.id), parse_email(email)?)?;

    let subscription = SubscriptionRepo::fetch_by_identity(&mut *conn, newsletter.id, &identity)
        .await?
        .ok_or(Error::NotFound("Subscription"))?;
    let subscriber = Subscriber::resolve(&subscription, user)?;

    Ok((subscription, subscriber))
}

#[tracing::instrument(name = "Retrieve a newsletter", skip(pool))]
#[get("/{slug}")]
async fn retrieve(slug: web::Path<String>, pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let newsletter = fetch_newsletter(&pool, &slug).await?;

    Ok(HttpResponse::Ok().json(NewsletterView::from(&newsletter)))
}

#[tracing::instrument(
    name = "Subscribe to a newsletter",
    skip(form, caller, pool, email_client, config)
)]
#[post("/{slug}/subscribe")]
async fn subscribe(
    slug: web::Path<String>,
    form: web::Form<SubscribeForm>,
    caller: Caller,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    config: web::Data<SubscriptionConfig>,
) -> Result<HttpResponse> {
    let newsletter = fetch_newsletter(&pool, &slug).await?;

    let SubscribeForm { email, name } = form.into_inner();
    let user = caller.user();
    let email = parse_email(email)?;
    // Users are named by their account
    let name: Option<PersonName> = match user {
        Some(_) => None,
        None => non_blank(name).map(|name| name.parse()).transpose()?,
    };

    let new_subscription =
        NewSubscription::new(newsletter.id, user.map(|user| user.id), email, name)?;

    let mut transaction = pool.begin().await?;

    let subscription = SubscriptionRepo::insert(&mut transaction, &new_subscription).await?;
    let subscriber = Subscriber::resolve(&subscription, user)?;

    let link = verification_link(
        &config.base_url,
        &newsletter.slug,
        &subscription.verification_token,
    )?;
    let email = templates::confirmation_email(
        &config.templates,
        &config.site,
        &newsletter,
        &subscription,
        &subscriber,
        &link,
    );
    // Dropping the transaction on failure rolls the subscription back
    email_client
        .send(&email)
        .await
        .map_err(Error::SendEmailError)?;

    transaction.commit().await?;

    tracing::info!("New subscription {}", subscriber.describe(&newsletter));

    Ok(HttpResponse::Ok().json(SubscriptionStatus::new(
        &subscription,
        &subscriber,
        &newsletter,
    )))
}

#[tracing::instrument(name = "Verify a subscription", skip(path, pool))]
#[get("/{slug}/verify/{token}", name = "verify_subscription")]
async fn verify(
    path: web::Path<(String, String)>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse> {
    let (slug, token) = path.into_inner();
    let newsletter = fetch_newsletter(&pool, &slug).await?;
    let token: VerificationToken = token
        .parse()
        .map_err(|_| Error::NotFound("Subscription"))?;

    let mut transaction = pool.begin().await?;

    let mut subscription = SubscriptionRepo::fetch_by_token(&mut *transaction, newsletter.id, &token)
        .await?
        .ok_or(Error::NotFound("Subscription"))?;
    let subscriber = resolve_subscriber(&mut transaction, &subscription).await?;

    if subscription.verify(Utc::now()) {
        SubscriptionRepo::save(&mut *transaction, &subscription).await?;
        tracing::info!("Verified subscription {}", subscriber.describe(&newsletter));
    }

    transaction.commit().await?;

    Ok(HttpResponse::Ok().json(SubscriptionStatus::new(
        &subscription,
        &subscriber,
        &newsletter,
    )))
}

async fn unsubscribe(
    slug: &str,
    email: Option<String>,
    caller: &Caller,
    pool: &PgPool,
    config: &SubscriptionConfig,
) -> Result<HttpResponse> {
    let newsletter = fetch_newsletter(pool, slug).await?;

    let mut transaction = pool.begin().await?;

    let (mut subscription, subscriber) =
        find_subscription(&mut transaction, &newsletter, caller, email).await?;

    if !subscription.is_verified() {
        match config.unverified_unsubscribe {
            UnverifiedUnsubscribe::Reject => return Err(Error::NotVerified),
            UnverifiedUnsubscribe::Ignore => {
                tracing::info!(
                    "Ignoring unsubscribe of unverified subscription {}",
                    subscriber.describe(&newsletter)
                );
            }
        }
    } else if subscription.deactivate() {
        SubscriptionRepo::save(&mut *transaction, &subscription).await?;
        tracing::info!("Unsubscribed {}", subscriber.describe(&newsletter));
    }

    transaction.commit().await?;

    Ok(HttpResponse::Ok().json(SubscriptionStatus::new(
        &subscription,
        &subscriber,
        &newsletter,
    )))
}

#[tracing::instrument(name = "Unsubscribe from a newsletter", skip(query, caller, pool, config))]
#[get("/{slug}/unsubscribe")]
async fn unsubscribe_link(
    slug: web::Path<String>,
    query: web::Query<IdentityForm>,
    caller: Caller,
    pool: web::Data<PgPool>,
    config: web::Data<SubscriptionConfig>,
) -> Result<HttpResponse> {
    unsubscribe(&slug, query.into_inner().email, &caller, &pool, &config).await
}

#[tracing::instrument(name = "Unsubscribe from a newsletter", skip(form, caller, pool, config))]
#[post("/{slug}/unsubscribe")]
async fn unsubscribe_form(
    slug: web::Path<String>,
    form: web::Form<IdentityForm>,
    caller: Caller,
    pool: web::Data<PgPool>,
    config: web::Data<SubscriptionConfig>,
) -> Result<HttpResponse> {
    unsubscribe(&slug, form.into_inner().email, &caller, &pool, &config).await
}

#[tracing::instrument(name = "Fetch subscription status", skip(query, caller, pool))]
#[get("/{slug}/subscription")]
async fn status(
    slug: web::Path<String>,
    query: web::Query<IdentityForm>,
    caller: Caller,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse> {
    let newsletter = fetch_newsletter(&pool, &slug).await?;

    let mut conn = pool.acquire().await?;
    let (subscription, subscriber) =
        find_subscription(&mut conn, &newsletter, &caller, query.into_inner().email).await?;

    Ok(HttpResponse::Ok().json(SubscriptionStatus::new(
        &subscription,
        &subscriber,
        &newsletter,
    )))
}

/// Newsletter and subscription endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/newsletters")
        .service(retrieve)
        .service(subscribe)
        .service(verify)
        .service(unsubscribe_link)
        .service(unsubscribe_form)
        .service(status)
}
