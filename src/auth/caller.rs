use std::future::Future;
use std::pin::Pin;

use actix_web::{dev, web, FromRequest, HttpRequest};

use anyhow::Context;

use argon2::{Argon2, PasswordHash, PasswordVerifier};

use secrecy::Secret;

use sqlx::PgPool;

use crate::auth::Credentials;
use crate::domain::EmailAddress;
use crate::error::{Error, Result};
use crate::model::User;
use crate::repo::UsersRepo;
use crate::telemetry::spawn_blocking_with_tracing;

/// Who is making a request: a registered user proven by Basic credentials, or anyone
#[derive(Debug)]
pub enum Caller {
    Anonymous,
    User(User),
}

impl Caller {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self>>>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let credentials =
                match Credentials::from_headers(req.headers()).map_err(Error::Unauthorized)? {
                    Some(credentials) => credentials,
                    None => return Ok(Self::Anonymous),
                };

            // NOTE: Must be registered with the application at startup
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .context("PgPool not registered for application")?;

            let user = authenticate(pool, credentials).await?;
            Ok(Self::User(user))
        })
    }
}

#[tracing::instrument("Authenticate caller", skip(pool, credentials), fields(username = %credentials.username))]
async fn authenticate(pool: &PgPool, credentials: Credentials) -> Result<User> {
    let email: EmailAddress = credentials
        .username
        .parse()
        .map_err(|e: Error| Error::Unauthorized(anyhow::anyhow!(e)))?;

    let stored = UsersRepo::fetch_credentials_by_email(pool, &email)
        .await?
        .context("No user stored for email")
        .map_err(Error::Unauthorized)?;

    let password = credentials.password;
    spawn_blocking_with_tracing(move || verify_password_hash(password, stored.password_hash))
        .await
        .context("Failed to spawn blocking task")??;

    UsersRepo::fetch_by_id(pool, stored.id)
        .await?
        .ok_or(Error::NotFound("User"))
}

#[tracing::instrument("Verify password hash", skip(password, password_hash))]
fn verify_password_hash(password: Secret<String>, password_hash: Secret<String>) -> Result<()> {
    use secrecy::ExposeSecret;

    let password_hash = PasswordHash::new(password_hash.expose_secret())
        .context("Failed to parse stored password hash")?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &password_hash)
        .context("Failed to verify password hash")
        .map_err(Error::Unauthorized)
}
