use actix_web::http::header::{self, HeaderMap};

use anyhow::Context;

use secrecy::Secret;

const BASIC_AUTH_PREFIX: &str = "Basic ";

/// Username (the account email) and password sent with a request
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

impl Credentials {
    /// Extract Basic credentials from request headers.
    /// `Ok(None)` if the request carries no `Authorization` header at all.
    pub fn from_headers(headers: &HeaderMap) -> anyhow::Result<Option<Self>> {
        let header_value = match headers.get(header::AUTHORIZATION) {
            Some(value) => value
                .to_str()
                .context("Authorization header is not valid UTF-8")?,
            None => return Ok(None),
        };

        Self::from_basic(header_value).map(Some)
    }

    /// Extract credentials from a string formatted as `Basic <base64 credentials>`
    pub fn from_basic(header_value: &str) -> anyhow::Result<Self> {
        use base64::Engine;

        let encoded = header_value
            .strip_prefix(BASIC_AUTH_PREFIX)
            .context("Authorization scheme not basic")?;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .context("Failed to decode authorization header")?;
        let decoded = String::from_utf8(decoded).context("Failed to decode authorization header")?;

        let (username, password) = decoded
            .split_once(':')
            .context("Missing password in authorization")?;
        if username.is_empty() {
            anyhow::bail!("Missing username in authorization");
        }

        Ok(Self {
            username: username.into(),
            password: Secret::new(password.into()),
        })
    }
}
