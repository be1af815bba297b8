use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use config::{Config, Environment, File};

use secrecy::Secret;

use serde::Deserialize;
use serde_aux::prelude::*;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use url::Url;

use crate::client::EmailClient;
use crate::templates::{ConfirmationTemplates, SiteMetadata};

/// Runtime environment, either `Dev` for local development, or `Prod` for release
#[derive(Debug)]
pub enum Runtime {
    Dev,
    Prod,
}

impl Runtime {
    pub fn as_str(&self) -> &str {
        match self {
            Runtime::Dev => "dev",
            Runtime::Prod => "prod",
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => anyhow::bail!("{} is not a valid runtime environment", other),
        }
    }
}

/// Application settings wrapper
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub database: DatabaseSettings,
    pub email: EmailSettings,
    #[serde(default)]
    pub subscriptions: SubscriptionSettings,
}

impl Settings {
    /// Load application settings from the settings directory
    pub fn load() -> anyhow::Result<Self> {
        let path = env::current_dir()?.join("settings");
        // Selected by `APP_ENV`, defaults to `Dev`
        let runtime: Runtime = env::var("APP_ENV")
            .unwrap_or_else(|_| "dev".into())
            .try_into()?;

        Self::load_from(runtime, &path)
    }

    /// Load application settings from a specified path and runtime
    pub fn load_from(runtime: Runtime, base_path: &Path) -> anyhow::Result<Self> {
        Config::builder()
            .add_source(File::from(base_path.join("base")).required(true))
            .add_source(File::from(base_path.join(runtime.as_str())).required(true))
            // NOTE: Should be used for any prod secrets. Takes the form `APP_<settings category>__<setting name>`.
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
            .context("Failed to load/deserialize settings")
    }

    /// Subscription handling configuration, resolved once at startup
    pub fn subscription_config(&self) -> anyhow::Result<SubscriptionConfig> {
        let base_url = self.app.base_url()?;
        let site_domain = match (base_url.host_str(), base_url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => anyhow::bail!("Base URL {} has no host", base_url),
        };

        Ok(SubscriptionConfig {
            base_url,
            site: SiteMetadata {
                name: self.app.site_name.clone(),
                domain: site_domain,
            },
            unverified_unsubscribe: self.subscriptions.unverified_unsubscribe,
            templates: self.subscriptions.templates.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
    /// Public URL the application is reachable at, used in emailed links
    base_url: String,
    site_name: String,
    log_filter: String,
}

impl ApplicationSettings {
    /// The application address to bind to
    pub fn addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    pub fn base_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.base_url).context("Failed to parse application base URL")
    }

    /// `tracing_subscriber::EnvFilter` directives
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
    host: String,
    name: String,
    username: String,
    password: Secret<String>,
    #[serde(deserialize_with = "deserialize_bool_from_anything")]
    require_ssl: bool,
}

impl DatabaseSettings {
    /// The database connection options, without specifying the database name
    pub fn without_db(&self) -> PgConnectOptions {
        use secrecy::ExposeSecret;

        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .port(self.port)
            .host(&self.host)
            .ssl_mode(ssl_mode)
            .username(&self.username)
            .password(self.password.expose_secret())
    }

    /// The database connection options, with the database name
    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailSettings {
    api_base_url: String,
    api_auth_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    api_timeout_milliseconds: u64,
}

impl EmailSettings {
    /// Build the email REST API client
    pub fn client(&self) -> anyhow::Result<EmailClient> {
        let api_base_url =
            Url::parse(&self.api_base_url).context("Failed to parse email base URL")?;

        EmailClient::new(
            Duration::from_millis(self.api_timeout_milliseconds),
            api_base_url,
            self.api_auth_token.clone(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionSettings {
    #[serde(default)]
    pub unverified_unsubscribe: UnverifiedUnsubscribe,
    /// Overrides of the built-in confirmation email templates
    #[serde(default)]
    pub templates: ConfirmationTemplates,
}

/// What unsubscribing does to a subscription that was never verified
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnverifiedUnsubscribe {
    /// Fail with `NotVerified`
    #[default]
    Reject,
    /// Succeed without changing anything
    Ignore,
}

/// Configuration handed to the subscription handlers
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub base_url: Url,
    pub site: SiteMetadata,
    pub unverified_unsubscribe: UnverifiedUnsubscribe,
    pub templates: ConfirmationTemplates,
}
