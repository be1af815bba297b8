use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

/// Reason a subscription failed validation before being persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Neither a user nor an email address was given
    IdentityMissing,
    /// Both a user and an email address were given
    IdentityConflict,
    /// The identity is already subscribed to the newsletter
    DuplicateSubscription,
    /// An active subscription without a verification timestamp
    ActiveWithoutVerification,
}

impl InvalidReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::IdentityMissing => "identity_missing",
            Self::IdentityConflict => "identity_conflict",
            Self::DuplicateSubscription => "duplicate_subscription",
            Self::ActiveWithoutVerification => "active_without_verification",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::IdentityMissing => "Neither an email nor a user is set",
            Self::IdentityConflict => "If a user is set, email must be empty and vice versa",
            Self::DuplicateSubscription => "Already subscribed to this newsletter",
            Self::ActiveWithoutVerification => "An active subscription must be verified",
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Validation errors
    #[error("{0}")]
    SubscriptionInvalid(InvalidReason),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Subscription has not been verified")]
    NotVerified,
    // Parsing errors
    #[error("{0}")]
    ParsingError(String),
    // Authentication errors
    #[error("Failed to authenticate")]
    Unauthorized(#[source] anyhow::Error),
    // Email client errors
    #[error("Failed to send email")]
    SendEmailError(#[source] reqwest::Error),
    // Database errors
    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<InvalidReason> for Error {
    fn from(reason: InvalidReason) -> Self {
        Self::SubscriptionInvalid(reason)
    }
}

impl Error {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubscriptionInvalid(_) => "subscription_invalid",
            Self::NotFound(_) => "not_found",
            Self::NotVerified => "not_verified",
            Self::ParsingError(_) => "invalid_input",
            Self::Unauthorized(_) => "unauthorized",
            Self::SendEmailError(_) | Self::DatabaseError(_) | Self::Other(_) => "internal",
        }
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::SubscriptionInvalid(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    reason: Option<&'a str>,
    message: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::SubscriptionInvalid(InvalidReason::DuplicateSubscription) => StatusCode::CONFLICT,
            Self::SubscriptionInvalid(_) | Self::ParsingError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotVerified => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::SendEmailError(_) | Self::DatabaseError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Keep internal details in the logs only
        let message = if status.is_server_error() {
            tracing::error!(error.cause_chain = ?self, "{}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorBody {
            error: self.kind(),
            reason: self.reason().map(|reason| reason.code()),
            message,
        })
    }
}
