use chrono::{DateTime, Utc};

use serde::Serialize;

use uuid::Uuid;

use crate::domain::{EmailAddress, PersonName};
use crate::error::{InvalidReason, Result};

use super::{Newsletter, Subscriber};

/// Who a subscription belongs to, either a registered user or a bare email address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(Uuid),
    Email(EmailAddress),
}

impl Identity {
    /// Collapse the two optional identity sources into exactly one
    pub fn from_parts(
        user_id: Option<Uuid>,
        email: Option<EmailAddress>,
    ) -> std::result::Result<Self, InvalidReason> {
        match (user_id, email) {
            (None, None) => Err(InvalidReason::IdentityMissing),
            (Some(_), Some(_)) => Err(InvalidReason::IdentityConflict),
            (Some(user_id), None) => Ok(Self::User(user_id)),
            (None, Some(email)) => Ok(Self::Email(email)),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(*id),
            Self::Email(_) => None,
        }
    }

    pub fn email(&self) -> Option<&EmailAddress> {
        match self {
            Self::User(_) => None,
            Self::Email(email) => Some(email),
        }
    }
}

/// New Subscription request
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub newsletter_id: Uuid,
    pub identity: Identity,
    /// Only kept for anonymous subscribers, users are named by their account
    pub name: Option<PersonName>,
}

impl NewSubscription {
    pub fn new(
        newsletter_id: Uuid,
        user_id: Option<Uuid>,
        email: Option<EmailAddress>,
        name: Option<PersonName>,
    ) -> Result<Self> {
        let identity = Identity::from_parts(user_id, email)?;
        let name = match identity {
            Identity::User(_) => None,
            Identity::Email(_) => name,
        };

        Ok(Self {
            newsletter_id,
            identity,
            name,
        })
    }
}

/// Stored Subscription record
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub newsletter_id: Uuid,
    /// Exactly one of `user_id` and `email` is set
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub verification_token: String,
    /// `None` until the emailed verification link is followed
    pub verified_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl Subscription {
    /// Check the record invariants before it is written back
    pub fn validate(&self) -> std::result::Result<(), InvalidReason> {
        match (&self.user_id, &self.email) {
            (None, None) => return Err(InvalidReason::IdentityMissing),
            (Some(_), Some(_)) => return Err(InvalidReason::IdentityConflict),
            _ => {}
        }
        if self.active && self.verified_at.is_none() {
            return Err(InvalidReason::ActiveWithoutVerification);
        }
        Ok(())
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    /// Mark the subscription as verified and active.
    /// The token is spent once verified: returns `false` without touching
    /// anything if the subscription is active or was ever verified.
    pub fn verify(&mut self, now: DateTime<Utc>) -> bool {
        if self.active || self.verified_at.is_some() {
            return false;
        }
        self.verified_at = Some(now);
        self.active = true;
        true
    }

    /// Returns `false` if the subscription was already inactive
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}

/// Public view of a stored subscription, never includes the verification token
#[derive(Debug, Serialize)]
pub struct SubscriptionStatus {
    pub newsletter: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl SubscriptionStatus {
    pub fn new(
        subscription: &Subscription,
        subscriber: &Subscriber,
        newsletter: &Newsletter,
    ) -> Self {
        Self {
            newsletter: newsletter.slug.clone(),
            email: subscriber.email.to_string(),
            name: subscriber.name.clone(),
            created_at: subscription.created_at,
            verified_at: subscription.verified_at,
            active: subscription.active,
        }
    }
}
