//! Resolution of the effective email and name of a subscription.
//!
//! A subscription either references a registered user, whose account is the
//! source of truth, or stores the email and name it was created with.

use std::fmt;

use anyhow::Context;

use crate::domain::EmailAddress;
use crate::error::Result;

use super::{Newsletter, Subscription, User};

/// Keep only the user the subscription actually references
fn referenced<'a>(subscription: &Subscription, user: Option<&'a User>) -> Option<&'a User> {
    user.filter(|user| subscription.user_id == Some(user.id))
}

/// Effective email of a subscription.
/// `None` if the subscription references a user that was not resolved.
pub fn email<'a>(subscription: &'a Subscription, user: Option<&'a User>) -> Option<&'a str> {
    match subscription.user_id {
        Some(_) => referenced(subscription, user).map(|user| user.email.as_str()),
        None => subscription.email.as_deref(),
    }
}

/// Effective display name of a subscription, if any
pub fn name<'a>(subscription: &'a Subscription, user: Option<&'a User>) -> Option<&'a str> {
    let name = match subscription.user_id {
        Some(_) => referenced(subscription, user).map(|user| user.full_name.as_str()),
        None => subscription.name.as_deref(),
    };
    name.map(str::trim).filter(|name| !name.is_empty())
}

/// Resolved recipient of a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub email: EmailAddress,
    pub name: Option<String>,
}

impl Subscriber {
    pub fn resolve(subscription: &Subscription, user: Option<&User>) -> Result<Self> {
        let email = email(subscription, user)
            .with_context(|| format!("Unresolved user for subscription {}", subscription.id))?
            .parse()?;
        let name = name(subscription, user).map(str::to_string);

        Ok(Self { email, name })
    }

    /// Human readable description of this subscriber's subscription
    pub fn describe<'a>(&'a self, newsletter: &'a Newsletter) -> impl fmt::Display + 'a {
        Description {
            subscriber: self,
            newsletter,
        }
    }
}

struct Description<'a> {
    subscriber: &'a Subscriber,
    newsletter: &'a Newsletter,
}

impl fmt::Display for Description<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subscriber.name {
            Some(name) => write!(
                f,
                "{} <{}> to {}",
                name, self.subscriber.email, self.newsletter
            ),
            None => write!(f, "{} to {}", self.subscriber.email, self.newsletter),
        }
    }
}
