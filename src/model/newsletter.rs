use std::fmt;

use serde::Serialize;

use uuid::Uuid;

use crate::domain::{EmailAddress, Slug};
use crate::error::{Error, Result};

const MAX_TITLE_LEN: usize = 200;
const MAX_SENDER_LEN: usize = 200;

/// Stored newsletter record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Newsletter {
    pub id: Uuid,
    pub title: String,
    /// Unique URL-safe identifier used in every subscription URL
    pub slug: String,
    /// Sender email, used for the `From` header
    pub email: String,
    /// Sender name, used for the `From` header
    pub sender: String,
    /// Overrides of the default confirmation email templates
    pub subject_template: Option<String>,
    pub text_template: Option<String>,
    pub html_template: Option<String>,
}

impl Newsletter {
    /// `From` mailbox for emails sent on behalf of this newsletter
    pub fn from_mailbox(&self) -> String {
        format!("{} <{}>", self.sender, self.email)
    }
}

impl fmt::Display for Newsletter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.title.fmt(f)
    }
}

/// New newsletter request
#[derive(Debug, Clone)]
pub struct NewNewsletter {
    pub title: String,
    pub slug: Slug,
    pub email: EmailAddress,
    pub sender: String,
}

impl NewNewsletter {
    pub fn new(title: &str, slug: &str, email: &str, sender: &str) -> Result<Self> {
        let title = bounded("Title", title, MAX_TITLE_LEN)?;
        let sender = bounded("Sender", sender, MAX_SENDER_LEN)?;

        Ok(Self {
            title,
            slug: slug.parse()?,
            email: email.parse()?,
            sender,
        })
    }
}

fn bounded(field: &str, value: &str, max_len: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::ParsingError(format!("{} cannot be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(Error::ParsingError(format!("{} too long", field)));
    }
    Ok(value.to_string())
}

/// Public representation of a newsletter
#[derive(Debug, Serialize)]
pub struct NewsletterView {
    pub title: String,
    pub slug: String,
    pub email: String,
    pub sender: String,
}

impl From<&Newsletter> for NewsletterView {
    fn from(newsletter: &Newsletter) -> Self {
        Self {
            title: newsletter.title.clone(),
            slug: newsletter.slug.clone(),
            email: newsletter.email.clone(),
            sender: newsletter.sender.clone(),
        }
    }
}
