//! Rendering of the subscription confirmation email.
//!
//! Templates are plain strings with `{{ key }}` placeholders. A newsletter may
//! override any of its templates, the rest fall back to the global defaults.

use std::collections::HashMap;

use regex::{Captures, Regex};

use serde::Deserialize;

use url::Url;

use crate::client::Email;
use crate::model::{Newsletter, Subscriber, Subscription};

const DEFAULT_SUBJECT: &str = "{{ newsletter }} - Confirm subscription";

const DEFAULT_TEXT: &str = "Hello {{ name }},

Somebody, hopefully you, subscribed {{ email }} to {{ newsletter }} on {{ created }}.
To confirm your subscription, visit this web page: {{ link }}

If you did not ask for this, simply ignore this message.

{{ sender }}
{{ site_name }} ({{ site_domain }})
";

const DEFAULT_HTML: &str = "<p>Hello {{ name }},</p>
<p>Somebody, hopefully you, subscribed {{ email }} to <strong>{{ newsletter }}</strong> on {{ created }}.</p>
<p>Click <a href=\"{{ link }}\">here</a> to confirm your subscription.</p>
<p>If you did not ask for this, simply ignore this message.</p>
<p>{{ sender }}<br />{{ site_name }} ({{ site_domain }})</p>
";

/// Global default templates of the confirmation email
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConfirmationTemplates {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl Default for ConfirmationTemplates {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.into(),
            text: DEFAULT_TEXT.into(),
            html: DEFAULT_HTML.into(),
        }
    }
}

/// Site-wide values available to every template
#[derive(Debug, Clone)]
pub struct SiteMetadata {
    pub name: String,
    pub domain: String,
}

/// Values substituted into a template
#[derive(Debug, Default)]
pub struct Context(HashMap<&'static str, String>);

impl Context {
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// Substitute every `{{ key }}` placeholder, unknown keys render empty
pub fn render(template: &str, context: &Context, escape_html: bool) -> String {
    lazy_static::lazy_static! {
        static ref PLACEHOLDER: Regex = Regex::new(r"\{\{\s*(\w+)\s*\}\}").unwrap();
    }

    PLACEHOLDER
        .replace_all(template, |captures: &Captures| {
            let key = &captures[1];
            match context.get(key) {
                Some(value) if escape_html => htmlescape::encode_minimal(value),
                Some(value) => value.to_string(),
                None => {
                    tracing::warn!("Unknown template placeholder \"{}\"", key);
                    String::new()
                }
            }
        })
        .into_owned()
}

/// Build the email asking a new subscriber to follow `link`
pub fn confirmation_email(
    defaults: &ConfirmationTemplates,
    site: &SiteMetadata,
    newsletter: &Newsletter,
    subscription: &Subscription,
    subscriber: &Subscriber,
    link: &Url,
) -> Email {
    let context = Context::default()
        .with("name", subscriber.name.as_deref().unwrap_or("subscriber"))
        .with("email", subscriber.email.as_ref())
        .with("newsletter", newsletter.title.as_str())
        .with("newsletter_slug", newsletter.slug.as_str())
        .with("sender", newsletter.sender.as_str())
        .with(
            "created",
            subscription.created_at.format("%B %-d, %Y").to_string(),
        )
        .with("link", link.as_str())
        .with("site_name", site.name.as_str())
        .with("site_domain", site.domain.as_str());

    let subject = newsletter
        .subject_template
        .as_deref()
        .unwrap_or(&defaults.subject);
    let text = newsletter.text_template.as_deref().unwrap_or(&defaults.text);
    let html = newsletter.html_template.as_deref().unwrap_or(&defaults.html);

    Email {
        sender: newsletter.from_mailbox(),
        recipient: subscriber.email.clone(),
        // Subjects are a single line
        subject: render(subject, &context, false).replace(['\r', '\n'], " "),
        text_body: render(text, &context, false),
        html_body: render(html, &context, true),
    }
}
