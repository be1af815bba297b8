use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::{Error, Result};

const MAX_LEN: usize = 50;

/// URL-safe newsletter identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug(String);

impl FromStr for Slug {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        lazy_static::lazy_static! {
            static ref SLUG_REGEX: Regex = Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap();
        }

        if value.is_empty() || value.len() > MAX_LEN || !SLUG_REGEX.is_match(value) {
            return Err(Error::ParsingError(format!("Invalid slug: {:?}", value)));
        }
        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
