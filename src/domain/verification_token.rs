use std::fmt;
use std::str::FromStr;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::{Error, Result};

pub const TOKEN_LEN: usize = 40;

/// Random opaque token proving receipt of a confirmation email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Generate a fresh alphanumeric token
    pub fn generate() -> Self {
        let token = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        Self(token)
    }
}

impl FromStr for VerificationToken {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        if value.len() != TOKEN_LEN || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::ParsingError("Malformed verification token".into()));
        }
        Ok(Self(value.to_string()))
    }
}

impl AsRef<str> for VerificationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
