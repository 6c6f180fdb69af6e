//! User identity primitives: stable user ids and normalized emails.
//!
//! # Invariants
//! - A `NormalizedEmail` is trimmed, lowercased and never empty.
//! - Every membership and ownership comparison goes through this type.

use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static EMAIL_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email shape regex"));

/// Stable user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Email in canonical form: trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedEmail(String);

impl NormalizedEmail {
    /// Normalizes any non-blank input.
    ///
    /// Used for identities that were already verified upstream (session
    /// users, persisted members).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = normalize_email(raw);
        if normalized.is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        Ok(Self(normalized))
    }

    /// Normalizes user-typed input and additionally requires a
    /// `local@domain` shape.
    pub fn parse_address(raw: &str) -> Result<Self, ValidationError> {
        let email = Self::parse(raw)?;
        if !EMAIL_SHAPE_RE.is_match(email.as_str()) {
            return Err(ValidationError::MalformedEmail(email.0));
        }
        Ok(email)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NormalizedEmail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NormalizedEmail {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NormalizedEmail> for String {
    fn from(value: NormalizedEmail) -> Self {
        value.0
    }
}

/// Canonical email form: surrounding whitespace removed, lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
