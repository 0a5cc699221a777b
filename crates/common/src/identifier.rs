use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Filesystem-safe token derived from a user's free-text name.
///
/// Every character outside `[A-Za-z0-9]` is replaced by `_` and the result is
/// lower-cased. Replacement is per UTF-16 code unit, so a character outside the
/// Basic Multilingual Plane becomes `__`. Distinct names can collapse onto the
/// same identifier (`"Jane Doe"` and `"jane-doe"`), in which case they share a
/// record file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Derive the identifier for a registration name
    pub fn derive(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::Validation("name must not be empty".to_string()));
        }

        let mut id = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                id.push(c.to_ascii_lowercase());
            } else {
                id.extend(std::iter::repeat('_').take(c.len_utf16()));
            }
        }

        Ok(Self(id))
    }

    /// Parse an identifier that is already in derived form, e.g. from a URL path
    pub fn parse(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && s.chars()
                .all(|c| c == '_' || c.is_ascii_digit() || c.is_ascii_lowercase());
        if !valid {
            return Err(Error::Validation(format!("invalid identifier: {}", s)));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the record file for this identifier
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
