use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors from constructing a [`DefinitionKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The input was empty or contained only whitespace.
    #[error("definition key cannot be empty or whitespace")]
    Empty,
}

/// The family name shared by every deployed version of one workflow.
///
/// Keys are case-sensitive. Leading and trailing whitespace is trimmed and
/// the remainder must be non-empty.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DefinitionKey(String);

impl DefinitionKey {
    /// Create a new `DefinitionKey`, trimming and validating the input.
    pub fn new(raw: &str) -> Result<Self, KeyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Return the inner string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DefinitionKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for DefinitionKey {
    type Error = KeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for DefinitionKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<DefinitionKey> for String {
    fn from(key: DefinitionKey) -> Self {
        key.0
    }
}

impl AsRef<str> for DefinitionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DefinitionKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DefinitionKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
