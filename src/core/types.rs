/*!
 * Core Types
 * Common types used across the proxy subsystem
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Size in bytes of a source; `None` when unknown
pub type Size = u64;

/// Opaque token keying one cache record
///
/// 128 bits of randomness rendered as 32 lowercase hex characters, no separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Mint a fresh, statistically unique token
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing token string (as parsed from a reference path)
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
