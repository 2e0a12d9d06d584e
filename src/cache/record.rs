/*!
 * Cache Record
 * Immutable source binding and metadata for one token
 */

use crate::core::types::Size;
use crate::uri::ResourceRef;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One registered source
///
/// Never mutated after creation; `expires_at` is fixed at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub source: ResourceRef,
    /// Resolved mime type, `None` when nothing could be inferred
    pub mime: Option<String>,
    pub display_name: String,
    /// Size in bytes, `None` when unknown
    pub size: Option<Size>,
    pub expires_at: SystemTime,
}

impl Record {
    pub fn new(
        source: ResourceRef,
        mime: Option<String>,
        display_name: impl Into<String>,
        size: Option<Size>,
        expires_at: SystemTime,
    ) -> Self {
        Self {
            source,
            mime,
            display_name: display_name.into(),
            size,
            expires_at,
        }
    }

    /// A record is live up to and including its expiry instant
    #[inline]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now > self.expires_at
    }
}
