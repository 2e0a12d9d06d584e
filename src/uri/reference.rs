/*!
 * Resource References
 * Parsed `scheme://authority/path` and `scheme:opaque` locators
 */

use crate::core::errors::{ProxyError, Result};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Opaque locator of a resource
///
/// Equality and hashing use the serialized form, so two references are the
/// same exactly when they print the same. Path segments are percent-encoded
/// on the way in and decoded by [`ResourceRef::path_segments`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceRef {
    url: Url,
}

impl ResourceRef {
    /// Parse a reference string
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)
            .map_err(|e| ProxyError::InvalidReference(format!("{input}: {e}")))?;

        if url.cannot_be_a_base() && url.path().is_empty() {
            return Err(ProxyError::InvalidReference(format!(
                "empty scheme-specific part: {input}"
            )));
        }
        Ok(Self { url })
    }

    /// Build a hierarchical reference from its parts
    ///
    /// Each segment is taken literally: `/`, `?`, `#` and `%` inside a
    /// segment are encoded rather than interpreted.
    pub fn hierarchical<I, S>(scheme: &str, authority: &str, segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = Url::parse(&format!("{scheme}://{authority}")).map_err(|e| {
            ProxyError::InvalidReference(format!("{scheme}://{authority}: {e}"))
        })?;
        if url.authority() != authority {
            return Err(ProxyError::InvalidReference(format!(
                "authority {authority:?} does not survive parsing"
            )));
        }

        url.path_segments_mut()
            .map_err(|()| {
                ProxyError::InvalidReference(format!("{scheme}://{authority} cannot hold a path"))
            })?
            .extend(segments);
        Ok(Self { url })
    }

    #[inline]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    #[inline]
    pub fn authority(&self) -> Option<&str> {
        Some(self.url.authority()).filter(|a| !a.is_empty())
    }

    /// Encoded path of a hierarchical reference, or the opaque part otherwise
    #[inline]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.url.cannot_be_a_base()
    }

    /// Non-empty path segments, percent-decoded, in order
    pub fn path_segments(&self) -> Vec<String> {
        self.url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn last_path_segment(&self) -> Option<String> {
        self.path_segments().pop()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceRef").field(&self.url.as_str()).finish()
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl FromStr for ResourceRef {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceRef {
    type Error = ProxyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ResourceRef> for String {
    fn from(value: ResourceRef) -> Self {
        value.url.into()
    }
}
