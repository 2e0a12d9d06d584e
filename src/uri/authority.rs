/*!
 * Host Authorities
 * Process-constant authorities that mark a reference as host-owned
 */

use super::reference::ResourceRef;
use crate::core::errors::Result;
use crate::core::limits::{
    CONTENT_SCHEME, FILE_PROVIDER_AUTHORITY_SUFFIX, PROXY_AUTHORITY_SUFFIX, TOKEN_PATH_SEGMENT,
};
use crate::core::types::Token;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authority of the streaming proxy (`<host>.blackbox.FileProxy`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyAuthority(String);

impl ProxyAuthority {
    pub fn for_host(host_identity: &str) -> Self {
        Self(format!("{host_identity}{PROXY_AUTHORITY_SUFFIX}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build `content://<authority>/t/<token>`
    pub fn proxy_ref(&self, token: &Token) -> Result<ResourceRef> {
        ResourceRef::hierarchical(
            CONTENT_SCHEME,
            &self.0,
            [TOKEN_PATH_SEGMENT, token.as_str()],
        )
    }

    /// Whether `reference` is addressed to this proxy
    pub fn matches(&self, reference: &ResourceRef) -> bool {
        reference.scheme() == CONTENT_SCHEME && reference.authority() == Some(self.0.as_str())
    }

    /// Extract the token of a proxy reference
    ///
    /// Only the exact two-segment shape `["t", token]` is accepted.
    pub fn token_of(&self, reference: &ResourceRef) -> Option<Token> {
        if !self.matches(reference) {
            return None;
        }
        match reference.path_segments().as_slice() {
            [prefix, token] if prefix == TOKEN_PATH_SEGMENT && !token.is_empty() => {
                Some(Token::from_raw(token.as_str()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProxyAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set of authorities owned by the host process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAuthorities {
    pub proxy: ProxyAuthority,
    pub file_provider: String,
}

impl HostAuthorities {
    pub fn for_host(host_identity: &str) -> Self {
        Self {
            proxy: ProxyAuthority::for_host(host_identity),
            file_provider: format!("{host_identity}{FILE_PROVIDER_AUTHORITY_SUFFIX}"),
        }
    }

    /// Host ownership is decided by authority equality alone
    pub fn is_host_owned(&self, reference: &ResourceRef) -> bool {
        match reference.authority() {
            Some(auth) => auth == self.proxy.as_str() || auth == self.file_provider,
            None => false,
        }
    }

    /// A shared-content reference whose authority the host does not own
    pub fn is_foreign_content(&self, reference: &ResourceRef) -> bool {
        reference.scheme() == CONTENT_SCHEME
            && reference.authority().is_some_and(|a| !a.is_empty())
            && !self.is_host_owned(reference)
    }
}
