/*!
 * Proxy Registry
 *
 * Mints proxy references for arbitrary sources: a fresh token, resolved
 * metadata and a fixed expiry, stored in the token cache.
 */

use crate::cache::{CacheStats, Record, TokenCache};
use crate::core::clock::Clock;
use crate::core::errors::{ProxyError, Result};
use crate::core::types::Token;
use crate::resolver::{ContentResolver, MetadataResolver};
use crate::uri::{HostAuthorities, ProxyAuthority, ResourceRef};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Token registry for proxied sources
///
/// Every `register` call mints a distinct token, even for a source that
/// is already registered.
pub struct Registry {
    authorities: HostAuthorities,
    cache: TokenCache,
    metadata: MetadataResolver,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl Registry {
    pub fn new(
        host_identity: &str,
        content: Arc<dyn ContentResolver>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        let authorities = HostAuthorities::for_host(host_identity);
        info!(
            authority = %authorities.proxy,
            ttl_secs = ttl.as_secs(),
            "Proxy registry initialized"
        );
        Self {
            authorities,
            cache: TokenCache::new(Arc::clone(&clock)),
            metadata: MetadataResolver::new(content),
            clock,
            ttl,
        }
    }

    /// Register a source and return its proxy reference
    pub fn register(&self, source: &ResourceRef, mime_hint: Option<&str>) -> Result<ResourceRef> {
        let token = Token::generate();
        let resolved = self.metadata.resolve(source, mime_hint);
        let expires_at = self.clock.now().checked_add(self.ttl).ok_or_else(|| {
            ProxyError::Configuration(format!(
                "token lifetime of {}s overflows the clock",
                self.ttl.as_secs()
            ))
        })?;

        let proxy_ref = self.authorities.proxy.proxy_ref(&token)?;

        debug!(
            token = %token,
            source = %source,
            mime = ?resolved.mime,
            name = %resolved.display_name,
            size = ?resolved.size,
            "source registered"
        );

        self.cache.put(
            token,
            Record::new(
                source.clone(),
                resolved.mime,
                resolved.display_name,
                resolved.size,
                expires_at,
            ),
        );

        Ok(proxy_ref)
    }

    /// Resolve a proxy reference to its live record
    pub fn lookup(&self, proxy_ref: &ResourceRef) -> Option<Arc<Record>> {
        let token = self.token_of(proxy_ref)?;
        self.cache.get(&token)
    }

    pub fn lookup_token(&self, token: &Token) -> Option<Arc<Record>> {
        self.cache.get(token)
    }

    /// Token of a well-formed proxy reference
    pub fn token_of(&self, reference: &ResourceRef) -> Option<Token> {
        self.authorities.proxy.token_of(reference)
    }

    /// Whether a reference points at this proxy (live or not)
    pub fn is_proxy_reference(&self, reference: &ResourceRef) -> bool {
        self.authorities.proxy.matches(reference)
    }

    /// Evict a proxy reference before its expiry
    pub fn evict(&self, proxy_ref: &ResourceRef) -> bool {
        self.token_of(proxy_ref)
            .and_then(|token| self.cache.remove(&token))
            .is_some()
    }

    /// Sweep expired records
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn authority(&self) -> &ProxyAuthority {
        &self.authorities.proxy
    }

    pub fn authorities(&self) -> &HostAuthorities {
        &self.authorities
    }

    pub fn metadata(&self) -> &MetadataResolver {
        &self.metadata
    }

    pub fn content(&self) -> &Arc<dyn ContentResolver> {
        self.metadata.content()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
