/*!
 * Proxy Context
 *
 * Process-scoped state created once at startup and handed by `Arc` to the
 * streaming server and the rewriter.
 */

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::ProxyConfig;
use crate::core::errors::Result;
use crate::registry::Registry;
use crate::resolver::ContentResolver;
use std::sync::Arc;

pub struct ProxyContext {
    config: ProxyConfig,
    registry: Arc<Registry>,
}

impl ProxyContext {
    /// Build the context on the real wall clock
    pub fn new(config: ProxyConfig, content: Arc<dyn ContentResolver>) -> Result<Arc<Self>> {
        Self::with_clock(config, content, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ProxyConfig,
        content: Arc<dyn ContentResolver>,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let registry = Registry::new(&config.host_identity, content, clock, config.ttl);
        Ok(Arc::new(Self {
            config,
            registry: Arc::new(registry),
        }))
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn content(&self) -> &Arc<dyn ContentResolver> {
        self.registry.content()
    }
}
