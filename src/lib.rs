/*!
 * File Proxy Library
 * Token-addressed proxy references and a streaming server for them
 */

pub mod cache;
pub mod context;
pub mod core;
pub mod monitoring;
pub mod registry;
pub mod resolver;
pub mod rewrite;
pub mod server;
pub mod uri;

// Re-exports
pub use cache::{CacheStats, Record, TokenCache};
pub use context::ProxyContext;
pub use core::{
    Clock, ManualClock, ProxyConfig, ProxyError, Recovered, Result, SerializableError, Size,
    SystemClock, Token,
};
pub use monitoring::{init_tracing, init_tracing_with, OperationSpan};
pub use registry::Registry;
pub use resolver::{
    ContentResolver, LocalResolver, MemResolver, MemSource, MetadataResolver, MetadataRow,
    MetadataValue,
};
pub use rewrite::{
    ActionCategory, ConversionRule, FileProviderRule, GrantFlags, OutgoingRequest, RequestItem,
    Rewriter,
};
pub use server::{OpenMode, ProxyFile, ProxyHandle, StreamingServer};
pub use uri::{HostAuthorities, ProxyAuthority, ResourceRef};
