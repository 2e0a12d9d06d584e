/*!
 * Server Module
 * Streaming server, per-open stream state, pipe and worker thread
 */

pub mod pipe;
pub mod provider;
pub mod stream;
pub mod worker;

// Re-exports
pub use pipe::{pipe, PipeReader, PipeWriter};
pub use provider::{OpenMode, ProxyFile, ProxyHandle, StreamingServer, DEFAULT_COLUMNS};
pub use stream::{ProxyStream, StreamState};
pub use worker::Worker;
