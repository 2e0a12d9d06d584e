/*!
 * Rewrite Module
 * Outgoing request model, conversion rules and the rewriter
 */

pub mod request;
pub mod rewriter;
pub mod rules;

// Re-exports
pub use request::{actions, ActionCategory, GrantFlags, OutgoingRequest, RequestItem};
pub use rewriter::Rewriter;
pub use rules::{ConversionRule, FileProviderRule};
