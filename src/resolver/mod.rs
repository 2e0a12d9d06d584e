/*!
 * Resolver Module
 * Content resolver capability and best-effort metadata inference
 */

pub mod local;
pub mod memory;
pub mod metadata;
pub mod mime;
pub mod traits;

// Re-exports
pub use local::LocalResolver;
pub use memory::{MemResolver, MemSource};
pub use metadata::{MetadataResolver, ResolvedMetadata};
pub use mime::{guess_from_name, is_bad_mime};
pub use traits::{
    columns, ContentResolver, MetadataRow, MetadataValue, RandomAccess, SizedAsset, SourceStream,
};
