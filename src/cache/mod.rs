/*!
 * Token Cache Module
 * Expiring store of registered sources
 */

mod record;
mod store;

pub use record::Record;
pub use store::{CacheStats, TokenCache};
