/*!
 * Resource Reference Module
 * Locators, host authorities and the proxy address space
 */

pub mod authority;
pub mod reference;

pub use authority::{HostAuthorities, ProxyAuthority};
pub use reference::ResourceRef;
