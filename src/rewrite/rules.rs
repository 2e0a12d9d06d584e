/*!
 * Conversion Rules
 *
 * Fast path tried before registering a source: map a foreign reference
 * straight onto a host-owned equivalent.
 */

use crate::core::limits::CONTENT_SCHEME;
use crate::uri::ResourceRef;

/// Direct mapping of a foreign reference to a host-owned one
pub trait ConversionRule: Send + Sync {
    fn name(&self) -> &str;

    /// `None` when the rule does not apply
    fn convert(&self, reference: &ResourceRef) -> Option<ResourceRef>;
}

/// Maps `content://<guest authority>/<guest prefix>/rest` onto
/// `content://<host authority>/<host prefix>/rest`
#[derive(Debug, Clone)]
pub struct FileProviderRule {
    guest_authority: String,
    guest_prefix: Vec<String>,
    host_authority: String,
    host_prefix: Vec<String>,
}

impl FileProviderRule {
    pub fn new(
        guest_authority: impl Into<String>,
        guest_prefix: &str,
        host_authority: impl Into<String>,
        host_prefix: &str,
    ) -> Self {
        Self {
            guest_authority: guest_authority.into(),
            guest_prefix: split_segments(guest_prefix),
            host_authority: host_authority.into(),
            host_prefix: split_segments(host_prefix),
        }
    }
}

fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ConversionRule for FileProviderRule {
    fn name(&self) -> &str {
        "file_provider"
    }

    fn convert(&self, reference: &ResourceRef) -> Option<ResourceRef> {
        if reference.scheme() != CONTENT_SCHEME
            || reference.authority() != Some(self.guest_authority.as_str())
        {
            return None;
        }

        let segments = reference.path_segments();
        if segments.len() <= self.guest_prefix.len()
            || !segments
                .iter()
                .zip(&self.guest_prefix)
                .all(|(have, want)| have == want)
        {
            return None;
        }

        let rest = segments[self.guest_prefix.len()..].iter().cloned();
        let mapped: Vec<String> = self.host_prefix.iter().cloned().chain(rest).collect();
        ResourceRef::hierarchical(CONTENT_SCHEME, &self.host_authority, mapped).ok()
    }
}
