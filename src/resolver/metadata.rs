/*!
 * Metadata Resolver
 *
 * Best-effort mime / display-name / size inference for a source. Every
 * query is independently failable and a failure only means "no value".
 */

use super::mime;
use super::traits::{columns, ContentResolver};
use crate::core::errors::Recovered;
use crate::core::limits::PLACEHOLDER_DISPLAY_NAME;
use crate::core::types::Size;
use crate::uri::ResourceRef;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Outcome of resolving a source's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    /// `None` when neither the hint, the provider nor the extension table helped
    pub mime: Option<String>,
    /// Never empty
    pub display_name: String,
    pub size: Option<Size>,
}

/// Metadata inference on top of a content resolver
#[derive(Clone)]
pub struct MetadataResolver {
    content: Arc<dyn ContentResolver>,
}

impl MetadataResolver {
    pub fn new(content: Arc<dyn ContentResolver>) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &Arc<dyn ContentResolver> {
        &self.content
    }

    /// Resolve `(mime, display_name, size)` for a source
    pub fn resolve(&self, source: &ResourceRef, mime_hint: Option<&str>) -> ResolvedMetadata {
        let mut mime = mime_hint
            .filter(|hint| !hint.is_empty())
            .map(str::to_string)
            .or_else(|| self.declared_type(source));

        let (mut name, mut size) = self.query_name_and_size(source);

        if size.is_none() {
            size = self.asset_length(source);
        }

        if name.is_none() {
            name = source
                .last_path_segment()
                .filter(|s| !s.is_empty());
        }
        let display_name = name.unwrap_or_else(|| PLACEHOLDER_DISPLAY_NAME.to_string());

        if mime.is_none() {
            mime = mime::guess_from_name(&display_name).map(str::to_string);
        }

        ResolvedMetadata {
            mime,
            display_name,
            size,
        }
    }

    /// Provider-declared type, `None` on failure or empty answer
    pub fn declared_type(&self, source: &ResourceRef) -> Option<String> {
        match self.content.get_type(source) {
            Ok(declared) => declared.filter(|t| !t.is_empty()),
            Err(e) => {
                debug!(source = %source, error = %e, reason = %Recovered::MetadataUnavailable, "type query failed");
                None
            }
        }
    }

    /// Display name from the metadata columns only
    pub fn display_name(&self, source: &ResourceRef) -> Option<String> {
        match self.content.query_metadata(source, &[columns::DISPLAY_NAME]) {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.text(columns::DISPLAY_NAME))
                .map(str::to_string),
            Err(e) => {
                debug!(source = %source, error = %e, reason = %Recovered::MetadataUnavailable, "name query failed");
                None
            }
        }
    }

    fn query_name_and_size(&self, source: &ResourceRef) -> (Option<String>, Option<Size>) {
        match self
            .content
            .query_metadata(source, &[columns::DISPLAY_NAME, columns::SIZE])
        {
            Ok(rows) => match rows.first() {
                Some(row) => (
                    row.text(columns::DISPLAY_NAME).map(str::to_string),
                    row.integer(columns::SIZE)
                        .and_then(|n| u64::try_from(n).ok()),
                ),
                None => (None, None),
            },
            Err(e) => {
                debug!(source = %source, error = %e, reason = %Recovered::MetadataUnavailable, "metadata query failed");
                (None, None)
            }
        }
    }

    fn asset_length(&self, source: &ResourceRef) -> Option<Size> {
        match self.content.open_sized_asset(source) {
            // The handle is dropped here; only the length is wanted
            Ok(asset) => asset.length,
            Err(e) => {
                debug!(source = %source, error = %e, reason = %Recovered::MetadataUnavailable, "asset length unavailable");
                None
            }
        }
    }
}
