/*!
 * Local Content Resolver
 * Serves `content://<authority>/<path>` from per-authority root directories
 */

use super::mime;
use super::traits::{
    columns, ContentResolver, MetadataRow, MetadataValue, SizedAsset, SourceStream,
};
use crate::core::errors::{ProxyError, Result};
use crate::core::limits::CONTENT_SCHEME;
use crate::uri::ResourceRef;
use ahash::RandomState;
use dashmap::DashMap;
use path_clean::PathClean;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Resolver backed by the local filesystem
#[derive(Clone, Default)]
pub struct LocalResolver {
    roots: Arc<DashMap<String, PathBuf, RandomState>>,
}

impl LocalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `root` under `authority`
    pub fn mount(&self, authority: impl Into<String>, root: impl AsRef<Path>) {
        let authority = authority.into();
        let root = root.as_ref().to_path_buf().clean();
        info!(authority = %authority, root = %root.display(), "Mounted local content root");
        self.roots.insert(authority, root);
    }

    /// Build the reference for a file relative to a mounted root
    pub fn reference_for(&self, authority: &str, relative: impl AsRef<Path>) -> Result<ResourceRef> {
        if !self.roots.contains_key(authority) {
            return Err(ProxyError::NotFound(format!("no root mounted at {authority}")));
        }
        let segments: Vec<String> = relative
            .as_ref()
            .components()
            .filter_map(|c| match c {
                std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        ResourceRef::hierarchical(CONTENT_SCHEME, authority, segments)
    }

    /// Map a reference onto a file below its root
    fn resolve_path(&self, reference: &ResourceRef) -> io::Result<PathBuf> {
        if reference.scheme() != CONTENT_SCHEME {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported scheme: {}", reference.scheme()),
            ));
        }
        let authority = reference.authority().unwrap_or_default();
        let root = self
            .roots
            .get(authority)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("unknown authority {authority}"))
            })?;

        let mut path = root.clone();
        for segment in reference.path_segments() {
            path.push(segment);
        }
        let path = path.clean();
        if !path.starts_with(&root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("path escapes root: {reference}"),
            ));
        }
        Ok(path)
    }
}

impl ContentResolver for LocalResolver {
    fn query_metadata(
        &self,
        source: &ResourceRef,
        requested: &[&str],
    ) -> io::Result<Vec<MetadataRow>> {
        let path = self.resolve_path(source)?;
        let meta = std::fs::metadata(&path)?;
        if !meta.is_file() {
            return Ok(Vec::new());
        }

        let mut row = MetadataRow::new();
        for column in requested {
            let value = match *column {
                columns::DISPLAY_NAME => path
                    .file_name()
                    .map(|n| MetadataValue::Text(n.to_string_lossy().into_owned()))
                    .unwrap_or(MetadataValue::Null),
                columns::SIZE => i64::try_from(meta.len())
                    .map(MetadataValue::Integer)
                    .unwrap_or(MetadataValue::Null),
                _ => MetadataValue::Null,
            };
            row.push(*column, value);
        }
        Ok(vec![row])
    }

    fn get_type(&self, source: &ResourceRef) -> io::Result<Option<String>> {
        let path = self.resolve_path(source)?;
        Ok(path
            .file_name()
            .and_then(|n| mime::guess_from_name(&n.to_string_lossy()))
            .map(str::to_string))
    }

    fn open_sequential(&self, source: &ResourceRef) -> io::Result<Box<dyn SourceStream>> {
        let path = self.resolve_path(source)?;
        Ok(Box::new(File::open(path)?))
    }

    fn open_sized_asset(&self, source: &ResourceRef) -> io::Result<SizedAsset> {
        let path = self.resolve_path(source)?;
        let file = File::open(path)?;
        let length = file.metadata()?.len();
        Ok(SizedAsset::new(Some(Box::new(file)), Some(length)))
    }
}
