/*!
 * Content Resolver Traits
 * Capability boundary to whatever actually owns the proxied sources
 */

use crate::core::limits::SKIP_SCRATCH_SIZE;
use crate::uri::ResourceRef;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Standard metadata column names
pub mod columns {
    /// Human readable file name
    pub const DISPLAY_NAME: &str = "_display_name";
    /// Size in bytes
    pub const SIZE: &str = "_size";
}

/// A single metadata cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Integer(i64),
    Text(String),
}

/// One metadata row: ordered column -> value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    cells: Vec<(String, MetadataValue)>,
}

impl MetadataRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: MetadataValue) {
        self.cells.push((column.into(), value));
    }

    pub fn with(mut self, column: impl Into<String>, value: MetadataValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&MetadataValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Non-empty text value of a column
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column) {
            Some(MetadataValue::Text(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.get(column) {
            Some(MetadataValue::Integer(n)) => Some(*n),
            Some(MetadataValue::Text(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Forward-only byte stream opened from a source
pub trait SourceStream: Read + Send {
    /// Skip up to `n` bytes, returning how many were skipped.
    /// Zero means no further progress is possible.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let mut scratch = [0u8; SKIP_SCRATCH_SIZE];
        let want = n.min(scratch.len() as u64) as usize;
        self.read(&mut scratch[..want]).map(|read| read as u64)
    }
}

impl SourceStream for File {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let len = self.metadata()?.len();
        let pos = self.stream_position()?;
        let step = n.min(len.saturating_sub(pos));
        self.seek(SeekFrom::Current(step as i64))?;
        Ok(step)
    }
}

impl<T: AsRef<[u8]> + Send> SourceStream for Cursor<T> {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let len = self.get_ref().as_ref().len() as u64;
        let step = n.min(len.saturating_sub(self.position()));
        self.set_position(self.position() + step);
        Ok(step)
    }
}

/// Seekable channel over a source
pub trait RandomAccess: Read + Seek + Send {}

impl<T: Read + Seek + Send> RandomAccess for T {}

/// Result of opening a sized asset: a length and, when the transport
/// exposes one, a seekable channel
#[derive(Default)]
pub struct SizedAsset {
    pub channel: Option<Box<dyn RandomAccess>>,
    pub length: Option<u64>,
}

impl SizedAsset {
    pub fn new(channel: Option<Box<dyn RandomAccess>>, length: Option<u64>) -> Self {
        Self { channel, length }
    }

    /// Asset that only reports a length
    pub fn length_only(length: u64) -> Self {
        Self {
            channel: None,
            length: Some(length),
        }
    }
}

impl std::fmt::Debug for SizedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizedAsset")
            .field("has_channel", &self.channel.is_some())
            .field("length", &self.length)
            .finish()
    }
}

/// Content resolver capability
///
/// Every call may fail; callers in this crate treat failures as
/// "no value" except on the read path.
pub trait ContentResolver: Send + Sync {
    /// Query metadata columns for a source
    fn query_metadata(&self, source: &ResourceRef, columns: &[&str])
        -> io::Result<Vec<MetadataRow>>;

    /// Declared mime type of a source
    fn get_type(&self, source: &ResourceRef) -> io::Result<Option<String>>;

    /// Open a fresh sequential stream positioned at byte 0
    fn open_sequential(&self, source: &ResourceRef) -> io::Result<Box<dyn SourceStream>>;

    /// Open a sized asset handle
    fn open_sized_asset(&self, source: &ResourceRef) -> io::Result<SizedAsset>;
}
