/*!
 * In-Memory Content Resolver
 *
 * Sources held in memory with per-source switches for which capabilities
 * answer and which fail. Backs the demo, the benchmark and most tests.
 */

use super::traits::{
    columns, ContentResolver, MetadataRow, MetadataValue, RandomAccess, SizedAsset, SourceStream,
};
use crate::uri::ResourceRef;
use ahash::RandomState;
use dashmap::DashMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One in-memory source and its behaviour switches
#[derive(Debug, Clone)]
pub struct MemSource {
    data: Arc<[u8]>,
    declared_type: Option<String>,
    display_name: Option<String>,
    metadata: bool,
    size_column: bool,
    seekable: bool,
    asset_length: bool,
    skip_limit: Option<u64>,
    fail_metadata: bool,
    fail_type: bool,
    fail_asset: bool,
    fail_stream_open: bool,
    fail_stream_reads: bool,
    fail_channel_reads: bool,
}

impl MemSource {
    /// Seekable source that answers every query
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = data.into();
        Self {
            data: Arc::from(data),
            declared_type: None,
            display_name: None,
            metadata: true,
            size_column: true,
            seekable: true,
            asset_length: true,
            skip_limit: None,
            fail_metadata: false,
            fail_type: false,
            fail_asset: false,
            fail_stream_open: false,
            fail_stream_reads: false,
            fail_channel_reads: false,
        }
    }

    pub fn with_type(mut self, mime: impl Into<String>) -> Self {
        self.declared_type = Some(mime.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Metadata queries succeed but return no rows
    pub fn without_metadata(mut self) -> Self {
        self.metadata = false;
        self
    }

    /// Metadata rows carry no size column
    pub fn without_size_column(mut self) -> Self {
        self.size_column = false;
        self
    }

    /// Sized assets expose no seekable channel
    pub fn sequential_only(mut self) -> Self {
        self.seekable = false;
        self
    }

    /// Sized assets report no length
    pub fn without_asset_length(mut self) -> Self {
        self.asset_length = false;
        self
    }

    /// Cap the bytes a single skip call may advance (0 = never advances)
    pub fn with_skip_limit(mut self, limit: u64) -> Self {
        self.skip_limit = Some(limit);
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub fn failing_type(mut self) -> Self {
        self.fail_type = true;
        self
    }

    pub fn failing_asset(mut self) -> Self {
        self.fail_asset = true;
        self
    }

    pub fn failing_stream_open(mut self) -> Self {
        self.fail_stream_open = true;
        self
    }

    pub fn failing_stream_reads(mut self) -> Self {
        self.fail_stream_reads = true;
        self
    }

    pub fn failing_channel_reads(mut self) -> Self {
        self.fail_channel_reads = true;
        self
    }

    /// Every capability call fails
    pub fn failing_everything(self) -> Self {
        self.failing_metadata()
            .failing_type()
            .failing_asset()
            .failing_stream_open()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// In-memory content resolver
#[derive(Clone, Default)]
pub struct MemResolver {
    sources: Arc<DashMap<ResourceRef, MemSource, RandomState>>,
    sequential_opens: Arc<AtomicUsize>,
    asset_opens: Arc<AtomicUsize>,
}

impl MemResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reference: ResourceRef, source: MemSource) {
        self.sources.insert(reference, source);
    }

    pub fn remove(&self, reference: &ResourceRef) -> Option<MemSource> {
        self.sources.remove(reference).map(|(_, source)| source)
    }

    /// Number of sequential streams opened so far
    pub fn sequential_opens(&self) -> usize {
        self.sequential_opens.load(Ordering::Relaxed)
    }

    /// Number of sized assets opened so far
    pub fn asset_opens(&self) -> usize {
        self.asset_opens.load(Ordering::Relaxed)
    }

    fn source(&self, reference: &ResourceRef) -> io::Result<MemSource> {
        self.sources
            .get(reference)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no source {reference}"))
            })
    }
}

impl ContentResolver for MemResolver {
    fn query_metadata(
        &self,
        source: &ResourceRef,
        requested: &[&str],
    ) -> io::Result<Vec<MetadataRow>> {
        let src = self.source(source)?;
        if src.fail_metadata {
            return Err(io::Error::new(io::ErrorKind::Other, "metadata query failed"));
        }
        if !src.metadata {
            return Ok(Vec::new());
        }

        let mut row = MetadataRow::new();
        for column in requested {
            let value = match *column {
                columns::DISPLAY_NAME => src
                    .display_name
                    .clone()
                    .map_or(MetadataValue::Null, MetadataValue::Text),
                columns::SIZE if src.size_column => MetadataValue::Integer(src.data.len() as i64),
                _ => MetadataValue::Null,
            };
            row.push(*column, value);
        }
        Ok(vec![row])
    }

    fn get_type(&self, source: &ResourceRef) -> io::Result<Option<String>> {
        let src = self.source(source)?;
        if src.fail_type {
            return Err(io::Error::new(io::ErrorKind::Other, "type query failed"));
        }
        Ok(src.declared_type)
    }

    fn open_sequential(&self, source: &ResourceRef) -> io::Result<Box<dyn SourceStream>> {
        let src = self.source(source)?;
        self.sequential_opens.fetch_add(1, Ordering::Relaxed);
        if src.fail_stream_open {
            return Err(io::Error::new(io::ErrorKind::Other, "stream open failed"));
        }
        Ok(Box::new(MemStream {
            cursor: Cursor::new(Arc::clone(&src.data)),
            skip_limit: src.skip_limit,
            fail_reads: src.fail_stream_reads,
        }))
    }

    fn open_sized_asset(&self, source: &ResourceRef) -> io::Result<SizedAsset> {
        let src = self.source(source)?;
        self.asset_opens.fetch_add(1, Ordering::Relaxed);
        if src.fail_asset {
            return Err(io::Error::new(io::ErrorKind::Other, "asset open failed"));
        }

        let channel: Option<Box<dyn RandomAccess>> = src.seekable.then(|| {
            Box::new(MemChannel {
                cursor: Cursor::new(Arc::clone(&src.data)),
                fail_reads: src.fail_channel_reads,
            }) as Box<dyn RandomAccess>
        });
        let length = src.asset_length.then(|| src.data.len() as u64);
        Ok(SizedAsset::new(channel, length))
    }
}

/// Sequential stream over an in-memory source
struct MemStream {
    cursor: Cursor<Arc<[u8]>>,
    skip_limit: Option<u64>,
    fail_reads: bool,
}

impl Read for MemStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::Other, "stream read failed"));
        }
        self.cursor.read(buf)
    }
}

impl SourceStream for MemStream {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let capped = self.skip_limit.map_or(n, |limit| n.min(limit));
        SourceStream::skip(&mut self.cursor, capped)
    }
}

/// Seekable channel over an in-memory source
struct MemChannel {
    cursor: Cursor<Arc<[u8]>>,
    fail_reads: bool,
}

impl Read for MemChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::Other, "channel read failed"));
        }
        self.cursor.read(buf)
    }
}

impl Seek for MemChannel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}
