/*!
 * Streaming Server
 *
 * Serves metadata and byte streams for proxy references. Random-access
 * opens return a seekable handle whose calls run on the stream worker;
 * otherwise a copy task on the same worker fills a pipe.
 */

use super::pipe::{pipe, PipeReader, PipeWriter};
use super::stream::ProxyStream;
use super::worker::Worker;
use crate::context::ProxyContext;
use crate::core::errors::{ProxyError, Result};
use crate::monitoring::OperationSpan;
use crate::resolver::{columns, ContentResolver, MetadataRow, MetadataValue};
use crate::uri::ResourceRef;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Columns served when the caller asks for none
pub const DEFAULT_COLUMNS: [&str; 2] = [columns::DISPLAY_NAME, columns::SIZE];

/// Requested open mode. Unrecognized modes are treated as read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    Read,
    ReadWrite,
    ReadWriteTruncate,
}

impl OpenMode {
    pub fn parse(mode: &str) -> Self {
        match mode {
            "rw" => OpenMode::ReadWrite,
            "rwt" => OpenMode::ReadWriteTruncate,
            _ => OpenMode::Read,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenMode::Read => "r",
            OpenMode::ReadWrite => "rw",
            OpenMode::ReadWriteTruncate => "rwt",
        }
    }
}

/// Streaming server over a proxy context
pub struct StreamingServer {
    context: Arc<ProxyContext>,
    worker: Arc<Worker>,
}

impl StreamingServer {
    /// Start the server and its dedicated worker thread
    pub fn start(context: Arc<ProxyContext>) -> Result<Self> {
        let worker = Worker::spawn(context.config().worker_name.clone())?;
        info!(
            authority = %context.registry().authority(),
            random_access = context.config().random_access_supported,
            "Streaming server started"
        );
        Ok(Self {
            context,
            worker: Arc::new(worker),
        })
    }

    pub fn context(&self) -> &Arc<ProxyContext> {
        &self.context
    }

    /// One metadata row for a live reference, nothing otherwise
    pub fn query(&self, proxy_ref: &ResourceRef, requested: &[&str]) -> Vec<MetadataRow> {
        let Some(record) = self.context.registry().lookup(proxy_ref) else {
            debug!(reference = %proxy_ref, "query for unknown reference");
            return Vec::new();
        };

        let requested: &[&str] = if requested.is_empty() {
            &DEFAULT_COLUMNS
        } else {
            requested
        };

        let mut row = MetadataRow::new();
        for column in requested {
            let value = match *column {
                columns::DISPLAY_NAME => MetadataValue::Text(record.display_name.clone()),
                columns::SIZE => record
                    .size
                    .and_then(|size| i64::try_from(size).ok())
                    .map_or(MetadataValue::Null, MetadataValue::Integer),
                _ => MetadataValue::Null,
            };
            row.push(*column, value);
        }
        vec![row]
    }

    /// Recorded mime type of a live reference
    pub fn get_type(&self, proxy_ref: &ResourceRef) -> Option<String> {
        self.context
            .registry()
            .lookup(proxy_ref)
            .and_then(|record| record.mime.clone())
    }

    /// Open a live reference for reading
    pub fn open_file(&self, proxy_ref: &ResourceRef, mode: &str) -> Result<ProxyFile> {
        let span = OperationSpan::new("open_file");
        let _guard = span.enter();

        let result = self.open_inner(proxy_ref, OpenMode::parse(mode));
        match &result {
            Ok(_) => span.record_result(true),
            Err(e) => span.record_error(&e.to_string()),
        }
        result
    }

    fn open_inner(&self, proxy_ref: &ResourceRef, mode: OpenMode) -> Result<ProxyFile> {
        let record = self
            .context
            .registry()
            .lookup(proxy_ref)
            .ok_or_else(|| ProxyError::NotFound(proxy_ref.to_string()))?;
        let content = Arc::clone(self.context.content());
        let config = self.context.config();

        if !config.random_access_supported {
            let (writer, reader) = pipe(config.pipe_capacity);
            let source = record.source.clone();
            let buffer_size = config.copy_buffer_size;
            self.worker
                .post(move || copy_into_pipe(content.as_ref(), &source, writer, buffer_size))?;
            debug!(reference = %proxy_ref, mode = mode.as_str(), "opened as pipe");
            return Ok(ProxyFile::Pipe(reader));
        }

        let stream = Arc::new(Mutex::new(ProxyStream::new(record, content)));
        let establishing = Arc::clone(&stream);
        let size = self.worker.call(move || {
            let mut stream = establishing.lock();
            stream.establish();
            stream.size()
        })?;

        debug!(reference = %proxy_ref, mode = mode.as_str(), size, "opened seekable handle");
        Ok(ProxyFile::Seekable(ProxyHandle {
            stream,
            worker: Arc::clone(&self.worker),
            size,
            position: 0,
            released: AtomicBool::new(false),
        }))
    }
}

/// Sequential copy from the source into the pipe. Dropping the writer
/// signals end of data, including after a failure.
fn copy_into_pipe(
    content: &dyn ContentResolver,
    source: &ResourceRef,
    mut writer: PipeWriter,
    buffer_size: usize,
) {
    let mut input = match content.open_sequential(source) {
        Ok(input) => input,
        Err(e) => {
            warn!(source = %source, error = %e, "pipe source unavailable");
            return;
        }
    };

    let mut buffer = vec![0u8; buffer_size];
    let mut copied = 0u64;
    loop {
        let read = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(source = %source, copied, error = %e, "pipe copy aborted");
                return;
            }
        };
        if let Err(e) = writer.write_all(&buffer[..read]) {
            debug!(source = %source, copied, error = %e, "pipe consumer went away");
            return;
        }
        copied += read as u64;
    }
    debug!(source = %source, copied, "pipe copy complete");
}

/// An opened proxy reference
pub enum ProxyFile {
    Seekable(ProxyHandle),
    Pipe(PipeReader),
}

impl ProxyFile {
    pub fn is_seekable(&self) -> bool {
        matches!(self, ProxyFile::Seekable(_))
    }

    /// Known size, `None` for pipes
    pub fn size(&self) -> Option<u64> {
        match self {
            ProxyFile::Seekable(handle) => Some(handle.size()),
            ProxyFile::Pipe(_) => None,
        }
    }

    pub fn as_handle(&self) -> Option<&ProxyHandle> {
        match self {
            ProxyFile::Seekable(handle) => Some(handle),
            ProxyFile::Pipe(_) => None,
        }
    }
}

impl Read for ProxyFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ProxyFile::Seekable(handle) => handle.read(buf),
            ProxyFile::Pipe(reader) => reader.read(buf),
        }
    }
}

impl std::fmt::Debug for ProxyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyFile::Seekable(handle) => f
                .debug_struct("Seekable")
                .field("size", &handle.size)
                .field("position", &handle.position)
                .finish(),
            ProxyFile::Pipe(reader) => f.debug_tuple("Pipe").field(reader).finish(),
        }
    }
}

/// Seekable handle; every call runs on the stream worker
pub struct ProxyHandle {
    stream: Arc<Mutex<ProxyStream>>,
    worker: Arc<Worker>,
    size: u64,
    position: u64,
    released: AtomicBool,
}

impl ProxyHandle {
    /// Size reported at open, 0 when unknown
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read up to `buf.len()` bytes at `offset`. Zero means end of data.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if self.released.load(Ordering::Acquire) {
            return Err(ProxyError::Released);
        }
        let want = buf.len();
        let stream = Arc::clone(&self.stream);
        let (result, scratch) = self.worker.call(move || {
            let mut scratch = vec![0u8; want];
            let result = stream.lock().read_at(offset, &mut scratch);
            (result, scratch)
        })?;
        let read = result?;
        buf[..read].copy_from_slice(&scratch[..read]);
        Ok(read)
    }

    /// Release the underlying stream. Never fails; repeat calls are no-ops.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let stream = Arc::clone(&self.stream);
        if self.worker.post(move || stream.lock().release()).is_err() {
            self.stream.lock().release();
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Read for ProxyHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self
            .read_at(self.position, buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        self.position += read as u64;
        Ok(read)
    }
}

impl Seek for ProxyHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.size.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream")
        })?;
        self.position = target;
        Ok(target)
    }
}

impl Drop for ProxyHandle {
    fn drop(&mut self) {
        self.release();
    }
}
