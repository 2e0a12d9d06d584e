/*!
 * Proxy Stream
 *
 * Per-open read state. Reads prefer the seekable channel and fall back to
 * a fresh sequential stream skipped forward to the requested offset.
 */

use crate::cache::Record;
use crate::core::errors::{ProxyError, Result};
use crate::resolver::{ContentResolver, RandomAccess, SourceStream};
use std::io::{self, Read, SeekFrom};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Init,
    Ready,
    Released,
}

pub struct ProxyStream {
    record: Arc<Record>,
    content: Arc<dyn ContentResolver>,
    channel: Option<Box<dyn RandomAccess>>,
    size: Option<u64>,
    state: StreamState,
}

impl ProxyStream {
    pub fn new(record: Arc<Record>, content: Arc<dyn ContentResolver>) -> Self {
        Self {
            record,
            content,
            channel: None,
            size: None,
            state: StreamState::Init,
        }
    }

    /// Open the sized asset once; its length wins over the recorded size
    pub fn establish(&mut self) {
        if self.state != StreamState::Init {
            return;
        }
        match self.content.open_sized_asset(&self.record.source) {
            Ok(asset) => {
                self.channel = asset.channel;
                self.size = asset.length;
            }
            Err(e) => {
                debug!(source = %self.record.source, error = %e, "sized asset unavailable, sequential reads only");
            }
        }
        if self.size.is_none() {
            self.size = self.record.size;
        }
        self.state = StreamState::Ready;
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Byte length, 0 when unknown
    pub fn size(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    /// Read up to `buf.len()` bytes at `offset`. Zero means end of data.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        match self.state {
            StreamState::Released => return Err(ProxyError::Released),
            StreamState::Init => self.establish(),
            StreamState::Ready => {}
        }
        if buf.is_empty() {
            return Ok(0);
        }

        if let Some(channel) = self.channel.as_mut() {
            match read_channel(channel.as_mut(), offset, buf) {
                Ok(read) => return Ok(read),
                Err(e) => {
                    debug!(source = %self.record.source, offset, error = %e, "channel read failed, reopening stream");
                }
            }
        }

        self.read_sequential(offset, buf).map_err(|e| {
            warn!(source = %self.record.source, offset, error = %e, "read failed");
            ProxyError::Io(e.to_string())
        })
    }

    fn read_sequential(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream = self.content.open_sequential(&self.record.source)?;
        let position = skip_to(stream.as_mut(), offset)?;
        if position < offset && discard(stream.as_mut(), offset - position)? < offset - position {
            return Ok(0);
        }
        fill(stream.as_mut(), buf)
    }

    /// Close the channel. Safe to call any number of times.
    pub fn release(&mut self) {
        if self.state == StreamState::Released {
            return;
        }
        self.channel.take();
        self.state = StreamState::Released;
        debug!(source = %self.record.source, "stream released");
    }
}

fn read_channel(channel: &mut dyn RandomAccess, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    channel.seek(SeekFrom::Start(offset))?;
    fill(channel, buf)
}

/// Skip forward until `offset` or until skip stops making progress
fn skip_to(stream: &mut dyn SourceStream, offset: u64) -> io::Result<u64> {
    let mut skipped = 0;
    while skipped < offset {
        let step = stream.skip(offset - skipped)?;
        if step == 0 {
            break;
        }
        skipped += step;
    }
    Ok(skipped)
}

/// Read and drop up to `n` bytes
fn discard(stream: &mut dyn SourceStream, n: u64) -> io::Result<u64> {
    io::copy(&mut Read::take(stream, n), &mut io::sink())
}

/// Read until `buf` is full or the source is exhausted
fn fill<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

impl Drop for ProxyStream {
    fn drop(&mut self) {
        self.release();
    }
}
