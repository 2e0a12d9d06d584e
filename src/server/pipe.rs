/*!
 * Blocking Byte Pipe
 * Ringbuf-backed pipe between the worker's copy task and a consumer
 */

use parking_lot::{Condvar, Mutex};
use ringbuf::{traits::*, HeapRb};
use std::io::{self, Read, Write};
use std::sync::Arc;

struct PipeState {
    buffer: HeapRb<u8>,
    writer_closed: bool,
    reader_closed: bool,
}

struct PipeShared {
    state: Mutex<PipeState>,
    readable: Condvar,
    writable: Condvar,
}

/// Create a pipe holding at most `capacity` bytes in flight
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let shared = Arc::new(PipeShared {
        state: Mutex::new(PipeState {
            buffer: HeapRb::<u8>::new(capacity.max(1)),
            writer_closed: false,
            reader_closed: false,
        }),
        readable: Condvar::new(),
        writable: Condvar::new(),
    });
    (
        PipeWriter {
            shared: Arc::clone(&shared),
        },
        PipeReader { shared },
    )
}

/// Consumer end. Reads block until data arrives or the writer is gone.
pub struct PipeReader {
    shared: Arc<PipeShared>,
}

impl PipeReader {
    /// Bytes currently buffered
    pub fn buffered(&self) -> usize {
        self.shared.state.lock().buffer.occupied_len()
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.state.lock();
        loop {
            if !state.buffer.is_empty() {
                let read = state.buffer.pop_slice(buf);
                self.shared.writable.notify_one();
                return Ok(read);
            }
            if state.writer_closed {
                return Ok(0);
            }
            self.shared.readable.wait(&mut state);
        }
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.shared.state.lock().reader_closed = true;
        self.shared.writable.notify_all();
    }
}

impl std::fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeReader")
            .field("buffered", &self.buffered())
            .finish()
    }
}

/// Producer end. Writes block while the pipe is full; dropping it is EOF.
pub struct PipeWriter {
    shared: Arc<PipeShared>,
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let mut state = self.shared.state.lock();
        loop {
            if state.reader_closed {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed"));
            }
            if state.buffer.vacant_len() > 0 {
                let written = state.buffer.push_slice(data);
                self.shared.readable.notify_one();
                return Ok(written);
            }
            self.shared.writable.wait(&mut state);
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.shared.state.lock().writer_closed = true;
        self.shared.readable.notify_all();
    }
}
