/*!
 * Stream Worker
 *
 * One dedicated named thread. Every open/read/release callback and every
 * pipe copy task runs on it, in submission order.
 */

use crate::core::errors::{ProxyError, Result};
use log::{debug, info, warn};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct Worker {
    name: String,
    sender: Option<flume::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = flume::unbounded::<Job>();
        let thread_name = name.clone();

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        warn!("Job panicked on worker {}", thread_name);
                    }
                }
                debug!("Worker {} drained", thread_name);
            })
            .map_err(|e| ProxyError::WorkerUnavailable(format!("spawn {name}: {e}")))?;

        info!("Stream worker {} started", name);
        Ok(Self {
            name,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job without waiting for it
    pub fn post<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .as_ref()
            .ok_or_else(|| self.unavailable("stopped"))?
            .send(Box::new(job))
            .map_err(|_| self.unavailable("channel closed"))
    }

    /// Run a job on the worker and block for its result
    ///
    /// Must not be called from the worker thread itself.
    pub fn call<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = flume::bounded(1);
        self.post(move || {
            let _ = reply_tx.send(job());
        })?;
        reply_rx
            .recv()
            .map_err(|_| self.unavailable("job dropped without reply"))
    }

    /// Stop accepting jobs and wait for queued ones to finish
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("Worker {} exited abnormally", self.name);
            }
            info!("Stream worker {} stopped", self.name);
        }
    }

    fn unavailable(&self, why: &str) -> ProxyError {
        ProxyError::WorkerUnavailable(format!("{}: {}", self.name, why))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
