// Batched append-only record writer: newline-delimited JSON, flushed on a
// size threshold, a timer, or shutdown
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct LogSink<T> {
    path: PathBuf,
    flush_threshold: usize,
    flush_interval: Duration,
    buf: Mutex<Vec<T>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Serialize + Send + 'static> LogSink<T> {
    pub fn new(path: impl Into<PathBuf>, flush_threshold: usize, flush_interval_secs: u64) -> Self {
        LogSink {
            path: path.into(),
            flush_threshold,
            flush_interval: Duration::from_secs(flush_interval_secs),
            buf: Mutex::new(Vec::new()),
            task: Mutex::new(None),
        }
    }

    /// Spawn the timer task that flushes on a fixed interval regardless of
    /// queue length.
    pub fn start(self: &Arc<Self>) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    crate::log::error(&format!("Error creating log directory: {e}"));
                }
            }
        }
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(this.flush_interval).await;
                this.flush();
            }
        });
        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
    }

    /// Cancel the timer and flush whatever is still buffered, so a graceful
    /// stop loses no records. The final write is synchronous on purpose:
    /// the runtime may be torn down right after this returns.
    pub fn stop(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
        if let Some(drained) = self.drain() {
            write_batch(&self.path, drained);
        }
    }

    /// Append a record. Reaching the threshold flushes inline before this
    /// call returns; the caller is briefly backpressured, never dropped.
    pub fn add(&self, record: T) {
        let drained = {
            let mut buf = match self.buf.lock() {
                Ok(b) => b,
                Err(_) => return,
            };
            buf.push(record);
            if buf.len() < self.flush_threshold {
                return;
            }
            mem::take(&mut *buf)
        };
        self.write(drained);
    }

    /// Swap the queue out under the lock, then write outside it so
    /// producers only ever contend on the swap.
    pub fn flush(&self) {
        if let Some(drained) = self.drain() {
            self.write(drained);
        }
    }

    pub fn pending(&self) -> usize {
        self.buf.lock().map(|b| b.len()).unwrap_or(0)
    }

    fn drain(&self) -> Option<Vec<T>> {
        let mut buf = self.buf.lock().ok()?;
        if buf.is_empty() {
            return None;
        }
        Some(mem::take(&mut *buf))
    }

    /// Hand the drained batch to the blocking pool so the disk write never
    /// stalls the scheduler thread; outside a runtime, write inline.
    fn write(&self, records: Vec<T>) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let path = self.path.clone();
                handle.spawn_blocking(move || write_batch(&path, records));
            }
            Err(_) => write_batch(&self.path, records),
        }
    }
}

fn write_batch<T: Serialize>(path: &Path, records: Vec<T>) {
    let mut out = String::new();
    for record in &records {
        match serde_json::to_string(record) {
            Ok(line) => {
                out.push_str(&line);
                out.push('\n');
            }
            Err(e) => crate::log::error(&format!("Error serializing log record: {e}")),
        }
    }
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| f.write_all(out.as_bytes()));
    if let Err(e) = result {
        // Best-effort telemetry: the drained records are gone.
        crate::log::error(&format!("Error flushing log buffer: {e}"));
    }
}
