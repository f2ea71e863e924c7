// Banned-address store: mutex-guarded set with write-through persistence
// and a periodic mtime-based reload of external edits
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;

#[derive(Serialize, Deserialize, Default)]
struct BlocklistFile {
    #[serde(default)]
    blocked_ips: Vec<String>,
    #[serde(default)]
    last_updated: String,
}

struct Inner {
    blocked: HashSet<String>,
    last_modified: Option<SystemTime>,
}

pub struct Blocklist {
    path: PathBuf,
    reload_interval: Duration,
    inner: Mutex<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Blocklist {
    pub fn new(path: impl Into<PathBuf>, reload_secs: u64) -> Self {
        Blocklist {
            path: path.into(),
            reload_interval: Duration::from_secs(reload_secs),
            inner: Mutex::new(Inner { blocked: HashSet::new(), last_modified: None }),
            task: Mutex::new(None),
        }
    }

    /// One synchronous initial load (creating an empty file when absent),
    /// then a recurring reconciliation task that picks up external edits.
    pub fn start(self: &Arc<Self>) {
        if self.path.exists() {
            self.reload();
        } else if let Ok(mut inner) = self.inner.lock() {
            self.save_locked(&mut inner);
        }
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(this.reload_interval).await;
                this.reload();
            }
        });
        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
    }

    /// Cancel the reconciliation task. Mutations are write-through, so
    /// there is nothing to flush.
    pub fn stop(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }

    pub fn is_blocked(&self, ip: &str) -> bool {
        match self.inner.lock() {
            Ok(inner) => inner.blocked.contains(ip),
            Err(_) => false,
        }
    }

    pub fn add(&self, ip: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.blocked.insert(ip.to_string());
            self.save_locked(&mut inner);
        }
    }

    pub fn remove(&self, ip: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.blocked.remove(ip);
            self.save_locked(&mut inner);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.blocked.len()).unwrap_or(0)
    }

    /// Re-read the backing file if its mtime moved since the last load.
    /// Any failure leaves the in-memory set at its last good value.
    fn reload(&self) {
        let modified = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                crate::log::error(&format!("Error reading blocklist metadata: {e}"));
                return;
            }
        };
        let mut inner = match self.inner.lock() {
            Ok(i) => i,
            Err(_) => return,
        };
        if inner.last_modified == Some(modified) {
            return;
        }
        match fs::read_to_string(&self.path) {
            Ok(txt) => match serde_json::from_str::<BlocklistFile>(&txt) {
                Ok(data) => {
                    inner.blocked = data.blocked_ips.into_iter().collect();
                    inner.last_modified = Some(modified);
                    crate::log::info(&format!("Loaded {} blocked IPs", inner.blocked.len()));
                }
                Err(e) => crate::log::error(&format!("Error parsing blocklist: {e}")),
            },
            Err(e) => crate::log::error(&format!("Error loading blocklist: {e}")),
        }
    }

    /// Serialize the full set plus a last-updated timestamp. Remembers the
    /// resulting mtime so the reload loop skips our own writes.
    fn save_locked(&self, inner: &mut Inner) {
        let mut blocked_ips: Vec<String> = inner.blocked.iter().cloned().collect();
        blocked_ips.sort();
        let data = BlocklistFile { blocked_ips, last_updated: crate::log::utc_now() };
        let txt = match serde_json::to_string_pretty(&data) {
            Ok(t) => t,
            Err(e) => {
                crate::log::error(&format!("Error serializing blocklist: {e}"));
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, txt) {
            crate::log::error(&format!("Error saving blocklist: {e}"));
            return;
        }
        inner.last_modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
    }
}
