//! Debounced background writes to the store.

use crate::persistence::Store;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

enum WriteRequest {
    Put { key: String, json: String },
    Flush(Sender<()>),
}

/// Coalesces bursts of writes into one write per key.
///
/// The first request opens a window; later requests for the same key inside
/// the window replace the pending value. Writes never block the caller.
pub struct DebouncedWriter {
    tx: Option<Sender<WriteRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl DebouncedWriter {
    /// Spawns the writer thread. The store is owned by that thread.
    pub fn spawn(store: Store, window: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("store-writer".to_string())
            .spawn(move || run_writer(store, rx, window));

        match handle {
            Ok(handle) => Self {
                tx: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                error!(error = %e, "Failed to start store writer, state will not persist");
                Self {
                    tx: None,
                    handle: None,
                }
            }
        }
    }

    /// Queues `value` for writing under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!(key, error = %e, "Failed to encode value for storage");
                return;
            }
        };
        if let Some(tx) = &self.tx {
            let _ = tx.send(WriteRequest::Put {
                key: key.to_string(),
                json,
            });
        }
    }

    /// Blocks until everything queued so far has been written.
    pub fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done_tx, done_rx) = mpsc::channel();
        if tx.send(WriteRequest::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        // Closing the channel makes the thread write what is pending and exit.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_writer(store: Store, rx: Receiver<WriteRequest>, window: Duration) {
    let mut pending = BTreeMap::new();
    let mut waiters = Vec::new();

    while let Ok(first) = rx.recv() {
        let mut flush_now = absorb(first, &mut pending, &mut waiters);
        let deadline = Instant::now() + window;
        let mut disconnected = false;

        while !flush_now {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if timeout.is_zero() {
                break;
            }
            match rx.recv_timeout(timeout) {
                Ok(request) => flush_now = absorb(request, &mut pending, &mut waiters),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        write_pending(&store, &mut pending);
        for waiter in waiters.drain(..) {
            let _ = waiter.send(());
        }
        if disconnected {
            return;
        }
    }
}

/// Records a request. Returns true if the window should close immediately.
fn absorb(
    request: WriteRequest,
    pending: &mut BTreeMap<String, String>,
    waiters: &mut Vec<Sender<()>>,
) -> bool {
    match request {
        WriteRequest::Put { key, json } => {
            pending.insert(key, json);
            false
        }
        WriteRequest::Flush(done) => {
            waiters.push(done);
            true
        }
    }
}

fn write_pending(store: &Store, pending: &mut BTreeMap<String, String>) {
    for (key, json) in std::mem::take(pending) {
        match store.set_raw(&key, &json) {
            Ok(()) => debug!(key, "Persisted"),
            Err(e) => error!(key, error = %e, "Error saving to storage"),
        }
    }
}
