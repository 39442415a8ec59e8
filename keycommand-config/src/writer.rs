//! Deferred, order-preserving customization writes.
//!
//! [`BackgroundStorage`] wraps any [`CustomizationStorage`] and hands saves to
//! a single worker thread through a FIFO channel. Because there is exactly one
//! consumer, a later write is always applied after an earlier one even though
//! the caller returns before the bytes hit the medium.

use crate::customizations::Customizations;
use crate::error::StoreError;
use crate::storage::CustomizationStorage;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;

enum WriteRequest {
    Save(Customizations),
    Flush(Sender<()>),
}

/// Storage wrapper that performs saves on a dedicated writer thread.
pub struct BackgroundStorage {
    inner: Arc<dyn CustomizationStorage>,
    sender: Mutex<Option<Sender<WriteRequest>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for BackgroundStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundStorage")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl BackgroundStorage {
    /// Start a writer thread in front of `inner`.
    pub fn new(inner: impl CustomizationStorage + 'static) -> Result<Self, StoreError> {
        let inner: Arc<dyn CustomizationStorage> = Arc::new(inner);
        let (tx, rx) = channel::<WriteRequest>();

        let worker_inner = Arc::clone(&inner);
        let worker = std::thread::Builder::new()
            .name("keycommand-writer".to_string())
            .spawn(move || {
                for request in rx {
                    match request {
                        WriteRequest::Save(customizations) => {
                            if let Err(e) = worker_inner.save(&customizations) {
                                log::error!("Failed to persist key binding customizations: {}", e);
                            }
                        }
                        WriteRequest::Flush(ack) => {
                            let _ = ack.send(());
                        }
                    }
                }
                log::debug!("Customization writer stopped");
            })
            .map_err(StoreError::WorkerSpawn)?;

        Ok(Self {
            inner,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    fn send(&self, request: WriteRequest) -> Result<(), StoreError> {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => tx.send(request).map_err(|_| StoreError::WriterClosed),
            None => Err(StoreError::WriterClosed),
        }
    }
}

impl CustomizationStorage for BackgroundStorage {
    fn load(&self) -> Result<Customizations, StoreError> {
        // Queued writes must land before we read back.
        self.flush();
        self.inner.load()
    }

    fn save(&self, customizations: &Customizations) -> Result<(), StoreError> {
        self.send(WriteRequest::Save(customizations.clone()))
    }

    fn flush(&self) {
        let (ack_tx, ack_rx) = channel();
        if self.send(WriteRequest::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
        self.inner.flush();
    }
}

impl Drop for BackgroundStorage {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain the queue and exit.
        self.sender.lock().take();
        if let Some(worker) = self.worker.lock().take()
            && worker.join().is_err()
        {
            log::error!("Customization writer thread panicked");
        }
    }
}
