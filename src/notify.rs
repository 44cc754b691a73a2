//! Asynchronous error notifications.
//!
//! Errors that must not abort construction (a missing datacenter file outside
//! production) are queued here. Every subscriber first receives all errors
//! emitted so far and then any later ones, so a subscriber attached right
//! after construction never misses an emission. Once the channel is closed a
//! subscription replays what was emitted and then ends.

use crate::error::ConfigError;
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Fan-out channel for configuration errors.
pub struct ErrorChannel {
    inner: Mutex<Inner>,
}

struct Inner {
    emitted: Vec<ConfigError>,
    subscribers: Vec<UnboundedSender<ConfigError>>,
    closed: bool,
}

impl ErrorChannel {
    /// Create a channel with no emitted errors.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                emitted: Vec::new(),
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// A closed channel holding `errors`, in order.
    pub fn closed(errors: impl IntoIterator<Item = ConfigError>) -> Self {
        let channel = Self::new();
        for err in errors {
            channel.emit(err);
        }
        channel.close();
        channel
    }

    /// Queue `err` and deliver it to every live subscriber.
    pub fn emit(&self, err: ConfigError) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(err.clone()).is_ok());
        inner.emitted.push(err);
    }

    /// Subscribe to errors, starting with everything emitted so far.
    pub fn subscribe(&self) -> ErrorSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap();
        for err in &inner.emitted {
            // Receiver is still in scope, send cannot fail.
            let _ = tx.send(err.clone());
        }
        if !inner.closed {
            inner.subscribers.push(tx);
        }
        ErrorSubscription { rx }
    }

    /// Stop delivering new errors. Live subscriptions end after draining,
    /// and later ones replay the emitted errors and then end. Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        inner.subscribers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    /// Number of errors emitted so far.
    pub fn emitted_count(&self) -> usize {
        self.inner.lock().unwrap().emitted.len()
    }
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorChannel")
            .field("emitted", &self.emitted_count())
            .finish()
    }
}

/// Receiving end of an [`ErrorChannel`] subscription.
#[derive(Debug)]
pub struct ErrorSubscription {
    rx: UnboundedReceiver<ConfigError>,
}

impl ErrorSubscription {
    /// Wait for the next error. Returns `None` once the channel is closed
    /// or dropped and every queued error has been received.
    pub async fn recv(&mut self) -> Option<ConfigError> {
        self.rx.recv().await
    }

    /// Take the next queued error without waiting.
    pub fn try_recv(&mut self) -> Option<ConfigError> {
        self.rx.try_recv().ok()
    }
}
