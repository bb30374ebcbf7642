//! Fan-out of incoming messages to subscribed listeners.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use seriallink_frame::Message;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::config::LISTENER_CHANNEL_SIZE;

/// Identifies one registration. Fresh for every `register` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Table of listener queues.
///
/// Broadcasting takes the read lock and never blocks: a listener whose queue
/// is full misses the message, everyone else still receives it.
#[derive(Debug)]
pub struct ListenerRegistry {
    listeners: RwLock<HashMap<ListenerId, mpsc::Sender<Message>>>,
    capacity: usize,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::with_capacity(LISTENER_CHANNEL_SIZE)
    }

    /// Create a registry whose listener queues hold `capacity` messages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Add a listener and return its id and the receiving end of its queue.
    pub fn register(&self) -> (ListenerId, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = ListenerId::new();
        self.listeners.write().insert(id, tx);
        tracing::debug!(listener = %id, "listener registered");
        (id, rx)
    }

    /// Remove a listener. Its receiver sees the queue close once drained.
    ///
    /// Unknown ids are ignored.
    pub fn unregister(&self, id: &ListenerId) {
        if self.listeners.write().remove(id).is_some() {
            tracing::debug!(listener = %id, "listener unregistered");
        }
    }

    /// Offer `message` to every listener; returns how many accepted it.
    pub fn broadcast(&self, message: &Message) -> usize {
        let listeners = self.listeners.read();
        let mut delivered = 0;
        for (id, tx) in listeners.iter() {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        listener = %id,
                        kind = %message.kind,
                        id = message.id,
                        "listener queue full, dropping message"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(listener = %id, "listener receiver dropped, skipping");
                }
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
