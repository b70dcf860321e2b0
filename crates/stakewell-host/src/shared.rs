// crates/stakewell-host/src/shared.rs
//
// SharedProtocol: one protocol instance shared across tokio tasks.
//
// A single mutex serializes every operation, so no two calls can interleave
// their settle-then-mutate steps on any asset.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, MutexGuard};

use stakewell_core::ProtocolEvent;

use crate::protocol::Protocol;

#[derive(Clone)]
pub struct SharedProtocol {
    inner: Arc<Mutex<Protocol>>,
    /// Kept outside the lock so tasks can subscribe without queueing.
    events: broadcast::Sender<ProtocolEvent>,
}

impl SharedProtocol {
    pub fn new(protocol: Protocol) -> Self {
        let events = protocol.event_sender();
        Self {
            inner: Arc::new(Mutex::new(protocol)),
            events,
        }
    }

    /// Exclusive access for the duration of one or more calls.
    pub async fn lock(&self) -> MutexGuard<'_, Protocol> {
        self.inner.lock().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProtocolEvent> {
        self.events.subscribe()
    }
}
