//! Registry of connected UI clients.
//!
//! The hub is the [`UiSink`] the session layer talks to. It fans every
//! pushed event out to all open connections and forgets connections whose
//! socket has gone away.

use crate::bus::{Responder, UiSink};
use crate::protocol::UiEvent;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, trace};
use uuid::Uuid;

#[derive(Debug)]
struct ConnectionEntry {
    responder: Responder,
    connected_at: DateTime<Utc>,
}

/// Connection information snapshot
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: Uuid,

    /// When the connection was established
    pub connected_at: DateTime<Utc>,

    /// How long the connection has been active
    pub uptime: chrono::Duration,
}

/// Fan-out point for UI events.
#[derive(Debug, Default)]
pub struct UiHub {
    connections: RwLock<HashMap<Uuid, ConnectionEntry>>,
}

impl UiHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection and return its id.
    pub fn register(&self, responder: Responder) -> Uuid {
        let id = Uuid::new_v4();
        let mut connections = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        connections.insert(
            id,
            ConnectionEntry {
                responder,
                connected_at: Utc::now(),
            },
        );
        info!(connection = %id, total = connections.len(), "UI connected");
        id
    }

    pub fn unregister(&self, id: Uuid) {
        let mut connections = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if connections.remove(&id).is_some() {
            info!(connection = %id, total = connections.len(), "UI disconnected");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn connections(&self) -> Vec<ConnectionInfo> {
        let now = Utc::now();
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, entry)| ConnectionInfo {
                id: *id,
                connected_at: entry.connected_at,
                uptime: now - entry.connected_at,
            })
            .collect()
    }
}

impl UiSink for UiHub {
    fn push_ui(&self, event: UiEvent) {
        let mut connections = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if connections.is_empty() {
            debug!(event = event.name(), "No UI connected, event dropped");
            return;
        }

        trace!(
            event = event.name(),
            receivers = connections.len(),
            "Broadcasting UI event"
        );
        connections.retain(|id, entry| {
            let alive = entry.responder.send(event.clone().into());
            if !alive {
                debug!(connection = %id, "Pruning closed UI connection");
            }
            alive
        });
    }
}
