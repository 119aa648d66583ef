use crate::interfaces::events::{ServerEvent, TerminalProfile};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

/// One live handle to a terminal's event stream.
///
/// The `connection_id` identifies this particular connection, independent of
/// the terminal id it is registered under; unregistration matches on it so a
/// stale disconnect cannot evict a newer registration for the same terminal.
#[derive(Debug, Clone)]
pub struct TerminalConnection {
    connection_id: Uuid,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl TerminalConnection {
    /// Wraps a transport sender, returning the connection plus the receiving
    /// half the transport (or a test) drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                connection_id: Uuid::new_v4(),
                sender,
            },
            receiver,
        )
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Hands an event straight to this connection's transport, bypassing the
    /// registry. Used for acks and for error replies to unregistered senders.
    pub fn push(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Exclusive owner of the terminal-id -> connection mapping.
///
/// At most one live connection is tracked per terminal id; a newer
/// registration silently replaces the older entry.
#[derive(Default, Clone)]
pub struct TerminalChannel {
    connections: Arc<RwLock<HashMap<String, TerminalConnection>>>,
}

impl TerminalChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `connection` as the live handle for `terminal_id` and
    /// immediately acks with a `terminal_config` event.
    pub async fn register(
        &self,
        terminal_id: &str,
        profile: TerminalProfile,
        connection: TerminalConnection,
    ) {
        let ack = ServerEvent::TerminalConfig {
            terminal_id: terminal_id.to_string(),
            profile,
        };
        connection.push(ack);

        let mut connections = self.connections.write().await;
        if connections
            .insert(terminal_id.to_string(), connection)
            .is_some()
        {
            debug!(terminal_id, "replaced existing terminal connection");
        }
    }

    /// Removes the mapping only when the stored handle is this exact
    /// connection. A close event from a replaced connection is a no-op.
    pub async fn unregister(&self, connection: &TerminalConnection) {
        let mut connections = self.connections.write().await;
        connections.retain(|_, live| live.connection_id != connection.connection_id);
    }

    /// Hands `event` to the terminal's transport. `false` means "not
    /// delivered" (no registration, or the transport is gone), never an
    /// error.
    pub async fn send(&self, terminal_id: &str, event: ServerEvent) -> bool {
        let connections = self.connections.read().await;
        match connections.get(terminal_id) {
            Some(connection) => {
                let delivered = connection.push(event);
                if !delivered {
                    warn!(terminal_id, "terminal transport closed, event dropped");
                }
                delivered
            }
            None => false,
        }
    }

    /// Terminal ids arrive from untrusted client input; blank or
    /// whitespace-only ids are simply "not connected".
    pub async fn is_connected(&self, terminal_id: &str) -> bool {
        if terminal_id.trim().is_empty() {
            return false;
        }
        let connections = self.connections.read().await;
        connections
            .get(terminal_id)
            .is_some_and(|c| !c.sender.is_closed())
    }

    pub async fn connected_terminals(&self) -> Vec<String> {
        let connections = self.connections.read().await;
        connections
            .iter()
            .filter(|(_, c)| !c.sender.is_closed())
            .map(|(id, _)| id.clone())
            .collect()
    }
}
