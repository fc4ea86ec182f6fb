//! Registry of live WebSocket connections, keyed by client id.
//!
//! Each connection is an id plus a bounded outbound queue drained by the
//! socket's writer task. A client id may own several connections (one per
//! browser tab); pushes to a client fan out to all of them.

use std::collections::HashMap;
use std::sync::RwLock;

use ragstudio_core::defaults::WS_OUTBOUND_CAPACITY;
use ragstudio_core::{Error, ProgressStatus, Result, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use uuid::Uuid;

/// Identifier of one live connection.
pub type ConnectionId = Uuid;

/// Sending half of a connection's outbound queue.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::Sender<ServerMessage>,
}

impl Connection {
    /// Create a connection handle and the receiver its writer task drains.
    pub fn new() -> (Self, mpsc::Receiver<ServerMessage>) {
        let (outbound, rx) = mpsc::channel(WS_OUTBOUND_CAPACITY);
        (
            Self {
                id: Uuid::now_v7(),
                outbound,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Connection registry.
///
/// The lock is only held for map updates and snapshots, never across an
/// `.await`; broadcasts send to a snapshot of the client's connections.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    clients: RwLock<HashMap<String, HashMap<ConnectionId, Connection>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `client_id`.
    pub fn connect(&self, connection: Connection, client_id: &str) {
        let id = connection.id;
        let count = {
            let mut clients = self.write();
            let set = clients.entry(client_id.to_string()).or_default();
            set.insert(id, connection);
            set.len()
        };
        info!(client_id, connection_id = %id, connections = count, "WebSocket client connected");
    }

    /// Remove a connection. Drops the client entry once its last connection
    /// is gone. Unknown ids are ignored.
    pub fn disconnect(&self, connection_id: ConnectionId, client_id: &str) {
        let removed = {
            let mut clients = self.write();
            match clients.get_mut(client_id) {
                Some(set) => {
                    let removed = set.remove(&connection_id).is_some();
                    if set.is_empty() {
                        clients.remove(client_id);
                    }
                    removed
                }
                None => false,
            }
        };
        if removed {
            info!(client_id, connection_id = %connection_id, "WebSocket client disconnected");
        }
    }

    /// Send to exactly one connection, waiting for queue space.
    pub async fn send_direct(&self, message: ServerMessage, connection: &Connection) -> Result<()> {
        connection.outbound.send(message).await.map_err(|_| {
            Error::ConnectionClosed(format!("connection {} is closed", connection.id))
        })
    }

    /// Send to every connection registered for `client_id`.
    ///
    /// Returns the number of attempted sends. A full or closed queue drops
    /// the message for that connection only.
    pub fn broadcast(&self, message: &ServerMessage, client_id: &str) -> usize {
        let targets: Vec<Connection> = {
            let clients = self.read();
            match clients.get(client_id) {
                Some(set) => set.values().cloned().collect(),
                None => Vec::new(),
            }
        };

        for connection in &targets {
            match connection.outbound.try_send(message.clone()) {
                Ok(()) => trace!(client_id, connection_id = %connection.id, "Message queued"),
                Err(e) => debug!(
                    client_id,
                    connection_id = %connection.id,
                    error = %e,
                    "Dropped message for connection"
                ),
            }
        }
        targets.len()
    }

    /// Broadcast a `parsing_progress` message.
    pub fn send_progress(
        &self,
        client_id: &str,
        filename: &str,
        progress: u8,
        status: ProgressStatus,
        message: &str,
    ) -> usize {
        let msg = ServerMessage::progress(filename, progress, status, message);
        self.broadcast(&msg, client_id)
    }

    /// Number of clients with at least one connection.
    pub fn client_count(&self) -> usize {
        self.read().len()
    }

    /// Number of connections registered for one client.
    pub fn connection_count(&self, client_id: &str) -> usize {
        self.read().get(client_id).map_or(0, HashMap::len)
    }

    /// Number of connections across all clients.
    pub fn total_connections(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }

    fn read(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, HashMap<ConnectionId, Connection>>> {
        self.clients.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, HashMap<ConnectionId, Connection>>> {
        self.clients.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_and_disconnect() {
        let manager = ConnectionManager::new();
        let (a, _rx_a) = Connection::new();
        let (b, _rx_b) = Connection::new();
        let (a_id, b_id) = (a.id(), b.id());

        manager.connect(a, "client-1");
        manager.connect(b, "client-1");
        assert_eq!(manager.client_count(), 1);
        assert_eq!(manager.connection_count("client-1"), 2);

        manager.disconnect(a_id, "client-1");
        assert_eq!(manager.connection_count("client-1"), 1);

        manager.disconnect(b_id, "client-1");
        assert_eq!(manager.client_count(), 0);
        assert_eq!(manager.total_connections(), 0);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let manager = ConnectionManager::new();
        let (conn, _rx) = Connection::new();
        let id = conn.id();
        manager.connect(conn, "c");

        manager.disconnect(id, "c");
        manager.disconnect(id, "c");
        manager.disconnect(Uuid::now_v7(), "never-connected");
        assert_eq!(manager.client_count(), 0);
    }

    #[test]
    fn test_broadcast_counts_failed_sends() {
        let manager = ConnectionManager::new();
        let (live, mut live_rx) = Connection::new();
        let (closed, closed_rx) = Connection::new();
        drop(closed_rx);
        manager.connect(live, "c");
        manager.connect(closed, "c");

        let attempted = manager.broadcast(&ServerMessage::Echo("hi".to_string()), "c");
        assert_eq!(attempted, 2);
        assert_eq!(live_rx.try_recv().unwrap(), ServerMessage::Echo("hi".to_string()));
    }

    #[test]
    fn test_broadcast_to_unknown_client() {
        let manager = ConnectionManager::new();
        assert_eq!(manager.broadcast(&ServerMessage::Echo("x".into()), "nobody"), 0);
    }

    #[test]
    fn test_broadcast_full_queue_drops() {
        let manager = ConnectionManager::new();
        let (conn, mut rx) = Connection::new();
        manager.connect(conn, "c");

        for _ in 0..WS_OUTBOUND_CAPACITY + 5 {
            assert_eq!(manager.broadcast(&ServerMessage::Echo("m".into()), "c"), 1);
        }
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, WS_OUTBOUND_CAPACITY);
    }

    #[test]
    fn test_send_progress_shape() {
        let manager = ConnectionManager::new();
        let (conn, mut rx) = Connection::new();
        manager.connect(conn, "c");

        manager.send_progress("c", "a.pdf", 150, ProgressStatus::Completed, "done");
        match rx.try_recv().unwrap() {
            ServerMessage::ParsingProgress(update) => {
                assert_eq!(update.filename, "a.pdf");
                assert_eq!(update.progress, 100);
                assert_eq!(update.status, ProgressStatus::Completed);
                assert_eq!(update.message, "done");
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_direct_to_closed_connection_fails() {
        let manager = ConnectionManager::new();
        let (conn, rx) = Connection::new();
        drop(rx);
        assert!(conn.is_closed());

        let err = manager
            .send_direct(ServerMessage::Echo("x".into()), &conn)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_send_direct_delivers() {
        let manager = ConnectionManager::new();
        let (conn, mut rx) = Connection::new();
        manager
            .send_direct(ServerMessage::Echo("only you".into()), &conn)
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap(), ServerMessage::Echo("only you".into()));
    }

    #[test]
    fn test_concurrent_connect_disconnect_during_broadcast() {
        use std::sync::Arc;

        let manager = Arc::new(ConnectionManager::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let manager = manager.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    let (conn, _rx) = Connection::new();
                    let id = conn.id();
                    manager.connect(conn, "shared");
                    manager.broadcast(&ServerMessage::Echo(t.to_string()), "shared");
                    manager.disconnect(id, "shared");
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(manager.client_count(), 0);
    }
}
