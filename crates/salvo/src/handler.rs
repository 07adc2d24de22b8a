//! Per-connection handler: pumps frames between a socket and the
//! coordinator.
//!
//! Each accepted connection gets two tasks:
//!   1. a reader (this handler) that forwards every inbound frame to the
//!      coordinator as an event, and
//!   2. a writer that drains the connection's outbound channel onto the
//!      socket.
//!
//! Neither task interprets messages; all protocol logic lives in the
//! coordinator.

use std::sync::Arc;

use salvo_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::actor::CoordinatorHandle;
use crate::SalvoError;

/// Drop guard that reports the connection as closed when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task to deliver the event.
struct ConnectionGuard {
    id: ConnectionId,
    coordinator: CoordinatorHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let id = self.id;
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            let _ = coordinator.closed(id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    coordinator: CoordinatorHandle,
) -> Result<(), SalvoError> {
    let conn = Arc::new(conn);
    let id = conn.id();
    tracing::debug!(%id, "handling new connection");

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    coordinator.connected(id, outbound_tx).await?;
    let _guard = ConnectionGuard {
        id,
        coordinator: coordinator.clone(),
    };

    // Writer: ends when the coordinator detaches the connection (the
    // sender is dropped) or the socket stops accepting data.
    let writer_conn = Arc::clone(&conn);
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = writer_conn.send(&frame).await {
                tracing::debug!(%id, error = %e, "send failed, stopping writer");
                break;
            }
        }
    });

    let result = loop {
        match conn.recv().await {
            Ok(Some(data)) => {
                if let Err(e) = coordinator.inbound(id, data).await {
                    break Err(e);
                }
            }
            Ok(None) => {
                tracing::debug!(%id, "connection closed cleanly");
                break Ok(());
            }
            Err(e) => {
                tracing::debug!(%id, error = %e, "recv error");
                break Err(e.into());
            }
        }
    };

    // Wait for the writer to actually stop so its receiver is gone and the
    // connection reads as closed before the coordinator hears about it.
    writer.abort();
    let _ = writer.await;
    // _guard drops here → the coordinator hears about the close.
    result
}
