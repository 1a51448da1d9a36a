//! Per-connection handler: registration, message loop, cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound channel (or refuse if the server is full)
//!   2. Spawn a writer task draining that channel onto the socket
//!   3. Loop: receive bytes → decode → route under the hub lock
//!   4. On exit: route the disconnect, close the channel

use std::sync::Arc;

use pairplay_accounts::AccountStorage;
use pairplay_protocol::{ClientMessage, Codec, ServerMessage};
use pairplay_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::PairplayError;
use crate::server::ServerState;

/// Drop guard that routes a connection's disconnect when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct ConnectionGuard<S: AccountStorage, C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<S, C>>,
}

impl<S: AccountStorage, C: Codec> Drop for ConnectionGuard<S, C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.hub.lock().await.disconnect(conn_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, C>>,
) -> Result<(), PairplayError>
where
    S: AccountStorage,
    C: Codec,
{
    let conn_id = conn.id();
    let conn = Arc::new(conn);

    // --- Step 1: Registration ---
    let outbox = {
        let mut hub = state.hub.lock().await;
        if hub.connection_count() >= state.config.max_connections {
            None
        } else {
            Some(hub.register(conn_id))
        }
    };
    let Some(outbox) = outbox else {
        tracing::warn!(
            %conn_id,
            max = state.config.max_connections,
            "connection limit reached, refusing"
        );
        conn.close().await?;
        return Ok(());
    };
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };
    tracing::info!(%conn_id, "connected");

    // --- Step 2: Writer ---
    tokio::spawn(write_loop(Arc::clone(&conn), outbox, Arc::clone(&state)));

    // --- Step 3: Message loop ---
    let idle_timeout = state.config.idle_timeout();
    loop {
        let received = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%conn_id, "connection idle, closing");
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%conn_id, error = %e, "close failed");
                    }
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "disconnected");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let decoded = state.codec.decode::<ClientMessage>(&data);
        if let Err(e) = &decoded {
            tracing::debug!(%conn_id, error = %e, "failed to decode message");
        }
        state.hub.lock().await.handle(conn_id, decoded);
    }

    // _guard drops here → disconnect is routed and the writer winds down.
    Ok(())
}

/// Writes every queued reply to the socket until the channel closes.
async fn write_loop<S, C>(
    conn: Arc<WebSocketConnection>,
    mut outbox: mpsc::UnboundedReceiver<ServerMessage>,
    state: Arc<ServerState<S, C>>,
) where
    S: AccountStorage,
    C: Codec,
{
    let conn_id = conn.id();
    let text_frames = state.codec.is_text();
    while let Some(msg) = outbox.recv().await {
        let bytes = state.codec.encode(&msg);
        let sent = match std::str::from_utf8(&bytes) {
            Ok(text) if text_frames => conn.send_text(text).await,
            _ => conn.send(&bytes).await,
        };
        if let Err(e) = sent {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
        tracing::trace!(%conn_id, %msg, "sent");
    }
}
