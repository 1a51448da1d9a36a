//! `PairplayServer` builder, shared state, and the accept loop.
//!
//! This ties the layers together: transport → protocol → router →
//! (accounts | queue | sessions) → replies back out through transport.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use pairplay_accounts::{AccountStorage, AccountStore, FileStorage};
use pairplay_protocol::{ClientMessage, Codec, Encoding, ProtocolError, ServerMessage};
use pairplay_transport::{ConnectionId, Transport, WebSocketTransport};
use tokio::sync::{Mutex, mpsc};

use crate::handler::handle_connection;
use crate::router::{Replies, Stores};
use crate::{PairplayError, ServerConfig};

// ---------------------------------------------------------------------------
// Hub: everything behind the router-wide lock
// ---------------------------------------------------------------------------

/// The stores plus one outbound channel per live connection.
///
/// Kept behind a single mutex: an inbound message is routed and its
/// replies queued on the recipients' channels without releasing it, so
/// every connection sees replies in the order the messages were routed.
pub(crate) struct Hub<S: AccountStorage> {
    stores: Stores<S>,
    outboxes: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl<S: AccountStorage> Hub<S> {
    fn new(stores: Stores<S>) -> Self {
        Self {
            stores,
            outboxes: HashMap::new(),
        }
    }

    pub(crate) fn connection_count(&self) -> usize {
        self.outboxes.len()
    }

    /// Opens the outbound channel for a new connection.
    pub(crate) fn register(
        &mut self,
        conn: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes.insert(conn, tx);
        rx
    }

    /// Routes one inbound message (or its decode failure) and queues the
    /// replies.
    pub(crate) fn handle(
        &mut self,
        sender: ConnectionId,
        decoded: Result<ClientMessage, ProtocolError>,
    ) {
        let replies = match decoded {
            Ok(msg) => self.stores.router().dispatch(sender, msg),
            Err(e) => self.stores.router().reject(sender, &e),
        };
        self.deliver(replies);
    }

    /// Cleans up after a connection: routes the disconnect, then closes
    /// its outbound channel.
    pub(crate) fn disconnect(&mut self, conn: ConnectionId) {
        let replies = self.stores.router().disconnect(conn);
        self.deliver(replies);
        self.outboxes.remove(&conn);
        tracing::debug!(conn_id = %conn, remaining = self.outboxes.len(), "connection removed");
    }

    fn deliver(&self, replies: Replies) {
        for (to, msg) in replies {
            match self.outboxes.get(&to) {
                Some(tx) => {
                    if tx.send(msg).is_err() {
                        tracing::debug!(conn_id = %to, "writer already gone, reply dropped");
                    }
                }
                None => tracing::debug!(conn_id = %to, "recipient not connected, reply dropped"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ServerState
// ---------------------------------------------------------------------------

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<S: AccountStorage, C: Codec> {
    pub(crate) hub: Mutex<Hub<S>>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a Pairplay server.
///
/// # Example
///
/// ```rust,no_run
/// use pairplay::prelude::*;
///
/// # async fn run() -> Result<(), PairplayError> {
/// let server = PairplayServer::builder()
///     .bind("0.0.0.0:5491")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct PairplayServerBuilder {
    config: ServerConfig,
}

impl PairplayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Builds the server with accounts kept in `config.accounts_file`.
    ///
    /// # Errors
    /// Fails if the account file exists but can't be loaded, or the
    /// address can't be bound.
    pub async fn build(self) -> Result<PairplayServer<FileStorage, Encoding>, PairplayError> {
        let storage = FileStorage::new(&self.config.accounts_file);
        self.build_with_storage(storage).await
    }

    /// Builds the server with a custom account backend.
    pub async fn build_with_storage<S: AccountStorage>(
        self,
        storage: S,
    ) -> Result<PairplayServer<S, Encoding>, PairplayError> {
        let accounts = AccountStore::open(storage)?;
        tracing::info!(accounts = accounts.len(), "account store ready");

        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            hub: Mutex::new(Hub::new(Stores::new(accounts))),
            codec: self.config.encoding,
            config: self.config,
        });

        Ok(PairplayServer { transport, state })
    }
}

impl Default for PairplayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A running Pairplay server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PairplayServer<S: AccountStorage, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, C>>,
}

impl PairplayServer<FileStorage, Encoding> {
    /// Creates a new builder.
    pub fn builder() -> PairplayServerBuilder {
        PairplayServerBuilder::new()
    }
}

impl<S, C> PairplayServer<S, C>
where
    S: AccountStorage,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), PairplayError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Each accepted connection gets its own handler task. Handlers
    /// already running are left to finish on their own.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), PairplayError> {
        tracing::info!(
            addr = %self.state.config.bind_addr,
            encoding = ?self.state.config.encoding,
            "Pairplay server running"
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    self.transport.shutdown().await?;
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}
