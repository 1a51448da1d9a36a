//! # Pairplay
//!
//! An authoritative session server for two-player turn-based games.
//!
//! Pairplay authenticates players against persisted accounts, pairs
//! waiting players into two-player sessions, and relays each move to
//! the mover's opponent.
//!
//! ## Layers
//!
//! ```text
//! pairplay-transport  WebSocket connections, ConnectionId
//! pairplay-protocol   comma-separated records, codecs
//! pairplay-accounts   AccountStore + FileStorage
//! pairplay-match      MatchQueue + SessionTable
//! pairplay (this)     MessageRouter, server loop, config
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairplay::prelude::*;
//!
//! # async fn run() -> Result<(), PairplayError> {
//! let config = ServerConfig {
//!     bind_addr: "0.0.0.0:5491".into(),
//!     ..ServerConfig::default()
//! };
//! let server = PairplayServer::builder().config(config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod router;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::PairplayError;
pub use router::{MessageRouter, Replies, Stores};
pub use server::{PairplayServer, PairplayServerBuilder};

/// Everything needed to embed or test a Pairplay server.
pub mod prelude {
    pub use crate::{
        ConfigError, MessageRouter, PairplayError, PairplayServer, PairplayServerBuilder,
        Replies, ServerConfig, Stores,
    };
    pub use pairplay_accounts::{
        Account, AccountError, AccountStorage, AccountStore, FileStorage, MemoryStorage,
        StorageError,
    };
    pub use pairplay_match::{
        MatchError, MatchOutcome, MatchQueue, Session, SessionId, SessionTable,
    };
    pub use pairplay_protocol::{
        ClientMessage, Codec, Encoding, ErrorCode, LoginResult, Move, ProtocolError,
        ServerMessage, Utf8Codec, Utf16Codec,
    };
    pub use pairplay_transport::ConnectionId;
}
