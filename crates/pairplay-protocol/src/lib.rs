//! Wire protocol for Pairplay.
//!
//! This crate defines the "language" that game clients and the session
//! server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`LoginResult`],
//!   [`ErrorCode`], [`Move`]): the records that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`Utf8Codec`], [`Utf16Codec`],
//!   [`Encoding`]): how those records are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Wire format
//!
//! Every message is one comma-separated text record. The first field is
//! an integer *signifier* naming the message type; the remaining fields
//! are its payload:
//!
//! ```text
//! client → server              server → client
//! 1,<name>,<password>  Login   1,<loginResult>   LoginResponse
//! 2,<name>,<password>  Create  2                 GameSessionStarted
//! 3                    Queue   3[,<row>,<col>]   OpponentTicTacToePlay
//! 4[,<row>,<col>]      Play    4,<errorCode>     Error
//!                              5                 OpponentLeft
//! ```
//!
//! The protocol layer doesn't know about connections, accounts or
//! sessions: it only knows how to parse and print records.

mod codec;
mod error;
mod types;

pub use codec::{Codec, Encoding, Utf16Codec, Utf8Codec};
pub use error::ProtocolError;
pub use types::{ClientMessage, ErrorCode, LoginResult, Move, ServerMessage};
