//! Matchmaking and game sessions for Pairplay.
//!
//! Two small state holders, both owned by the server and mutated only
//! from inside its router-wide lock:
//!
//! - [`MatchQueue`]: the single waiting slot. The first player to ask
//!   for a game waits; the second is paired with them.
//! - [`SessionTable`]: the active two-player sessions, and the index
//!   that resolves a connection to its session and opponent.
//!
//! # Key invariants
//!
//! - At most one connection waits at any time.
//! - A session's two members are distinct connections.
//! - A connection is a member of at most one session.

mod error;
mod queue;
mod table;

pub use error::MatchError;
pub use queue::{MatchOutcome, MatchQueue};
pub use table::{Session, SessionId, SessionTable};
