//! The match queue: a single waiting slot.
//!
//! ```text
//!            enqueue(a)                 enqueue(b), b ≠ a
//!   [Empty] ───────────→ [Waiting(a)] ───────────────────→ [Empty]
//!      ↑                     │   │          Matched(a, b)
//!      └──── remove(a) ──────┘   └── enqueue(a) → AlreadyWaiting
//! ```

use pairplay_transport::ConnectionId;

/// What happened when a connection asked for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Nobody was waiting; this connection now waits.
    NoMatchYet,

    /// This connection was already the one waiting. Nothing changed.
    AlreadyWaiting,

    /// The waiting connection (first) was paired with the new arrival
    /// (second). The slot is empty again.
    Matched(ConnectionId, ConnectionId),
}

/// Holds at most one connection waiting for an opponent.
///
/// The queue knows nothing about sessions: callers that want to stop
/// players already in a game from queueing again must check that first.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: Option<ConnectionId>,
}

impl MatchQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the slot if it's empty, or drains it into a match.
    pub fn enqueue(&mut self, conn: ConnectionId) -> MatchOutcome {
        match self.waiting {
            None => {
                self.waiting = Some(conn);
                tracing::debug!(%conn, "waiting for an opponent");
                MatchOutcome::NoMatchYet
            }
            // A second request from the waiting player must not pair
            // the connection with itself.
            Some(waiting) if waiting == conn => MatchOutcome::AlreadyWaiting,
            Some(waiting) => {
                self.waiting = None;
                tracing::debug!(first = %waiting, second = %conn, "matched");
                MatchOutcome::Matched(waiting, conn)
            }
        }
    }

    /// Clears the slot if `conn` is the one waiting.
    ///
    /// Returns `true` if it was. Called when a connection goes away so
    /// the next arrival isn't paired with a dead peer.
    pub fn remove(&mut self, conn: ConnectionId) -> bool {
        if self.waiting == Some(conn) {
            self.waiting = None;
            tracing::debug!(%conn, "left the match queue");
            true
        } else {
            false
        }
    }

    /// The connection currently waiting, if any.
    pub fn waiting(&self) -> Option<ConnectionId> {
        self.waiting
    }
}
