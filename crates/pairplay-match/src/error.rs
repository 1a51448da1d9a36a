//! Error types for the matchmaking layer.

use pairplay_transport::ConnectionId;

use crate::SessionId;

/// Errors that can occur while creating or querying sessions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// Both members of a would-be session are the same connection.
    #[error("{0} cannot play against itself")]
    SameConnection(ConnectionId),

    /// The connection already belongs to an active session.
    #[error("{0} is already in session {1}")]
    AlreadyInSession(ConnectionId, SessionId),

    /// The connection isn't a member of the given session.
    #[error("{0} is not a member of session {1}")]
    NotAMember(ConnectionId, SessionId),
}
