//! The session table: active two-player games.

use std::collections::HashMap;
use std::fmt;

use pairplay_transport::ConnectionId;

use crate::MatchError;

/// Identifier of a game session, unique within one [`SessionTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// One game between exactly two connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    /// The player who was waiting (the initiator).
    member_a: ConnectionId,
    /// The player whose arrival completed the match.
    member_b: ConnectionId,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Both members, initiator first.
    pub fn members(&self) -> [ConnectionId; 2] {
        [self.member_a, self.member_b]
    }

    /// The member that isn't `conn`.
    ///
    /// # Errors
    /// Returns [`MatchError::NotAMember`] if `conn` isn't in this session.
    pub fn opponent_of(&self, conn: ConnectionId) -> Result<ConnectionId, MatchError> {
        if conn == self.member_a {
            Ok(self.member_b)
        } else if conn == self.member_b {
            Ok(self.member_a)
        } else {
            Err(MatchError::NotAMember(conn, self.id))
        }
    }
}

/// All active sessions, plus an index from each member connection to
/// its session.
///
/// The index makes `find_by_member` a hash lookup and is what enforces
/// "one session per connection": `create_session` refuses any
/// connection already indexed.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<SessionId, Session>,
    members: HashMap<ConnectionId, SessionId>,
    next_id: u64,
}

impl SessionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session between `member_a` (the initiator) and `member_b`.
    ///
    /// # Errors
    /// - [`MatchError::SameConnection`]: both members are the same
    /// - [`MatchError::AlreadyInSession`]: either member is already playing
    pub fn create_session(
        &mut self,
        member_a: ConnectionId,
        member_b: ConnectionId,
    ) -> Result<&Session, MatchError> {
        if member_a == member_b {
            return Err(MatchError::SameConnection(member_a));
        }
        for conn in [member_a, member_b] {
            if let Some(existing) = self.members.get(&conn) {
                return Err(MatchError::AlreadyInSession(conn, *existing));
            }
        }

        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.members.insert(member_a, id);
        self.members.insert(member_b, id);
        let session = self.sessions.entry(id).or_insert(Session {
            id,
            member_a,
            member_b,
        });

        tracing::info!(session_id = %id, %member_a, %member_b, "game session started");
        Ok(&*session)
    }

    /// The session `conn` is playing in, if any.
    pub fn find_by_member(&self, conn: ConnectionId) -> Option<&Session> {
        self.members
            .get(&conn)
            .and_then(|id| self.sessions.get(id))
    }

    /// Looks up a session by ID.
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Ends the session `conn` is playing in and returns it.
    ///
    /// Both members are released and may be matched again.
    pub fn remove_member(&mut self, conn: ConnectionId) -> Option<Session> {
        let id = self.members.get(&conn).copied()?;
        let session = self.sessions.remove(&id)?;
        for member in session.members() {
            self.members.remove(&member);
        }
        tracing::info!(session_id = %id, %conn, "game session ended");
        Some(session)
    }

    /// Returns the number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no active sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
