//! The message router: one inbound message in, addressed replies out.
//!
//! Routing is a pure function of the message, its sender, and the three
//! stores. The router itself owns nothing: it borrows the stores for the
//! duration of one message, so the caller decides how they're shared
//! (the server keeps them behind one mutex; tests own them directly).
//!
//! ```text
//! ClientMessage ──→ MessageRouter ──→ AccountStore  (Login, CreateAccount)
//!                        │        ──→ MatchQueue    (AddToGameSessionQueue)
//!                        │        ──→ SessionTable  (TicTacToePlay)
//!                        ▼
//!          Vec<(ConnectionId, ServerMessage)>
//! ```

use pairplay_accounts::{AccountError, AccountStorage, AccountStore};
use pairplay_match::{MatchOutcome, MatchQueue, SessionTable};
use pairplay_protocol::{
    ClientMessage, ErrorCode, LoginResult, Move, ProtocolError, ServerMessage,
};
use pairplay_transport::ConnectionId;

/// Replies produced for one inbound event, in send order.
///
/// No event produces more than two.
pub type Replies = Vec<(ConnectionId, ServerMessage)>;

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// The three pieces of shared state the router works on.
pub struct Stores<S: AccountStorage> {
    pub accounts: AccountStore<S>,
    pub queue: MatchQueue,
    pub sessions: SessionTable,
}

impl<S: AccountStorage> Stores<S> {
    /// Wraps a loaded account store with an empty queue and no sessions.
    pub fn new(accounts: AccountStore<S>) -> Self {
        Self {
            accounts,
            queue: MatchQueue::new(),
            sessions: SessionTable::new(),
        }
    }

    /// Borrows all three stores for routing.
    pub fn router(&mut self) -> MessageRouter<'_, S> {
        MessageRouter::new(&mut self.accounts, &mut self.queue, &mut self.sessions)
    }
}

// ---------------------------------------------------------------------------
// MessageRouter
// ---------------------------------------------------------------------------

/// Interprets client messages against borrowed stores.
pub struct MessageRouter<'a, S: AccountStorage> {
    accounts: &'a mut AccountStore<S>,
    queue: &'a mut MatchQueue,
    sessions: &'a mut SessionTable,
}

impl<'a, S: AccountStorage> MessageRouter<'a, S> {
    pub fn new(
        accounts: &'a mut AccountStore<S>,
        queue: &'a mut MatchQueue,
        sessions: &'a mut SessionTable,
    ) -> Self {
        Self {
            accounts,
            queue,
            sessions,
        }
    }

    /// Handles one decoded message from `sender`.
    pub fn dispatch(&mut self, sender: ConnectionId, msg: ClientMessage) -> Replies {
        tracing::debug!(conn_id = %sender, kind = msg.kind(), "dispatching");

        match msg {
            ClientMessage::CreateAccount { name, password } => {
                let result = self.accounts.try_create(&name, &password);
                vec![(sender, account_reply(sender, &name, result))]
            }
            ClientMessage::Login { name, password } => {
                let result = self.accounts.authenticate(&name, &password);
                vec![(sender, account_reply(sender, &name, result))]
            }
            ClientMessage::AddToGameSessionQueue => self.enqueue(sender),
            ClientMessage::TicTacToePlay { mv } => self.relay_move(sender, mv),
        }
    }

    /// Answers a message that couldn't be decoded.
    ///
    /// The message is dropped; only the sender hears about it.
    pub fn reject(&self, sender: ConnectionId, error: &ProtocolError) -> Replies {
        tracing::debug!(conn_id = %sender, %error, "rejected message");
        vec![(sender, ServerMessage::Error(error.error_code()))]
    }

    /// Forgets a connection that went away.
    ///
    /// Frees the waiting slot if it held `conn`, and ends its session,
    /// telling the opponent.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Replies {
        self.queue.remove(conn);

        let Some(session) = self.sessions.remove_member(conn) else {
            return Vec::new();
        };
        match session.opponent_of(conn) {
            Ok(opponent) => vec![(opponent, ServerMessage::OpponentLeft)],
            Err(e) => {
                tracing::warn!(conn_id = %conn, error = %e, "session index out of sync");
                Vec::new()
            }
        }
    }

    fn enqueue(&mut self, sender: ConnectionId) -> Replies {
        if let Some(session) = self.sessions.find_by_member(sender) {
            tracing::debug!(
                conn_id = %sender,
                session_id = %session.id(),
                "queue request while already playing"
            );
            return vec![(sender, ServerMessage::Error(ErrorCode::AlreadyInSession))];
        }

        match self.queue.enqueue(sender) {
            MatchOutcome::NoMatchYet | MatchOutcome::AlreadyWaiting => Vec::new(),
            MatchOutcome::Matched(first, second) => {
                match self.sessions.create_session(first, second) {
                    Ok(_) => vec![
                        (first, ServerMessage::GameSessionStarted),
                        (second, ServerMessage::GameSessionStarted),
                    ],
                    Err(e) => {
                        // Unreachable while waiting players are checked
                        // against the session table on entry.
                        tracing::warn!(error = %e, "could not start matched session");
                        vec![(sender, ServerMessage::Error(ErrorCode::ServerFault))]
                    }
                }
            }
        }
    }

    fn relay_move(&mut self, sender: ConnectionId, mv: Option<Move>) -> Replies {
        let Some(session) = self.sessions.find_by_member(sender) else {
            tracing::debug!(conn_id = %sender, "move from a connection with no session");
            return vec![(sender, ServerMessage::Error(ErrorCode::NotInSession))];
        };

        match session.opponent_of(sender) {
            Ok(opponent) => vec![(opponent, ServerMessage::OpponentTicTacToePlay(mv))],
            Err(e) => {
                tracing::warn!(conn_id = %sender, error = %e, "session index out of sync");
                vec![(sender, ServerMessage::Error(ErrorCode::ServerFault))]
            }
        }
    }
}

/// Maps an account operation's outcome to the reply the sender gets.
fn account_reply(
    sender: ConnectionId,
    name: &str,
    result: Result<(), AccountError>,
) -> ServerMessage {
    let login = match result {
        Ok(()) => LoginResult::Success,
        Err(AccountError::NameInUse(_)) => LoginResult::NameInUse,
        Err(AccountError::NameNotFound(_)) => LoginResult::NameNotFound,
        Err(AccountError::IncorrectPassword(_)) => LoginResult::IncorrectPassword,
        Err(AccountError::InvalidCredential(reason)) => {
            tracing::debug!(conn_id = %sender, %reason, "unstorable credential");
            return ServerMessage::Error(ErrorCode::Malformed);
        }
        Err(AccountError::Storage(e)) => {
            tracing::error!(conn_id = %sender, %name, error = %e, "failed to persist accounts");
            return ServerMessage::Error(ErrorCode::ServerFault);
        }
    };
    tracing::info!(conn_id = %sender, %name, result = ?login, "account request");
    ServerMessage::LoginResponse(login)
}

// =========================================================================
// Tests
// =========================================================================
