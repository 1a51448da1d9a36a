//! Core protocol types for Pairplay's wire format.
//!
//! Every type here has a textual form (`Display`) and can be parsed back
//! from it (`FromStr`). The codecs in [`crate::codec`] only deal with the
//! text ↔ bytes step; everything about fields and signifiers lives here.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// Separator between the fields of one record.
const DELIMITER: char = ',';

// ---------------------------------------------------------------------------
// Result codes
// ---------------------------------------------------------------------------

/// Outcome of a `Login` or `CreateAccount` request.
///
/// Sent back inside [`ServerMessage::LoginResponse`] as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginResult {
    /// Account created, or credentials accepted.
    Success,
    /// `CreateAccount` with a name that already exists.
    NameInUse,
    /// `Login` with a name that doesn't exist.
    NameNotFound,
    /// `Login` with a known name but the wrong password.
    IncorrectPassword,
}

impl LoginResult {
    /// The wire code for this result.
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 1,
            Self::NameInUse => 2,
            Self::NameNotFound => 3,
            Self::IncorrectPassword => 4,
        }
    }

    /// Looks up a result by its wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Success),
            2 => Some(Self::NameInUse),
            3 => Some(Self::NameNotFound),
            4 => Some(Self::IncorrectPassword),
            _ => None,
        }
    }
}

/// Why the server refused to act on a message.
///
/// Sent back inside [`ServerMessage::Error`]. Protocol errors never close
/// the connection; the client may simply send the next message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The record could not be parsed.
    Malformed,
    /// The signifier isn't one the server understands.
    UnknownSignifier,
    /// A move was sent by a connection that isn't in a game session.
    NotInSession,
    /// A queue request came from a connection already in a game session.
    AlreadyInSession,
    /// The server failed internally (e.g. could not persist an account).
    ServerFault,
}

impl ErrorCode {
    /// The wire code for this error.
    pub fn code(self) -> u8 {
        match self {
            Self::Malformed => 1,
            Self::UnknownSignifier => 2,
            Self::NotInSession => 3,
            Self::AlreadyInSession => 4,
            Self::ServerFault => 5,
        }
    }

    /// Looks up an error by its wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Malformed),
            2 => Some(Self::UnknownSignifier),
            3 => Some(Self::NotInSession),
            4 => Some(Self::AlreadyInSession),
            5 => Some(Self::ServerFault),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A tic-tac-toe move: the cell a player marked.
///
/// The server only relays moves; it checks that the cell is on the board
/// but does not track turns or board contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    row: u8,
    col: u8,
}

impl Move {
    /// Width and height of the board.
    pub const BOARD_SIZE: u8 = 3;

    /// Creates a move, rejecting cells outside the board.
    pub fn new(row: u8, col: u8) -> Result<Self, ProtocolError> {
        if row >= Self::BOARD_SIZE || col >= Self::BOARD_SIZE {
            return Err(ProtocolError::Malformed(format!(
                "move ({row}, {col}) is off the board"
            )));
        }
        Ok(Self { row, col })
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    fn parse(row: &str, col: &str) -> Result<Self, ProtocolError> {
        let coord = |field: &str| {
            field.trim().parse::<u8>().map_err(|_| {
                ProtocolError::Malformed(format!("move coordinate {field:?} is not a number"))
            })
        };
        Self::new(coord(row)?, coord(col)?)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.row, self.col)
    }
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Everything a client can send to the server.
#[derive(Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `1,<name>,<password>`: check credentials of an existing account.
    Login { name: String, password: String },

    /// `2,<name>,<password>`: create a new account.
    CreateAccount { name: String, password: String },

    /// `3`: wait for an opponent.
    AddToGameSessionQueue,

    /// `4` or `4,<row>,<col>`: a move, relayed to the opponent.
    ///
    /// The bare form carries no move and is relayed as a bare
    /// `OpponentTicTacToePlay`; older clients only ever send that form.
    TicTacToePlay { mv: Option<Move> },
}

impl ClientMessage {
    pub const LOGIN: i32 = 1;
    pub const CREATE_ACCOUNT: i32 = 2;
    pub const ADD_TO_GAME_SESSION_QUEUE: i32 = 3;
    pub const TIC_TAC_TOE_PLAY: i32 = 4;

    /// The leading integer that identifies this message type.
    pub fn signifier(&self) -> i32 {
        match self {
            Self::Login { .. } => Self::LOGIN,
            Self::CreateAccount { .. } => Self::CREATE_ACCOUNT,
            Self::AddToGameSessionQueue => Self::ADD_TO_GAME_SESSION_QUEUE,
            Self::TicTacToePlay { .. } => Self::TIC_TAC_TOE_PLAY,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Login { .. } => "Login",
            Self::CreateAccount { .. } => "CreateAccount",
            Self::AddToGameSessionQueue => "AddToGameSessionQueue",
            Self::TicTacToePlay { .. } => "TicTacToePlay",
        }
    }
}

// Passwords must never end up in logs, so `Debug` is written by hand.
impl fmt::Debug for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login { name, .. } => f
                .debug_struct("Login")
                .field("name", name)
                .field("password", &"<redacted>")
                .finish(),
            Self::CreateAccount { name, .. } => f
                .debug_struct("CreateAccount")
                .field("name", name)
                .field("password", &"<redacted>")
                .finish(),
            Self::AddToGameSessionQueue => f.write_str("AddToGameSessionQueue"),
            Self::TicTacToePlay { mv } => {
                f.debug_struct("TicTacToePlay").field("mv", mv).finish()
            }
        }
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signifier = self.signifier();
        match self {
            Self::Login { name, password } | Self::CreateAccount { name, password } => {
                write!(f, "{signifier}{DELIMITER}{name}{DELIMITER}{password}")
            }
            Self::AddToGameSessionQueue | Self::TicTacToePlay { mv: None } => {
                write!(f, "{signifier}")
            }
            Self::TicTacToePlay { mv: Some(mv) } => write!(f, "{signifier}{DELIMITER}{mv}"),
        }
    }
}

impl FromStr for ClientMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (signifier, fields) = split_record(s)?;
        match signifier {
            Self::LOGIN => {
                let (name, password) = credentials(&fields)?;
                Ok(Self::Login { name, password })
            }
            Self::CREATE_ACCOUNT => {
                let (name, password) = credentials(&fields)?;
                Ok(Self::CreateAccount { name, password })
            }
            Self::ADD_TO_GAME_SESSION_QUEUE => {
                no_fields(signifier, &fields)?;
                Ok(Self::AddToGameSessionQueue)
            }
            Self::TIC_TAC_TOE_PLAY => Ok(Self::TicTacToePlay {
                mv: optional_move(&fields)?,
            }),
            other => Err(ProtocolError::UnknownSignifier(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Everything the server can send to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage {
    /// `1,<loginResult>`: answer to `Login` and `CreateAccount`.
    LoginResponse(LoginResult),

    /// `2`: you've been paired; the game begins.
    GameSessionStarted,

    /// `3` or `3,<row>,<col>`: your opponent moved.
    OpponentTicTacToePlay(Option<Move>),

    /// `4,<errorCode>`: your last message was rejected.
    Error(ErrorCode),

    /// `5`: your opponent disconnected; the session is over.
    OpponentLeft,
}

impl ServerMessage {
    pub const LOGIN_RESPONSE: i32 = 1;
    pub const GAME_SESSION_STARTED: i32 = 2;
    pub const OPPONENT_TIC_TAC_TOE_PLAY: i32 = 3;
    pub const ERROR: i32 = 4;
    pub const OPPONENT_LEFT: i32 = 5;

    /// The leading integer that identifies this message type.
    pub fn signifier(&self) -> i32 {
        match self {
            Self::LoginResponse(_) => Self::LOGIN_RESPONSE,
            Self::GameSessionStarted => Self::GAME_SESSION_STARTED,
            Self::OpponentTicTacToePlay(_) => Self::OPPONENT_TIC_TAC_TOE_PLAY,
            Self::Error(_) => Self::ERROR,
            Self::OpponentLeft => Self::OPPONENT_LEFT,
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signifier = self.signifier();
        match self {
            Self::LoginResponse(result) => write!(f, "{signifier}{DELIMITER}{}", result.code()),
            Self::Error(code) => write!(f, "{signifier}{DELIMITER}{}", code.code()),
            Self::OpponentTicTacToePlay(Some(mv)) => write!(f, "{signifier}{DELIMITER}{mv}"),
            Self::GameSessionStarted | Self::OpponentTicTacToePlay(None) | Self::OpponentLeft => {
                write!(f, "{signifier}")
            }
        }
    }
}

impl FromStr for ServerMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (signifier, fields) = split_record(s)?;
        match signifier {
            Self::LOGIN_RESPONSE => {
                let code = single_code(&fields)?;
                LoginResult::from_code(code)
                    .map(Self::LoginResponse)
                    .ok_or_else(|| ProtocolError::Malformed(format!("unknown login result {code}")))
            }
            Self::GAME_SESSION_STARTED => {
                no_fields(signifier, &fields)?;
                Ok(Self::GameSessionStarted)
            }
            Self::OPPONENT_TIC_TAC_TOE_PLAY => {
                Ok(Self::OpponentTicTacToePlay(optional_move(&fields)?))
            }
            Self::ERROR => {
                let code = single_code(&fields)?;
                ErrorCode::from_code(code)
                    .map(Self::Error)
                    .ok_or_else(|| ProtocolError::Malformed(format!("unknown error code {code}")))
            }
            Self::OPPONENT_LEFT => {
                no_fields(signifier, &fields)?;
                Ok(Self::OpponentLeft)
            }
            other => Err(ProtocolError::UnknownSignifier(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Splits a record into its signifier and the remaining payload fields.
fn split_record(s: &str) -> Result<(i32, Vec<&str>), ProtocolError> {
    let mut fields = s.split(DELIMITER);
    // `split` always yields at least one item, even for "".
    let head = fields.next().unwrap_or_default();
    let signifier = head.trim().parse::<i32>().map_err(|_| {
        ProtocolError::Malformed(format!("signifier {head:?} is not an integer"))
    })?;
    Ok((signifier, fields.collect()))
}

fn credentials(fields: &[&str]) -> Result<(String, String), ProtocolError> {
    match fields {
        [name, password] => {
            check_credential("name", name)?;
            check_credential("password", password)?;
            Ok((name.to_string(), password.to_string()))
        }
        _ => Err(ProtocolError::Malformed(format!(
            "expected name and password, got {} field(s)",
            fields.len()
        ))),
    }
}

/// Credentials are stored one per line, so line breaks are refused here
/// along with empty values.
fn check_credential(what: &str, value: &str) -> Result<(), ProtocolError> {
    if value.is_empty() {
        return Err(ProtocolError::Malformed(format!("{what} is empty")));
    }
    if value.contains(['\r', '\n']) {
        return Err(ProtocolError::Malformed(format!("{what} contains a line break")));
    }
    Ok(())
}

fn no_fields(signifier: i32, fields: &[&str]) -> Result<(), ProtocolError> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::Malformed(format!(
            "signifier {signifier} takes no fields, got {}",
            fields.len()
        )))
    }
}

fn optional_move(fields: &[&str]) -> Result<Option<Move>, ProtocolError> {
    match fields {
        [] => Ok(None),
        [row, col] => Move::parse(row, col).map(Some),
        _ => Err(ProtocolError::Malformed(format!(
            "expected no move or row and col, got {} field(s)",
            fields.len()
        ))),
    }
}

fn single_code(fields: &[&str]) -> Result<u8, ProtocolError> {
    match fields {
        [code] => code
            .trim()
            .parse::<u8>()
            .map_err(|_| ProtocolError::Malformed(format!("code {code:?} is not a number"))),
        _ => Err(ProtocolError::Malformed(format!(
            "expected one code field, got {}",
            fields.len()
        ))),
    }
}

// =========================================================================
// Tests
// =========================================================================
