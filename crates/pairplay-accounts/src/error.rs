//! Error types for the accounts layer.

use std::path::PathBuf;

/// Errors returned by [`AccountStore`](crate::AccountStore) operations.
///
/// The first three variants are ordinary validation outcomes that the
/// router reports to the client. `InvalidCredential` and `Storage` are
/// server-side problems.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// An account with this name already exists.
    #[error("account name {0:?} is already in use")]
    NameInUse(String),

    /// No account has this name.
    #[error("no account named {0:?}")]
    NameNotFound(String),

    /// The account exists but the password doesn't match.
    #[error("incorrect password for account {0:?}")]
    IncorrectPassword(String),

    /// The name or password can't be stored: it's empty or contains the
    /// field delimiter or a line break.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The durable store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from an [`AccountStorage`](crate::AccountStorage) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The account file exists but couldn't be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The account file couldn't be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line in the account file isn't a `name,password` record.
    #[error("{path}:{line}: expected `name,password`")]
    MalformedLine { path: PathBuf, line: usize },

    /// The backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
