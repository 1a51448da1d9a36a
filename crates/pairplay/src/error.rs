//! Unified error type for the Pairplay server.

use pairplay_accounts::AccountError;
use pairplay_transport::TransportError;

/// Errors that stop a server from starting or end a connection early.
///
/// Protocol and matchmaking failures never show up here: the router
/// answers them with an error reply and the connection carries on.
#[derive(Debug, thiserror::Error)]
pub enum PairplayError {
    /// Binding the listener, or sending on or closing a connection, failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The account file couldn't be loaded at startup.
    #[error(transparent)]
    Account(#[from] AccountError),
}

#[cfg(test)]
mod tests {
    use pairplay_accounts::StorageError;

    use super::*;

    #[test]
    fn test_from_transport_error_keeps_bind_message() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: PairplayError = TransportError::BindFailed(io).into();
        assert!(matches!(err, PairplayError::Transport(_)));
        assert!(err.to_string().contains("port taken"));
    }

    #[test]
    fn test_from_account_error_keeps_storage_message() {
        let err: PairplayError =
            AccountError::from(StorageError::Unavailable("read-only".into())).into();
        assert!(matches!(err, PairplayError::Account(_)));
        assert!(err.to_string().contains("read-only"));
    }
}
