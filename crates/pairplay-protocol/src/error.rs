//! Error types for the protocol layer.
//!
//! Each crate in Pairplay defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in how a record was written,
//! not in networking or in the accounts/matchmaking state.

use crate::ErrorCode;

/// Errors that can occur while decoding a wire record.
///
/// None of these are fatal: the server logs them, answers the sender
/// with an [`ErrorCode`], and keeps serving the connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The bytes are not valid text in the configured encoding.
    #[error("invalid text encoding: {0}")]
    InvalidEncoding(String),

    /// The record could not be parsed: bad signifier, wrong number of
    /// fields, empty credentials, or an out-of-range move.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The leading signifier is a number, but not one this protocol knows.
    #[error("unknown signifier {0}")]
    UnknownSignifier(i32),
}

impl ProtocolError {
    /// The code sent back to the client for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidEncoding(_) | Self::Malformed(_) => ErrorCode::Malformed,
            Self::UnknownSignifier(_) => ErrorCode::UnknownSignifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_unknown_signifier() {
        assert_eq!(
            ProtocolError::UnknownSignifier(9).error_code(),
            ErrorCode::UnknownSignifier
        );
    }

    #[test]
    fn test_error_code_encoding_maps_to_malformed() {
        let err = ProtocolError::InvalidEncoding("odd length".into());
        assert_eq!(err.error_code(), ErrorCode::Malformed);
        assert!(err.to_string().contains("odd length"));
    }
}
