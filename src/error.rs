//! Error Types
//!
//! Every fallible operation in the library returns [`Result`]. Errors abort the
//! current operation; no partially computed output accompanies an error.

use thiserror::Error;

/// Errors produced by ciphers, modes, MACs and stream adapters.
#[derive(Debug, Error)]
pub enum Error {
    /// A key, IV, nonce, tag or block length is outside the algorithm's range.
    #[error("invalid {what} length: expected {expected}, got {actual}")]
    InvalidParameterLength {
        /// Which parameter was rejected.
        what: &'static str,
        /// Human readable description of the accepted lengths.
        expected: &'static str,
        /// Length that was supplied, in bytes.
        actual: usize,
    },

    /// A GCM/CCM length counter would leave its encodable range.
    #[error("{what} too long: limit is {limit} bytes")]
    MessageTooLong {
        /// Which stream overflowed (AAD or message).
        what: &'static str,
        /// Largest accepted length, in bytes.
        limit: u64,
    },

    /// Tag mismatch while decrypting or verifying.
    #[error("authentication failed: tag mismatch")]
    AuthenticationFailure,

    /// Failure reported by an adapted reader or writer.
    #[error("i/o failure: {0}")]
    IoFailure(#[from] std::io::Error),

    /// The object was used before `init`.
    #[error("not initialized: call init first")]
    NotInitialized,

    /// A block-only operation received a partial block.
    #[error("input of {len} bytes is not a multiple of the {block_size}-byte block")]
    IncompleteBlock {
        /// Length of the rejected input.
        len: usize,
        /// Block size of the cipher.
        block_size: usize,
    },

    /// Padding did not verify on removal.
    #[error("invalid padding")]
    InvalidPadding,

    /// An operation was called out of order.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

/// Result type for all library operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn length(what: &'static str, expected: &'static str, actual: usize) -> Self {
        Error::InvalidParameterLength {
            what,
            expected,
            actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_lengths() {
        let err = Error::length("nonce", "7..=13", 5);
        assert_eq!(
            err.to_string(),
            "invalid nonce length: expected 7..=13, got 5"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoFailure(_)));
    }
}
