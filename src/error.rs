//! Error types for log decoding.
//!
//! Two kinds of failure exist and are kept apart:
//!
//! - [`UlogError`] is returned through `Result` and aborts the current call.
//!   Stream truncation in the middle of a frame, an unusable file, invalid
//!   configuration, or an unresolvable message ID while seeking.
//! - [`DecodeError`] describes a malformed record the reader stepped over.
//!   These are recorded in order into the reader's error log (see
//!   [`UlogReader::errors`](crate::UlogReader::errors)) and decoding continues at
//!   the next frame boundary.
//!
//! Normal end-of-stream and a seek that finds no record are not errors; they
//! surface as `Ok(None)` and `Ok(false)`.
//!
//! ```rust
//! use ulog_reader::UlogError;
//!
//! let error = UlogError::unexpected_end_of_stream(128, 16, 3);
//! assert!(!error.is_recoverable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for log operations.
pub type Result<T, E = UlogError> = std::result::Result<T, E>;

/// Main error type for log operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UlogError {
    #[error("Log file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Unexpected end of stream at offset {offset:#x}: needed {needed} bytes, {available} available"
    )]
    UnexpectedEndOfStream { offset: u64, needed: usize, available: usize },

    #[error("Unknown DATA message ID {msg_id} at offset {offset:#x}")]
    UnknownDataMessageId { offset: u64, msg_id: u8 },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid reader configuration: {details}")]
    Config { details: String },
}

impl UlogError {
    /// Whether the reader can keep serving calls after this error.
    ///
    /// Stream-level errors leave the cursor at an indeterminate position, so the
    /// session should be treated as finished.
    pub fn is_recoverable(&self) -> bool {
        match self {
            UlogError::File { .. } => false,
            UlogError::UnexpectedEndOfStream { .. } => false,
            UlogError::UnknownDataMessageId { .. } => false,
            UlogError::Parse { .. } => true,
            UlogError::Config { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            UlogError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            UlogError::UnexpectedEndOfStream { .. } => vec![
                "The log is truncated; records before the cut are still readable after reopening",
                "Verify the logging session was closed cleanly",
            ],
            UlogError::UnknownDataMessageId { .. } => vec![
                "Verify source data integrity",
                "Reopen the log and read sequentially instead of seeking",
            ],
            UlogError::Parse { .. } => vec![
                "Check data format compatibility",
                "Verify source data integrity",
            ],
            UlogError::Config { .. } => vec![
                "Check option names and value types",
                "Remove unknown keys from the configuration",
            ],
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        UlogError::File { path, source }
    }

    /// Helper constructor for mid-frame truncation.
    pub fn unexpected_end_of_stream(offset: u64, needed: usize, available: usize) -> Self {
        UlogError::UnexpectedEndOfStream { offset, needed, available }
    }
}

impl From<std::io::Error> for UlogError {
    fn from(err: std::io::Error) -> Self {
        UlogError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for UlogError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        UlogError::Config { details: err.to_string() }
    }
}

/// Cause of a recorded, recoverable decode error.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeErrorKind {
    #[error("Unknown message type: {msg_type:#04x}")]
    UnknownMessageType { msg_type: u8 },

    #[error("Unknown DATA message ID: {msg_id}")]
    UnknownDataMessageId { msg_id: u8 },

    #[error("Message size mismatch, parsed: {parsed}, msg size: {declared}")]
    SizeMismatch { parsed: usize, declared: usize },

    #[error("Malformed record: {details}")]
    Malformed { details: String },

    #[error("Unexpected end of file: needed {needed} bytes, {available} available")]
    UnexpectedEndOfStream { needed: usize, available: usize },
}

/// A recoverable problem found at a given frame offset.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} (at offset {offset:#x})")]
pub struct DecodeError {
    /// Offset of the frame header the problem belongs to
    pub offset: u64,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(offset: u64, kind: DecodeErrorKind) -> Self {
        Self { offset, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn error_messages_carry_their_context(
                offset in any::<u32>(),
                msg_id in any::<u8>(),
                needed in 1usize..0x10000,
                details in ".*"
            ) {
                let offset = offset as u64;
                let eos = UlogError::unexpected_end_of_stream(offset, needed, 0);
                let unknown = UlogError::UnknownDataMessageId { offset, msg_id };
                let parse = UlogError::Parse { context: "FORMAT".into(), details: details.clone() };

                let offset_hex = format!("{:#x}", offset);
                prop_assert!(eos.to_string().contains(&offset_hex));
                prop_assert!(eos.to_string().contains(&needed.to_string()));
                prop_assert!(unknown.to_string().contains(&msg_id.to_string()));
                prop_assert!(parse.to_string().contains(&details));

                let recorded = DecodeError::new(offset, DecodeErrorKind::UnknownDataMessageId { msg_id });
                prop_assert!(recorded.to_string().contains(&offset_hex));
            }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<UlogError>();
        assert_send_sync_static::<DecodeError>();

        let error = UlogError::unexpected_end_of_stream(0, 3, 1);
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn recovery_classification() {
        let eos = UlogError::unexpected_end_of_stream(0x40, 10, 2);
        let config = UlogError::Config { details: "bad".into() };

        assert!(!eos.is_recoverable());
        assert!(config.is_recoverable());
        for suggestion in eos.recovery_suggestions() {
            assert!(suggestion.len() > 5);
        }
    }

    #[test]
    fn size_mismatch_message() {
        let error =
            DecodeError::new(0x20, DecodeErrorKind::SizeMismatch { parsed: 18, declared: 17 });
        assert_eq!(
            error.to_string(),
            "Message size mismatch, parsed: 18, msg size: 17 (at offset 0x20)"
        );
    }

    #[test]
    fn from_conversions_work() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
        match UlogError::from(io_err) {
            UlogError::File { source, .. } => assert_eq!(source.to_string(), "test file"),
            other => panic!("Expected File error variant, got {other:?}"),
        }

        let yaml_err = serde_yaml_ng::from_str::<u32>("not a number").unwrap_err();
        assert!(matches!(UlogError::from(yaml_err), UlogError::Config { .. }));
    }
}
