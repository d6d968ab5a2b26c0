//! Error types for subtitle parsing and serialization.
//!
//! This module defines the `SubxError` enum covering the failure taxonomy
//! described for the subtitle codec core: malformed timestamps, structural
//! format violations, unframeable binary packets, and invalid section
//! headers. Every parser in this crate returns `SubxResult<T>`.

use thiserror::Error;

/// Represents all possible errors raised while parsing or serializing a
/// subtitle document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubxError {
    /// A timestamp field could not be parsed.
    ///
    /// Carries the 1-indexed source line when the failure occurred while
    /// reading a text format, or `None` for errors raised outside line
    /// context (e.g. during tag serialization).
    #[error("invalid timestamp at line {line:?}: {message}")]
    InvalidTimestamp {
        /// 1-indexed line number, when known.
        line: Option<usize>,
        /// Description of what failed to parse.
        message: String,
    },

    /// The input violates the structural grammar of the format (missing
    /// header, wrong field count, unknown section, etc).
    #[error("invalid format [{format}]: {message}")]
    InvalidFormat {
        /// The subtitle format that raised the error (e.g. "ASS", "SRT").
        format: String,
        /// Detailed description of the structural violation.
        message: String,
    },

    /// A binary subtitle packet (VobSub `.sub`) could not be framed.
    ///
    /// Always recoverable: the offending packet is skipped and parsing
    /// continues with the next one.
    #[error("malformed event at offset {offset:#x}: {message}")]
    MalformedEvent {
        /// Byte offset into the `.sub` stream where framing failed.
        offset: usize,
        /// Description of the framing failure.
        message: String,
    },

    /// An XML/section-level structural error (section header malformed,
    /// required block missing).
    #[error("invalid section [{format}]: {message}")]
    InvalidSection {
        /// The subtitle format that raised the error.
        format: String,
        /// Description of the section-level violation.
        message: String,
    },

    /// Catch-all wrapper for I/O-adjacent failures surfaced by a caller
    /// supplying bytes (e.g. an upstream encoding-detection failure).
    #[error("I/O error: {0}")]
    Io(String),
}

/// Specialized `Result` type for subtitle codec operations.
pub type SubxResult<T> = Result<T, SubxError>;

impl SubxError {
    /// Build an `InvalidTimestamp` error without line context.
    pub fn invalid_timestamp<S: Into<String>>(message: S) -> Self {
        SubxError::InvalidTimestamp {
            line: None,
            message: message.into(),
        }
    }

    /// Build an `InvalidTimestamp` error anchored to a source line.
    pub fn invalid_timestamp_at<S: Into<String>>(line: usize, message: S) -> Self {
        SubxError::InvalidTimestamp {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Build an `InvalidFormat` error for the given format and message.
    pub fn invalid_format<S1, S2>(format: S1, message: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        SubxError::InvalidFormat {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Build a `MalformedEvent` error at the given byte offset.
    pub fn malformed_event<S: Into<String>>(offset: usize, message: S) -> Self {
        SubxError::MalformedEvent {
            offset,
            message: message.into(),
        }
    }

    /// Build an `InvalidSection` error for the given format and message.
    pub fn invalid_section<S1, S2>(format: S1, message: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        SubxError::InvalidSection {
            format: format.into(),
            message: message.into(),
        }
    }
}

/// A single recoverable parse failure recorded in "collect" mode.
///
/// Mirrors spec.md §6: `{line, column, code, message, raw?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-indexed source line, when applicable.
    pub line: Option<usize>,
    /// 1-indexed source column, when applicable.
    pub column: Option<usize>,
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// The raw offending text or byte-offset description, when useful.
    pub raw: Option<String>,
}

impl ParseError {
    /// Build a `ParseError` from a `SubxError`, filling in the code and
    /// line from whichever variant it is.
    pub fn from_error(err: &SubxError) -> Self {
        match err {
            SubxError::InvalidTimestamp { line, message } => ParseError {
                line: *line,
                column: None,
                code: ErrorCode::InvalidTimestamp,
                message: message.clone(),
                raw: None,
            },
            SubxError::InvalidFormat { message, .. } => ParseError {
                line: None,
                column: None,
                code: ErrorCode::InvalidFormat,
                message: message.clone(),
                raw: None,
            },
            SubxError::MalformedEvent { offset, message } => ParseError {
                line: None,
                column: None,
                code: ErrorCode::MalformedEvent,
                message: message.clone(),
                raw: Some(format!("{:#x}", offset)),
            },
            SubxError::InvalidSection { message, .. } => ParseError {
                line: None,
                column: None,
                code: ErrorCode::InvalidSection,
                message: message.clone(),
                raw: None,
            },
            SubxError::Io(message) => ParseError {
                line: None,
                column: None,
                code: ErrorCode::InvalidFormat,
                message: message.clone(),
                raw: None,
            },
        }
    }
}

/// Machine-readable error taxonomy, matching spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Structural integrity violation.
    InvalidFormat,
    /// A time field failed to parse.
    InvalidTimestamp,
    /// A binary packet could not be framed.
    MalformedEvent,
    /// A section header was malformed or out of place.
    InvalidSection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_timestamp_display_includes_line() {
        let err = SubxError::invalid_timestamp_at(4, "bad fraction length");
        assert!(err.to_string().contains("line Some(4)"));
    }

    #[test]
    fn parse_error_from_malformed_event_keeps_hex_offset() {
        let err = SubxError::malformed_event(0x2a, "truncated PES");
        let pe = ParseError::from_error(&err);
        assert_eq!(pe.code, ErrorCode::MalformedEvent);
        assert_eq!(pe.raw.as_deref(), Some("0x2a"));
    }
}
