// Error taxonomy for feed fetching and identifier extraction
// Fatal errors abort a call; line defects only exclude a single line

use reqwest::StatusCode;
use std::io;
use std::num::ParseIntError;
use thiserror::Error;

// ============================================================================
// TRANSPORT
// ============================================================================

/// Failure while fetching something over HTTP (or writing it to disk)
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, TLS, timeout or body errors from the HTTP client
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("getting {url}: {}", status_text(.status))]
    Status { url: String, status: StatusCode },

    /// Local file I/O (download target, directories)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// Status code if the server rejected the request
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn status_text(status: &StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("unknown status")
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Fatal extraction error. When one of these is returned no identifiers are.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("transport error: {0}")]
    Transport(#[from] FetchError),

    /// Reading the next line from the stream failed mid-way
    #[error("stream read error: {0}")]
    StreamRead(#[source] io::Error),

    /// A parse task panicked or was cancelled before reporting
    #[error("parse task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ============================================================================
// LINE DEFECTS
// ============================================================================

/// Per-line problem: the line is excluded, siblings are unaffected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineDefect {
    /// Invalid UTF-8 before the end of the first field
    #[error("first field is not valid UTF-8 (invalid byte at offset {offset})")]
    NotUtf8 { offset: usize },

    #[error("unreadable first field: {reason}")]
    Unreadable { reason: String },

    #[error("malformed composite key {key:?}: expected 3 hyphen-delimited parts, found {parts}")]
    MalformedKey { key: String, parts: usize },

    #[error("unable to convert sequence in {payload:?}: {source}")]
    BadSequence {
        payload: String,
        #[source]
        source: SequenceError,
    },
}

/// Why the numeric tail of a payload could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("{0}")]
    NotNumeric(#[from] ParseIntError),

    #[error("prefix does not end on a character boundary")]
    SplitInsideCharacter,
}
