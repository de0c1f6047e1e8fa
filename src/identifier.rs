// Composite keys and canonical patent identifiers
// Keys look like "US-20120123456-A1": jurisdiction, payload, kind

use crate::error::{LineDefect, SequenceError};

/// Payloads shorter than this are already canonical
const MIN_CORRECTED_LEN: usize = 9;

/// Payload length of a complete pre-grant publication number (year + 7 digits)
const PUBLICATION_LEN: usize = 11;

/// Width of the year/series prefix
const PREFIX_LEN: usize = 4;

/// A hyphen-delimited key split into its three parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeKey<'a> {
    pub jurisdiction: &'a str,
    pub payload: &'a str,
    /// Kind code (A1, B2, ...). Not used for extraction.
    pub kind: &'a str,
}

impl<'a> CompositeKey<'a> {
    /// Split a key into jurisdiction, payload and kind.
    ///
    /// At most three parts are taken, so any further hyphens stay in `kind`.
    /// Fewer than three parts is a defect.
    pub fn parse(key: &'a str) -> Result<Self, LineDefect> {
        let mut parts = key.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(jurisdiction), Some(payload), Some(kind)) => Ok(CompositeKey {
                jurisdiction,
                payload,
                kind,
            }),
            _ => Err(LineDefect::MalformedKey {
                key: key.to_string(),
                parts: key.splitn(3, '-').count(),
            }),
        }
    }

    /// Canonical identifier for this key's payload
    pub fn canonical_id(&self) -> Result<String, LineDefect> {
        canonical_id(self.payload)
    }
}

/// Normalize a payload into a canonical identifier.
///
/// Pre-grant publications are exported with the sequence number missing its
/// zero padding ("2012123456" instead of "20120123456"). Payloads shorter
/// than 9 characters, or exactly 11, are returned unchanged. Anything else is
/// read as a 4-character prefix plus a decimal sequence number and re-rendered
/// with the number padded to 7 digits.
///
/// # Examples:
/// ```
/// use patent_feed::identifier::canonical_id;
///
/// assert_eq!(canonical_id("7650331").unwrap(), "7650331");
/// assert_eq!(canonical_id("2012123456").unwrap(), "20120123456");
/// ```
pub fn canonical_id(payload: &str) -> Result<String, LineDefect> {
    if payload.len() < MIN_CORRECTED_LEN || payload.len() == PUBLICATION_LEN {
        return Ok(payload.to_string());
    }

    let bad_sequence = |source: SequenceError| LineDefect::BadSequence {
        payload: payload.to_string(),
        source,
    };

    if !payload.is_char_boundary(PREFIX_LEN) {
        return Err(bad_sequence(SequenceError::SplitInsideCharacter));
    }
    let (prefix, sequence) = payload.split_at(PREFIX_LEN);

    let number: u64 = sequence
        .parse()
        .map_err(|e| bad_sequence(SequenceError::from(e)))?;

    Ok(format!("{}{:07}", prefix, number))
}
