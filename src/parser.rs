// Line Parser Framework
// Turns one feed line into a LineOutcome; runs inside a spawned task per line

use crate::error::LineDefect;
use crate::identifier::CompositeKey;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

// ============================================================================
// CORE TYPES
// ============================================================================

/// LineOutcome - What a single feed line contributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Eligible line, carrying its canonical identifier
    Match(String),

    /// Well-formed key for another jurisdiction
    Foreign,

    /// Line excluded because of a defect
    Defect(LineDefect),
}

impl LineOutcome {
    /// Identifier, if the line matched
    pub fn identifier(&self) -> Option<&str> {
        match self {
            LineOutcome::Match(id) => Some(id),
            _ => None,
        }
    }
}

/// LineParser - Core trait for per-line parsing
///
/// Implementations must be cheap to share across tasks: the extractor wraps
/// one instance in an `Arc` and hands a clone to every dispatched line.
pub trait LineParser: Send + Sync + 'static {
    /// Parse one raw line (without its trailing newline)
    fn parse_line(&self, line: &str) -> LineOutcome;
}

// ============================================================================
// COMPOSITE KEY PARSER
// ============================================================================

/// Default parser: first CSV field is a composite key, filter by jurisdiction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeKeyParser {
    jurisdiction: String,
}

impl CompositeKeyParser {
    pub fn new(jurisdiction: impl Into<String>) -> Self {
        CompositeKeyParser {
            jurisdiction: jurisdiction.into(),
        }
    }

    /// Jurisdiction code this parser accepts
    pub fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }
}

impl LineParser for CompositeKeyParser {
    fn parse_line(&self, line: &str) -> LineOutcome {
        let field = match first_field(line) {
            Ok(field) => field,
            Err(defect) => return LineOutcome::Defect(defect),
        };

        let key = match CompositeKey::parse(&field) {
            Ok(key) => key,
            Err(defect) => return LineOutcome::Defect(defect),
        };

        if key.jurisdiction != self.jurisdiction {
            return LineOutcome::Foreign;
        }

        match key.canonical_id() {
            Ok(id) => LineOutcome::Match(id),
            Err(defect) => LineOutcome::Defect(defect),
        }
    }
}

/// Decode one raw line, dropping its `\n` or `\r\n` terminator
///
/// Only the first field has to be valid UTF-8. Invalid bytes further along
/// (titles, assignees) are replaced with U+FFFD.
pub fn decode_line(raw: &[u8]) -> Result<Cow<'_, str>, LineDefect> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    match std::str::from_utf8(raw) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(e) if raw[..e.valid_up_to()].contains(&b',') => Ok(String::from_utf8_lossy(raw)),
        Err(e) => Err(LineDefect::NotUtf8 {
            offset: e.valid_up_to(),
        }),
    }
}

/// First comma-delimited field of a line
///
/// Unquoted fields are sliced directly. A quoted first field goes through the
/// csv reader so embedded commas and doubled quotes decode properly.
pub fn first_field(line: &str) -> Result<Cow<'_, str>, LineDefect> {
    if !line.starts_with('"') {
        let field = line.split(',').next().unwrap_or("");
        return Ok(Cow::Borrowed(field));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(Cow::Owned(record.get(0).unwrap_or("").to_string())),
        Ok(false) => Ok(Cow::Borrowed("")),
        Err(e) => Err(LineDefect::Unreadable {
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us() -> CompositeKeyParser {
        CompositeKeyParser::new("US")
    }

    #[test]
    fn test_first_field_plain() {
        let field = first_field("US-7650331-B1,Title,Assignee").unwrap();
        assert_eq!(field, "US-7650331-B1");
    }

    #[test]
    fn test_first_field_without_comma() {
        assert_eq!(first_field("US-7650331-B1").unwrap(), "US-7650331-B1");
        assert_eq!(first_field("").unwrap(), "");
    }

    #[test]
    fn test_first_field_quoted() {
        let field = first_field("\"US-7650331-B1\",\"A, quoted title\"").unwrap();
        assert_eq!(field, "US-7650331-B1");
    }

    #[test]
    fn test_first_field_quoted_with_comma() {
        let field = first_field("\"a,b\",c").unwrap();
        assert_eq!(field, "a,b");
    }

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"US-7650331-B1,a\n").unwrap(), "US-7650331-B1,a");
        assert_eq!(decode_line(b"US-7650331-B1,a\r\n").unwrap(), "US-7650331-B1,a");
        assert_eq!(decode_line(b"last line").unwrap(), "last line");
        assert_eq!(decode_line(b"\n").unwrap(), "");
    }

    #[test]
    fn test_decode_line_replaces_invalid_bytes_after_first_field() {
        let text = decode_line(b"EP-1234567-A1,Caf\xe9 machine\n").unwrap();
        assert_eq!(text, "EP-1234567-A1,Caf\u{FFFD} machine");
    }

    #[test]
    fn test_decode_line_invalid_key_is_defect() {
        let result = decode_line(b"US-\xff123-B2,title\n");
        assert_eq!(result, Err(LineDefect::NotUtf8 { offset: 3 }));
    }

    #[test]
    fn test_parse_matching_grant() {
        let outcome = us().parse_line("US-7650331-B1,System and method,Acme Corp");
        assert_eq!(outcome, LineOutcome::Match("7650331".to_string()));
        assert_eq!(outcome.identifier(), Some("7650331"));
    }

    #[test]
    fn test_parse_matching_publication_is_normalized() {
        let outcome = us().parse_line("US-2012123456-A1,Widget,Acme Corp");
        assert_eq!(outcome, LineOutcome::Match("20120123456".to_string()));
    }

    #[test]
    fn test_parse_quoted_key() {
        let outcome = us().parse_line("\"US-7650331-B1\",\"System, and method\"");
        assert_eq!(outcome, LineOutcome::Match("7650331".to_string()));
    }

    #[test]
    fn test_parse_foreign_jurisdiction() {
        let outcome = us().parse_line("EP-1234567-A1,Widget,Acme GmbH");
        assert_eq!(outcome, LineOutcome::Foreign);
        assert_eq!(outcome.identifier(), None);
    }

    #[test]
    fn test_jurisdiction_is_case_sensitive() {
        assert_eq!(us().parse_line("us-7650331-B1,x"), LineOutcome::Foreign);
    }

    #[test]
    fn test_parse_two_part_key_is_defect() {
        let outcome = us().parse_line("US-7650331,Widget");
        assert!(matches!(
            outcome,
            LineOutcome::Defect(LineDefect::MalformedKey { parts: 2, .. })
        ));
    }

    #[test]
    fn test_parse_header_line_is_defect() {
        let outcome = us().parse_line("id,title,assignee,inventor/author");
        assert!(matches!(outcome, LineOutcome::Defect(LineDefect::MalformedKey { .. })));
    }

    #[test]
    fn test_parse_empty_line_is_defect() {
        assert!(matches!(us().parse_line(""), LineOutcome::Defect(_)));
    }

    #[test]
    fn test_parse_bad_sequence_is_defect() {
        let outcome = us().parse_line("US-2012X23456-A1,Widget");
        assert!(matches!(outcome, LineOutcome::Defect(LineDefect::BadSequence { .. })));
    }

    #[test]
    fn test_foreign_line_with_bad_payload_is_not_a_defect() {
        // Payload is only normalized for the requested jurisdiction
        assert_eq!(us().parse_line("EP-2012X23456-A1,x"), LineOutcome::Foreign);
    }

    #[test]
    fn test_parser_jurisdiction_accessor() {
        assert_eq!(CompositeKeyParser::new("JP").jurisdiction(), "JP");
    }
}
