//! Core types for the eye-tracker log decoder
//!
//! This module defines the tokenized view of a log (lines and trials) and the
//! records the decoder emits for each trial. The decoder is stateless: a trial
//! goes in, a record (or a rejection) comes out.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// One line of a trial, split into whitespace-delimited tokens
///
/// Tokens borrow from the raw log text; a line is immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> Line<'a> {
    /// Tokenize a single line of raw text
    pub fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace().collect(),
        }
    }

    pub fn tokens(&self) -> &[&'a str] {
        &self.tokens
    }

    /// Token at `position`, if the line is long enough
    pub fn token(&self, position: usize) -> Option<&'a str> {
        self.tokens.get(position).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True if one of the tokens is exactly `token`
    pub fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| *t == token)
    }

    /// True if `pattern` occurs in the tokens joined by single spaces
    ///
    /// A multi-word pattern therefore has to appear as a contiguous run of
    /// words, whatever whitespace separated them in the raw log.
    pub fn contains_pattern(&self, pattern: &str) -> bool {
        self.tokens.join(" ").contains(pattern)
    }

    /// Sample lines start with an integer sample timestamp
    pub fn is_sample(&self) -> bool {
        self.tokens
            .first()
            .map_or(false, |t| t.parse::<i64>().is_ok())
    }
}

/// One trial: the lines between two start markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trial<'a> {
    /// 1-based position of the trial in the log
    pub ordinal: usize,
    /// 1-based line number in the raw log where the trial's first line starts
    pub start_line: usize,
    /// Tokenized lines of the trial
    pub lines: Vec<Line<'a>>,
}

impl<'a> Trial<'a> {
    pub fn new(ordinal: usize, start_line: usize, lines: Vec<Line<'a>>) -> Self {
        Self {
            ordinal,
            start_line,
            lines,
        }
    }

    pub fn line(&self, index: usize) -> Option<&Line<'a>> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Raw-log line number of the trial line at `index`
    pub fn log_line_number(&self, index: usize) -> usize {
        self.start_line + index
    }
}

/// Value of one field in a trial record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Literal token text taken from the log
    Text(String),
    /// Derived numeric value (pupil diameters)
    Number(f64),
    /// Field could not be extracted for this trial
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Text)
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Missing, FieldValue::Number)
    }
}

/// Missing values render as an empty string, ready for a tabular cell
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(v) => write!(f, "{}", v),
            FieldValue::Missing => Ok(()),
        }
    }
}

/// A named field inside a trial record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub value: FieldValue,
}

/// Structured output for one trial
///
/// The field list always follows the format's canonical field ordering: every
/// field is present exactly once, only its value may be `Missing`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    ordinal: usize,
    fields: Vec<RecordField>,
}

impl TrialRecord {
    pub fn new(ordinal: usize, fields: Vec<RecordField>) -> Self {
        Self { ordinal, fields }
    }

    /// 1-based position of the source trial in the log
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    /// Look up a field value by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|field| &field.value)
    }

    pub fn missing_count(&self) -> usize {
        self.values().filter(|v| v.is_missing()).count()
    }
}

/// Serializes as a map in canonical field order
impl Serialize for TrialRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}

/// Processing stages a trial moves through, strictly forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrialStage {
    Tokenized,
    Anchored,
    ErrorClassified,
    FieldsExtracted,
    Sampled,
    Assembled,
}

impl fmt::Display for TrialStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialStage::Tokenized => write!(f, "tokenized"),
            TrialStage::Anchored => write!(f, "anchored"),
            TrialStage::ErrorClassified => write!(f, "error-classified"),
            TrialStage::FieldsExtracted => write!(f, "fields-extracted"),
            TrialStage::Sampled => write!(f, "sampled"),
            TrialStage::Assembled => write!(f, "assembled"),
        }
    }
}

/// Numeric tokens whose parse failure rejects a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericToken {
    LostCount,
    PupilArea,
}

impl fmt::Display for NumericToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericToken::LostCount => write!(f, "lost-message count"),
            NumericToken::PupilArea => write!(f, "pupil area"),
        }
    }
}

/// Why a trial is malformed
///
/// Line numbers are trial-relative (0-based).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("no line matches anchor pattern {0:?}")]
    AnchorNotFound(String),

    #[error("field '{field}' resolves to line {target}, outside the trial's {lines} lines")]
    OffsetOutOfRange {
        field: String,
        target: i64,
        lines: usize,
    },

    #[error("missing {kind} token on trial line {line}")]
    MissingNumber { kind: NumericToken, line: usize },

    #[error("invalid {kind} token {token:?} on trial line {line}")]
    InvalidNumber {
        kind: NumericToken,
        line: usize,
        token: String,
    },
}

impl MalformedReason {
    /// Short category used to group rejections in summaries
    pub fn kind(&self) -> &'static str {
        match self {
            MalformedReason::AnchorNotFound(_) => "anchor not found",
            MalformedReason::OffsetOutOfRange { .. } => "offset out of range",
            MalformedReason::MissingNumber { .. } | MalformedReason::InvalidNumber { .. } => {
                "bad numeric token"
            }
        }
    }
}

/// A trial dropped from the output, with where and why it failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("trial {ordinal} (log line {start_line}) rejected after stage {reached}: {reason}")]
pub struct RejectedTrial {
    /// 1-based position of the trial in the log
    pub ordinal: usize,
    /// Raw-log line where the trial starts
    pub start_line: usize,
    /// Last stage the trial completed before failing
    pub reached: TrialStage,
    pub reason: MalformedReason,
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error(transparent)]
    MalformedTrial(#[from] RejectedTrial),

    #[error("Invalid format description: {0}")]
    InvalidFormat(String),

    #[error("Unsupported log file: {0}")]
    UnsupportedFile(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
