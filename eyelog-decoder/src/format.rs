//! Log format description
//!
//! Everything that ties the decoder to one device dialect lives here: the
//! marker patterns, token positions and the field → offset table. A future
//! firmware revision is supported by supplying a different
//! [`FormatDescription`], never by editing the extraction logic.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where a field's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Anchor-relative line, value at the standard position plus any spill-over tokens
    Standard { offset: i64 },
    /// Anchor-relative line with the result layout (single token, different position)
    Result { offset: i64 },
    /// Timestamp of the stimulus-display line
    DisplayTime,
    /// Average pupil diameter in the window before the display line
    PupilBefore,
    /// Average pupil diameter in the window after the display line
    PupilAfter,
}

impl FieldSource {
    /// Anchor-relative offset for line-bound fields
    pub fn offset(&self) -> Option<i64> {
        match self {
            FieldSource::Standard { offset } | FieldSource::Result { offset } => Some(*offset),
            _ => None,
        }
    }

    /// Derived fields are computed around the display line, not read at an offset
    pub fn is_derived(&self) -> bool {
        self.offset().is_none()
    }
}

/// One column of the trial record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, also the record key and CSV header
    pub name: String,
    pub source: FieldSource,
    /// Token that must appear on the target line (defaults to the field name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl FieldSpec {
    pub fn standard(name: impl Into<String>, offset: i64) -> Self {
        Self::new(name, FieldSource::Standard { offset })
    }

    pub fn result(name: impl Into<String>, offset: i64) -> Self {
        Self::new(name, FieldSource::Result { offset })
    }

    pub fn new(name: impl Into<String>, source: FieldSource) -> Self {
        Self {
            name: name.into(),
            source,
            token: None,
        }
    }

    /// Builder method: override the identifying token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Token the extractor expects on the field's line
    pub fn identifying_token(&self) -> &str {
        self.token.as_deref().unwrap_or(&self.name)
    }
}

/// Complete description of one log dialect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescription {
    /// Human-readable dialect name
    pub name: String,
    /// Revision of this description
    pub version: u32,

    /// Literal that opens every trial
    #[serde(default = "default_trial_start_marker")]
    pub trial_start_marker: String,
    /// Pattern of the primary anchor line
    #[serde(default = "default_end_marker")]
    pub end_marker: String,
    /// Pattern of the lost-message report line
    #[serde(default = "default_error_marker")]
    pub error_marker: String,
    /// Pattern of the stimulus-display line
    #[serde(default = "default_display_marker")]
    pub display_marker: String,

    #[serde(default = "default_lost_count_position")]
    pub lost_count_position: usize,
    #[serde(default = "default_display_time_position")]
    pub display_time_position: usize,
    #[serde(default = "default_standard_value_position")]
    pub standard_value_position: usize,
    #[serde(default = "default_result_value_position")]
    pub result_value_position: usize,
    #[serde(default = "default_pupil_area_position")]
    pub pupil_area_position: usize,

    /// Joins tokens that spill past the standard value position
    #[serde(default)]
    pub spill_separator: String,

    /// Canonical field ordering
    pub fields: Vec<FieldSpec>,
}

fn default_trial_start_marker() -> String {
    "START\t".to_string()
}

fn default_end_marker() -> String {
    "END".to_string()
}

fn default_error_marker() -> String {
    "ERROR MESSAGES LOST".to_string()
}

fn default_display_marker() -> String {
    "DRAW_LIST".to_string()
}

fn default_lost_count_position() -> usize {
    5
}

fn default_display_time_position() -> usize {
    1
}

fn default_standard_value_position() -> usize {
    5
}

fn default_result_value_position() -> usize {
    3
}

fn default_pupil_area_position() -> usize {
    3
}

impl FormatDescription {
    /// The EyeLink `.asc` dialect produced by the letter-search experiment
    pub fn eyelink_v1() -> Self {
        let fields = vec![
            FieldSpec::standard("trial", 2),
            FieldSpec::standard("trial_type", 3),
            FieldSpec::standard("practice", 4),
            FieldSpec::standard("image", 5),
            FieldSpec::new("IMG_DISP_TIME", FieldSource::DisplayTime),
            FieldSpec::new("AVG_P_DIAM_BEFORE", FieldSource::PupilBefore),
            FieldSpec::new("AVG_P_DIAM_AFTER", FieldSource::PupilAfter),
            FieldSpec::standard("letter", 6),
            FieldSpec::standard("locationid", 7),
            FieldSpec::standard("location", 8),
            FieldSpec::standard("expected", 9),
            FieldSpec::standard("TRIAL_INDEX", 10),
            FieldSpec::standard("KEYPRESS", 11),
            FieldSpec::standard("RESPONSE", 12),
            FieldSpec::standard("RT", 13),
            FieldSpec::standard("DISPLAY_ON_TIME", 14),
            FieldSpec::standard("KEY_RESPONSE_TIME", 15),
            FieldSpec::standard("soa", 16),
            FieldSpec::standard("SACCADE_RT", 17),
            FieldSpec::result("TRIAL_RESULT", 18),
        ];

        Self {
            name: "eyelink-asc".to_string(),
            version: 1,
            trial_start_marker: default_trial_start_marker(),
            end_marker: default_end_marker(),
            error_marker: default_error_marker(),
            display_marker: default_display_marker(),
            lost_count_position: default_lost_count_position(),
            display_time_position: default_display_time_position(),
            standard_value_position: default_standard_value_position(),
            result_value_position: default_result_value_position(),
            pupil_area_position: default_pupil_area_position(),
            spill_separator: String::new(),
            fields,
        }
    }

    /// Check the description is usable before any trial is decoded
    pub fn validate(&self) -> Result<()> {
        let markers = [
            ("trial_start_marker", &self.trial_start_marker),
            ("end_marker", &self.end_marker),
            ("error_marker", &self.error_marker),
            ("display_marker", &self.display_marker),
        ];
        for (key, marker) in markers {
            if marker.is_empty() {
                return Err(DecoderError::InvalidFormat(format!("{} must not be empty", key)));
            }
        }

        if self.fields.is_empty() {
            return Err(DecoderError::InvalidFormat("no fields declared".to_string()));
        }

        let mut names = HashSet::new();
        let mut derived = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(DecoderError::InvalidFormat("field with empty name".to_string()));
            }
            if !names.insert(field.name.as_str()) {
                return Err(DecoderError::InvalidFormat(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
            if field.source.is_derived() && !derived.insert(field.source) {
                return Err(DecoderError::InvalidFormat(format!(
                    "derived source {:?} declared more than once",
                    field.source
                )));
            }
        }

        Ok(())
    }

    /// Field names in canonical order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

impl Default for FormatDescription {
    fn default() -> Self {
        Self::eyelink_v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_valid() {
        let format = FormatDescription::default();
        assert!(format.validate().is_ok());
        assert_eq!(format.fields.len(), 20);
        assert_eq!(format.field_names().last(), Some("TRIAL_RESULT"));
    }

    #[test]
    fn test_default_header_row() {
        let binding = FormatDescription::eyelink_v1();
        let names: Vec<&str> = binding.field_names().collect();
        assert_eq!(
            names,
            [
                "trial",
                "trial_type",
                "practice",
                "image",
                "IMG_DISP_TIME",
                "AVG_P_DIAM_BEFORE",
                "AVG_P_DIAM_AFTER",
                "letter",
                "locationid",
                "location",
                "expected",
                "TRIAL_INDEX",
                "KEYPRESS",
                "RESPONSE",
                "RT",
                "DISPLAY_ON_TIME",
                "KEY_RESPONSE_TIME",
                "soa",
                "SACCADE_RT",
                "TRIAL_RESULT",
            ]
        );
    }

    #[test]
    fn test_identifying_token_defaults_to_name() {
        let plain = FieldSpec::standard("RT", 13);
        assert_eq!(plain.identifying_token(), "RT");

        let renamed = FieldSpec::standard("reaction_time", 13).with_token("RT");
        assert_eq!(renamed.identifying_token(), "RT");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut format = FormatDescription::default();
        format.fields.push(FieldSpec::standard("trial", 40));
        assert!(matches!(format.validate(), Err(DecoderError::InvalidFormat(_))));
    }

    #[test]
    fn test_duplicate_derived_source_rejected() {
        let mut format = FormatDescription::default();
        format
            .fields
            .push(FieldSpec::new("SECOND_DISPLAY", FieldSource::DisplayTime));
        assert!(format.validate().is_err());
    }

    #[test]
    fn test_empty_marker_rejected() {
        let mut format = FormatDescription::default();
        format.end_marker.clear();
        assert!(format.validate().is_err());
    }

    #[test]
    fn test_source_offsets() {
        assert_eq!(FieldSource::Standard { offset: -2 }.offset(), Some(-2));
        assert_eq!(FieldSource::Result { offset: 18 }.offset(), Some(18));
        assert!(FieldSource::PupilAfter.is_derived());
    }
}
