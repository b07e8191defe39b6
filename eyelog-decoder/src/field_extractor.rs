//! Field Extraction Engine
//!
//! Reads named trial fields from lines located at a fixed offset relative to
//! the trial's anchor line. Handles the two column layouts of the dialect and
//! values that spill over into extra whitespace-separated tokens.

use crate::format::{FieldSource, FieldSpec, FormatDescription};
use crate::types::{Line, MalformedReason, Trial};

/// Field extractor - reads anchor-relative field values from a trial
pub struct FieldExtractor;

impl FieldExtractor {
    /// Extract one field's value
    ///
    /// # Arguments
    /// * `trial` - Tokenized trial
    /// * `anchor` - Index of the primary anchor line in the trial
    /// * `field` - Field definition from the format description
    /// * `format` - Format description providing the token positions
    ///
    /// # Returns
    /// * `Ok(Some(value))` if the field was found on its line
    /// * `Ok(None)` if the line does not carry the field (recoverable miss),
    ///   or the field is not line-bound
    /// * `Err(_)` if the offset points outside the trial (malformed trial)
    pub fn extract(
        trial: &Trial<'_>,
        anchor: usize,
        field: &FieldSpec,
        format: &FormatDescription,
    ) -> Result<Option<String>, MalformedReason> {
        let Some(offset) = field.source.offset() else {
            return Ok(None);
        };

        let (index, line) = Self::target_line(trial, anchor, offset, &field.name)?;

        // Offset drift guard: never read a value off a line that is not this field's
        if !line.has_token(field.identifying_token()) {
            log::warn!(
                "Trial {}: field '{}' not found at anchor{:+} (log line {}), leaving it missing",
                trial.ordinal,
                field.name,
                offset,
                trial.log_line_number(index)
            );
            return Ok(None);
        }

        let value = match field.source {
            FieldSource::Result { .. } => line
                .token(format.result_value_position)
                .map(str::to_string),
            _ => Self::standard_value(
                line,
                format.standard_value_position,
                &format.spill_separator,
            ),
        };

        if value.is_none() {
            log::warn!(
                "Trial {}: line for field '{}' has no value token (log line {})",
                trial.ordinal,
                field.name,
                trial.log_line_number(index)
            );
        }
        Ok(value)
    }

    /// Resolve `anchor + offset` to a line of the trial
    fn target_line<'t, 'a>(
        trial: &'t Trial<'a>,
        anchor: usize,
        offset: i64,
        field: &str,
    ) -> Result<(usize, &'t Line<'a>), MalformedReason> {
        // Saturates on extreme offsets; the result is then out of range anyway
        let target = i64::try_from(anchor)
            .unwrap_or(i64::MAX)
            .saturating_add(offset);
        usize::try_from(target)
            .ok()
            .and_then(|index| trial.line(index).map(|line| (index, line)))
            .ok_or_else(|| MalformedReason::OffsetOutOfRange {
                field: field.to_string(),
                target,
                lines: trial.len(),
            })
    }

    /// Token at `position` with any trailing tokens appended
    fn standard_value(line: &Line<'_>, position: usize, separator: &str) -> Option<String> {
        match line.tokens().get(position..) {
            Some(rest) if !rest.is_empty() => Some(rest.join(separator)),
            _ => None,
        }
    }
}
