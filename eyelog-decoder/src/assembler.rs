//! Trial assembly
//!
//! Turns one tokenized trial into a [`TrialRecord`]:
//! 1. Find the primary anchor (END line)
//! 2. Classify transmission errors; the last `k` fields are forced missing
//! 3. Extract every remaining line-bound field relative to the anchor
//! 4. Around the display line, read the display time and sample the pupil
//! 5. Emit the record in canonical field order
//!
//! A trial only ever moves forward through [`TrialStage`]s. Any malformed
//! condition rejects it with the last stage it completed.

use crate::config::DecoderConfig;
use crate::field_extractor::FieldExtractor;
use crate::format::{FieldSource, FormatDescription};
use crate::locator::locate;
use crate::lost_messages::detect_lost_messages;
use crate::pupil::{Direction, PupilSampler};
use crate::types::{
    FieldValue, MalformedReason, RecordField, RejectedTrial, Result, Trial, TrialRecord,
    TrialStage,
};

/// Assembles trial records for one format description
pub struct TrialAssembler<'f> {
    format: &'f FormatDescription,
    sampler: PupilSampler,
}

impl<'f> TrialAssembler<'f> {
    pub fn new(format: &'f FormatDescription, config: &DecoderConfig) -> Self {
        Self {
            format,
            sampler: PupilSampler::from_format(format, config.pupil_window),
        }
    }

    /// Assemble the record for `trial`, or reject it as malformed
    pub fn assemble(&self, trial: &Trial<'_>) -> Result<TrialRecord> {
        let mut stage = TrialStage::Tokenized;
        let reject = |stage: TrialStage, reason: MalformedReason| RejectedTrial {
            ordinal: trial.ordinal,
            start_line: trial.start_line,
            reached: stage,
            reason,
        };

        let anchor = locate(trial, &self.format.end_marker).ok_or_else(|| {
            reject(
                stage,
                MalformedReason::AnchorNotFound(self.format.end_marker.clone()),
            )
        })?;
        advance(trial, &mut stage, TrialStage::Anchored);

        let lost = detect_lost_messages(trial, self.format)
            .map_err(|reason| reject(stage, reason))?
            .unwrap_or(0);
        // Fields at or past this index were lost in transit
        let first_forced = self.format.fields.len().saturating_sub(lost);
        advance(trial, &mut stage, TrialStage::ErrorClassified);

        let mut values = vec![FieldValue::Missing; self.format.fields.len()];
        let candidates = self.format.fields.iter().enumerate().take(first_forced);

        for (slot, field) in candidates.clone() {
            if field.source.is_derived() {
                continue;
            }
            let value = FieldExtractor::extract(trial, anchor, field, self.format)
                .map_err(|reason| reject(stage, reason))?;
            values[slot] = value.into();
        }
        advance(trial, &mut stage, TrialStage::FieldsExtracted);

        match locate(trial, &self.format.display_marker) {
            Some(display) => {
                for (slot, field) in candidates {
                    let value: FieldValue = match field.source {
                        FieldSource::DisplayTime => trial.lines[display]
                            .token(self.format.display_time_position)
                            .map(str::to_string)
                            .into(),
                        FieldSource::PupilBefore => self
                            .sampler
                            .sample_window(trial, display, Direction::Before)
                            .map_err(|reason| reject(stage, reason))?
                            .into(),
                        FieldSource::PupilAfter => self
                            .sampler
                            .sample_window(trial, display, Direction::After)
                            .map_err(|reason| reject(stage, reason))?
                            .into(),
                        FieldSource::Standard { .. } | FieldSource::Result { .. } => continue,
                    };
                    values[slot] = value;
                }
            }
            None => log::debug!("Trial {}: no display line", trial.ordinal),
        }
        advance(trial, &mut stage, TrialStage::Sampled);

        let fields = self
            .format
            .fields
            .iter()
            .zip(values)
            .map(|(field, value)| RecordField {
                name: field.name.clone(),
                value,
            })
            .collect();
        let record = TrialRecord::new(trial.ordinal, fields);
        advance(trial, &mut stage, TrialStage::Assembled);

        log::debug!(
            "Trial {} assembled ({} lost, {} missing fields)",
            trial.ordinal,
            lost,
            record.missing_count()
        );
        Ok(record)
    }
}

fn advance(trial: &Trial<'_>, stage: &mut TrialStage, next: TrialStage) {
    log::trace!("Trial {}: {} -> {}", trial.ordinal, stage, next);
    *stage = next;
}
