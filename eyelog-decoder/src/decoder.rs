//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct holds the format description and configuration and is
//! the entry point for splitting logs into trials and assembling records.

use crate::assembler::TrialAssembler;
use crate::config::{DecoderConfig, FailurePolicy};
use crate::format::FormatDescription;
use crate::tokenizer::{split_trials, TrialSplitter};
use crate::types::{DecoderError, RejectedTrial, Result, Trial, TrialRecord};
use std::path::Path;

/// File extension of the tracker's ASCII trace
pub const LOG_EXTENSION: &str = "asc";

/// The main decoder struct - entry point for all decoding operations
#[derive(Debug, Clone)]
pub struct Decoder {
    format: FormatDescription,
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder for the default EyeLink dialect
    pub fn new() -> Self {
        Self {
            format: FormatDescription::default(),
            config: DecoderConfig::default(),
        }
    }

    /// Create a decoder for a custom format description
    ///
    /// # Returns
    /// * `Err(DecoderError::InvalidFormat)` if the description is unusable
    pub fn with_format(format: FormatDescription, config: DecoderConfig) -> Result<Self> {
        format.validate()?;
        log::debug!(
            "Decoder ready for format '{}' v{} ({} fields)",
            format.name,
            format.version,
            format.fields.len()
        );
        Ok(Self { format, config })
    }

    pub fn format(&self) -> &FormatDescription {
        &self.format
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Split a raw log into its trials, lazily
    pub fn trials<'a>(&'a self, raw: &'a str) -> TrialSplitter<'a> {
        split_trials(raw, &self.format.trial_start_marker)
    }

    /// Assemble one trial into a record
    ///
    /// Trials are independent, so this can be called from several threads at once.
    pub fn assemble(&self, trial: &Trial<'_>) -> Result<TrialRecord> {
        TrialAssembler::new(&self.format, &self.config).assemble(trial)
    }

    /// Iterate over the assembly result of every trial, in log order
    ///
    /// No failure policy is applied here: malformed trials come out as errors.
    pub fn records<'a>(&'a self, raw: &'a str) -> DecodingIterator<'a> {
        DecodingIterator {
            trials: self.trials(raw),
            assembler: TrialAssembler::new(&self.format, &self.config),
        }
    }

    /// Decode a whole log held in memory, applying the failure policy
    ///
    /// # Example
    /// ```no_run
    /// use eyelog_decoder::Decoder;
    ///
    /// let raw = std::fs::read_to_string("s01.asc").unwrap();
    /// let report = Decoder::new().decode_str(&raw).unwrap();
    /// println!("{} of {} trials assembled", report.assembled(), report.trials_found());
    /// ```
    pub fn decode_str(&self, raw: &str) -> Result<DecodeReport> {
        DecodeReport::from_results(self.records(raw), self.config.failure_policy)
    }

    /// Read and decode a `.asc` log file
    pub fn decode_file(&self, path: &Path) -> Result<DecodeReport> {
        log::info!("Decoding log file: {:?}", path);

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        if extension.as_deref() != Some(LOG_EXTENSION) {
            return Err(DecoderError::UnsupportedFile(format!(
                "expected a .{} file, got {:?}",
                LOG_EXTENSION, path
            )));
        }

        let raw = std::fs::read_to_string(path)?;
        let report = self.decode_str(&raw)?;

        log::info!(
            "Decoded {:?}: {} of {} trials assembled",
            path,
            report.assembled(),
            report.trials_found()
        );
        Ok(report)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that assembles trials into records as the log is walked
pub struct DecodingIterator<'a> {
    trials: TrialSplitter<'a>,
    assembler: TrialAssembler<'a>,
}

impl<'a> Iterator for DecodingIterator<'a> {
    type Item = Result<TrialRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let trial = self.trials.next()?;
        Some(self.assembler.assemble(&trial))
    }
}

/// Outcome of decoding one log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeReport {
    /// Assembled records, in log order
    pub records: Vec<TrialRecord>,
    /// Trials dropped under the skip-and-continue policy, in log order
    pub rejected: Vec<RejectedTrial>,
}

impl DecodeReport {
    /// Collect per-trial results under `policy`
    ///
    /// Results must be in log order. With [`FailurePolicy::FailFast`] the first
    /// malformed trial aborts collection and is returned as the error.
    pub fn from_results<I>(results: I, policy: FailurePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = Result<TrialRecord>>,
    {
        let mut report = DecodeReport::default();

        for result in results {
            match result {
                Ok(record) => report.records.push(record),
                Err(DecoderError::MalformedTrial(rejected)) => match policy {
                    FailurePolicy::FailFast => return Err(rejected.into()),
                    FailurePolicy::SkipAndContinue => {
                        log::warn!("Skipping {}", rejected);
                        report.rejected.push(rejected);
                    }
                },
                Err(other) => return Err(other),
            }
        }

        Ok(report)
    }

    pub fn trials_found(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    pub fn assembled(&self) -> usize {
        self.records.len()
    }

    pub fn skipped(&self) -> usize {
        self.rejected.len()
    }
}
