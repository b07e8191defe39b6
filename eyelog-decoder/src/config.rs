//! Decoder configuration types
//!
//! This module defines the minimal run-time configuration needed by the
//! decoder library. The dialect itself (markers, offsets, token positions) is
//! described separately by [`crate::format::FormatDescription`].

use serde::{Deserialize, Serialize};

/// What to do when a trial turns out to be malformed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole run on the first malformed trial
    FailFast,
    /// Drop the malformed trial, remember why, keep going
    #[default]
    SkipAndContinue,
}

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Number of sample lines averaged on each side of the display line
    #[serde(default = "default_pupil_window")]
    pub pupil_window: usize,

    /// Handling of malformed trials
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_pupil_window() -> usize {
    250
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            pupil_window: default_pupil_window(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the pupil sampling window size
    pub fn with_pupil_window(mut self, window: usize) -> Self {
        self.pupil_window = window;
        self
    }

    /// Builder method: set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn is_fail_fast(&self) -> bool {
        self.failure_policy == FailurePolicy::FailFast
    }
}
