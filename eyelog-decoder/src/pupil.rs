//! Pupil diameter sampling
//!
//! Averages the pupil diameter over a fixed number of sample lines on one side
//! of a reference line (the stimulus display). The tracker reports pupil
//! *area*; each sample is converted to the diameter of a circle of that area.
//!
//! Zero-area samples are sensor dropouts: they are left out of the average but
//! still use up a slot of the window, so the window always covers the same
//! number of sample ticks.

use crate::format::FormatDescription;
use crate::types::{MalformedReason, NumericToken, Trial};
use std::f64::consts::PI;

/// Line 0 of a trial carries the rest of the start-marker line, never samples
const FIRST_SAMPLE_LINE: usize = 1;

/// Side of the reference line to sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

/// Diameter of a circle with the given area
pub fn area_to_diameter(area: f64) -> f64 {
    2.0 * (area / PI).sqrt()
}

/// Windowed pupil-diameter averaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PupilSampler {
    window_size: usize,
    area_position: usize,
}

impl PupilSampler {
    pub fn new(window_size: usize, area_position: usize) -> Self {
        Self {
            window_size,
            area_position,
        }
    }

    pub fn from_format(format: &FormatDescription, window_size: usize) -> Self {
        Self::new(window_size, format.pupil_area_position)
    }

    /// Average diameter over the window next to `reference`
    ///
    /// Returns `Ok(None)` if the trial runs out of sample lines before the
    /// window is full, or if every sample in the window was a dropout.
    pub fn sample_window(
        &self,
        trial: &Trial<'_>,
        reference: usize,
        direction: Direction,
    ) -> Result<Option<f64>, MalformedReason> {
        let mut window = Window::new(self.window_size);

        match direction {
            Direction::Before => {
                let end = reference.min(trial.len());
                for index in (FIRST_SAMPLE_LINE..end).rev() {
                    if window.is_full() {
                        break;
                    }
                    self.consider(trial, index, &mut window)?;
                }
            }
            Direction::After => {
                let start = reference.saturating_add(1).max(FIRST_SAMPLE_LINE);
                for index in start..trial.len() {
                    if window.is_full() {
                        break;
                    }
                    self.consider(trial, index, &mut window)?;
                }
            }
        }

        if !window.is_full() {
            log::debug!(
                "Trial {}: pupil window {:?} line {} underrun ({} of {} samples)",
                trial.ordinal,
                direction,
                reference,
                window.considered,
                self.window_size
            );
        }
        Ok(window.average())
    }

    /// Feed line `index` into the window if it is a sample line
    fn consider(
        &self,
        trial: &Trial<'_>,
        index: usize,
        window: &mut Window,
    ) -> Result<(), MalformedReason> {
        let line = &trial.lines[index];
        if !line.is_sample() {
            return Ok(());
        }

        let token = line
            .token(self.area_position)
            .ok_or(MalformedReason::MissingNumber {
                kind: NumericToken::PupilArea,
                line: index,
            })?;

        let area = token
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite() && *a >= 0.0)
            .ok_or_else(|| MalformedReason::InvalidNumber {
                kind: NumericToken::PupilArea,
                line: index,
                token: token.to_string(),
            })?;

        window.push(area);
        Ok(())
    }
}

/// Running state of one sampling window
struct Window {
    quota: usize,
    considered: usize,
    included: usize,
    mean: f64,
}

impl Window {
    fn new(quota: usize) -> Self {
        Self {
            quota,
            considered: 0,
            included: 0,
            mean: 0.0,
        }
    }

    fn is_full(&self) -> bool {
        self.considered >= self.quota
    }

    fn push(&mut self, area: f64) {
        self.considered += 1;
        if area == 0.0 {
            return;
        }
        self.included += 1;
        // Running mean stays exact when every sample is identical
        let diameter = area_to_diameter(area);
        self.mean += (diameter - self.mean) / self.included as f64;
    }

    fn average(&self) -> Option<f64> {
        if self.is_full() && self.included > 0 {
            Some(self.mean)
        } else {
            None
        }
    }
}
