//! Run summary
//!
//! Collects per-file outcomes and renders a plain-text summary at the end of a run.

use chrono::{DateTime, Local};
use eyelog_decoder::{DecodeReport, RejectedTrial};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one input file
#[derive(Debug)]
pub struct FileSummary {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub trials_found: usize,
    pub assembled: usize,
    pub rejected: Vec<RejectedTrial>,
    pub error: Option<String>,
}

impl FileSummary {
    pub fn decoded(input: PathBuf, output: PathBuf, report: &DecodeReport) -> Self {
        Self {
            input,
            output: Some(output),
            trials_found: report.trials_found(),
            assembled: report.assembled(),
            rejected: report.rejected.clone(),
            error: None,
        }
    }

    pub fn failed(input: PathBuf, error: &anyhow::Error) -> Self {
        Self {
            input,
            output: None,
            trials_found: 0,
            assembled: 0,
            rejected: Vec::new(),
            error: Some(format!("{:#}", error)),
        }
    }
}

/// Summary of a whole run across all input files
#[derive(Debug)]
pub struct RunReport {
    started: DateTime<Local>,
    files: Vec<FileSummary>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started: Local::now(),
            files: Vec::new(),
        }
    }

    pub fn push(&mut self, summary: FileSummary) {
        self.files.push(summary);
    }

    pub fn files(&self) -> &[FileSummary] {
        &self.files
    }

    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    pub fn total_assembled(&self) -> usize {
        self.files.iter().map(|f| f.assembled).sum()
    }

    /// Rejections across all files, counted per malformation kind
    pub fn rejections_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for rejected in self.files.iter().flat_map(|f| &f.rejected) {
            *counts.entry(rejected.reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = Local::now().signed_duration_since(self.started);

        writeln!(f, "Run started {}", self.started.format("%Y-%m-%d %H:%M:%S"))?;
        for file in &self.files {
            writeln!(f, "\n{}", file.input.display())?;
            if let Some(error) = &file.error {
                writeln!(f, "  failed: {}", error)?;
                continue;
            }
            writeln!(
                f,
                "  trials: {} found, {} assembled, {} skipped",
                file.trials_found,
                file.assembled,
                file.rejected.len()
            )?;
            if let Some(output) = &file.output {
                writeln!(f, "  output: {}", output.display())?;
            }
            for rejected in &file.rejected {
                writeln!(f, "  - {}", rejected)?;
            }
        }

        let by_kind = self.rejections_by_kind();
        if !by_kind.is_empty() {
            writeln!(f, "\nRejections by kind:")?;
            for (kind, count) in &by_kind {
                writeln!(f, "  {:<20} {}", kind, count)?;
            }
        }

        writeln!(
            f,
            "\n{} file(s), {} failed, {} records in {}.{:03}s",
            self.files.len(),
            self.failed_files(),
            self.total_assembled(),
            elapsed.num_seconds(),
            elapsed.num_milliseconds() % 1000
        )
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
