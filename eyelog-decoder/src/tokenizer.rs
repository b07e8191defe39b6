//! Trial tokenizer
//!
//! Cuts the raw log on every start marker, drops the pre-trial header and
//! splits each remaining segment into lines and whitespace-delimited tokens.
//! No trial-level validation happens here; malformed trials surface later in
//! the assembler.

use crate::types::{Line, Trial};
use std::str::Split;

/// Split raw log text into a lazy sequence of trials
pub fn split_trials<'a>(raw: &'a str, start_marker: &'a str) -> TrialSplitter<'a> {
    if start_marker.is_empty() {
        return TrialSplitter {
            segments: None,
            marker_newlines: 0,
            next_ordinal: 1,
            next_line: 1,
        };
    }

    let mut segments = raw.split(start_marker);
    // Everything before the first marker is the recording header
    let header = segments.next().unwrap_or("");

    TrialSplitter {
        segments: Some(segments),
        marker_newlines: count_newlines(start_marker),
        next_ordinal: 1,
        next_line: 1 + count_newlines(header),
    }
}

/// Split text into lines on `\n`, `\r\n` or a lone `\r`
///
/// A trailing terminator does not produce an empty final line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text).filter(|t| !t.is_empty());
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(end) => {
                let width = if current[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[end + width..]).filter(|t| !t.is_empty());
                Some(&current[..end])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Number of line terminators in `text`, counting `\r\n` once
fn count_newlines(text: &str) -> usize {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(i, b)| match b {
            b'\n' => true,
            b'\r' => bytes.get(i + 1) != Some(&b'\n'),
            _ => false,
        })
        .count()
}

/// Iterator over the trials of a log, in log order
pub struct TrialSplitter<'a> {
    segments: Option<Split<'a, &'a str>>,
    marker_newlines: usize,
    next_ordinal: usize,
    next_line: usize,
}

impl<'a> Iterator for TrialSplitter<'a> {
    type Item = Trial<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.segments.as_mut()?.next()?;

        let lines: Vec<Line<'a>> = split_lines(segment).map(Line::new).collect();
        let trial = Trial::new(self.next_ordinal, self.next_line, lines);

        log::trace!(
            "Tokenized trial {} ({} lines, log line {})",
            trial.ordinal,
            trial.len(),
            trial.start_line
        );

        self.next_ordinal += 1;
        self.next_line += count_newlines(segment) + self.marker_newlines;
        Some(trial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_discarded() {
        let raw = "** CONVERTED FROM x.edf\n** DATE: today\nSTART\t100 LEFT\nMSG 101 hi\n";
        let trials: Vec<_> = split_trials(raw, "START\t").collect();
        assert_eq!(trials.len(), 1);
        assert_eq!(trials[0].lines[0].tokens(), &["100", "LEFT"]);
        assert_eq!(trials[0].lines[1].tokens(), &["MSG", "101", "hi"]);
    }

    #[test]
    fn test_trials_split_on_every_marker() {
        let raw = "START\t1\na b\nSTART\t2\nc d\ne f\nSTART\t3";
        let trials: Vec<_> = split_trials(raw, "START\t").collect();
        assert_eq!(trials.len(), 3);
        assert_eq!(trials.iter().map(|t| t.ordinal).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(trials[1].len(), 3);
        assert_eq!(trials[2].len(), 1);
    }

    #[test]
    fn test_start_lines_track_raw_log() {
        let raw = "header\nmore header\nSTART\t1\nx\nSTART\t2\r\ny\r\nz\r\nSTART\t3\n";
        let trials: Vec<_> = split_trials(raw, "START\t").collect();
        assert_eq!(trials[0].start_line, 3);
        assert_eq!(trials[1].start_line, 5);
        assert_eq!(trials[2].start_line, 8);
        assert_eq!(trials[1].log_line_number(2), 7);
    }

    #[test]
    fn test_crlf_lines() {
        let raw = "START\t1\r\nMSG 2 x\r\n";
        let trial = split_trials(raw, "START\t").next().unwrap();
        assert_eq!(trial.len(), 2);
        assert_eq!(trial.lines[1].tokens(), &["MSG", "2", "x"]);
    }

    #[test]
    fn test_bare_cr_lines() {
        let raw = "header\rSTART\t1\r1001 1 1 100.0\rEND 2\rSTART\t2\rEND 3\r";
        let trials: Vec<_> = split_trials(raw, "START\t").collect();

        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].len(), 3);
        assert_eq!(trials[0].lines[1].tokens(), &["1001", "1", "1", "100.0"]);
        assert_eq!(trials[0].lines[2].tokens(), &["END", "2"]);
        assert_eq!(trials[0].start_line, 2);
        assert_eq!(trials[1].start_line, 5);
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let lines: Vec<_> = split_lines("a\n\nb\r\n\r\nc\n").collect();
        assert_eq!(lines, vec!["a", "", "b", "", "c"]);
        assert_eq!(split_lines("").count(), 0);
    }

    #[test]
    fn test_no_marker_means_no_trials() {
        assert_eq!(split_trials("just a header\n", "START\t").count(), 0);
        assert_eq!(split_trials("START\tx", "").count(), 0);
        assert_eq!(split_trials("", "START\t").count(), 0);
    }

    #[test]
    fn test_marker_needs_exact_literal() {
        // "START " with a space is not the tab-terminated marker
        let raw = "START 1\nSTART\t2\n";
        let trials: Vec<_> = split_trials(raw, "START\t").collect();
        assert_eq!(trials.len(), 1);
        assert_eq!(trials[0].start_line, 2);
    }
}
