//! Synthetic `.asc` trials for unit tests

use crate::types::{Line, Trial};

/// Build a trial directly from line texts
pub(crate) fn trial(lines: &[&'static str]) -> Trial<'static> {
    Trial::new(1, 1, lines.iter().copied().map(Line::new).collect())
}

/// Values written by default for the TRIAL_VAR lines, in offset order (2..=17)
pub(crate) const DEFAULT_VALUES: [(&str, &str); 16] = [
    ("trial", "1"),
    ("trial_type", "search"),
    ("practice", "0"),
    ("image", "scene_04.bmp"),
    ("letter", "T"),
    ("locationid", "3"),
    ("location", "upper_left"),
    ("expected", "z"),
    ("TRIAL_INDEX", "7"),
    ("KEYPRESS", "z"),
    ("RESPONSE", "correct"),
    ("RT", "812"),
    ("DISPLAY_ON_TIME", "2001034"),
    ("KEY_RESPONSE_TIME", "2001846"),
    ("soa", "150"),
    ("SACCADE_RT", "233"),
];

/// One well-formed trial in the EyeLink dialect, with knobs to break it
#[derive(Debug, Clone)]
pub(crate) struct TrialFixture {
    pub pre_samples: Vec<f64>,
    pub post_samples: Vec<f64>,
    pub display: bool,
    pub lost: Option<String>,
    pub values: Vec<(String, String)>,
    pub result: String,
    pub end_marker: bool,
    /// Keep only this many lines after the END line
    pub lines_after_end: Option<usize>,
}

impl TrialFixture {
    pub fn new() -> Self {
        Self {
            pre_samples: vec![1500.0; 4],
            post_samples: vec![1600.0; 4],
            display: true,
            lost: None,
            values: DEFAULT_VALUES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            result: "1".to_string(),
            end_marker: true,
            lines_after_end: None,
        }
    }

    pub fn set_value(mut self, name: &str, value: &str) -> Self {
        if let Some(entry) = self.values.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value.to_string();
        }
        self
    }

    /// Trial text starting right after the `START\t` marker
    pub fn render(&self) -> String {
        let mut ts: u64 = 2_001_000;
        let mut tick = || {
            ts += 2;
            ts
        };

        let mut lines = vec![
            format!("{} \tLEFT\tSAMPLES\tEVENTS", tick()),
            format!("MSG\t{} TRIALID 1", tick()),
            "PRESCALER\t1".to_string(),
        ];
        for area in &self.pre_samples {
            lines.push(format!("{}\t  512.3\t  384.1\t {:.1}\t...", tick(), area));
        }
        if self.display {
            lines.push(format!("MSG\t{} -8 !V DRAW_LIST ../graphics/1.vcl", tick()));
        }
        for area in &self.post_samples {
            lines.push(format!("{}\t  515.0\t  380.2\t {:.1}\t...", tick(), area));
        }
        if let Some(lost) = &self.lost {
            lines.push(format!("MSG\t{} ERROR MESSAGES LOST {}", tick(), lost));
        }

        let mut after_end = vec![format!("MSG\t{} !V TRIAL_VAR_LABELS", tick())];
        for (name, value) in &self.values {
            after_end.push(format!("MSG\t{} !V TRIAL_VAR {} {}", tick(), name, value));
        }
        after_end.push(format!("MSG\t{} TRIAL_RESULT {}", tick(), self.result));
        if let Some(keep) = self.lines_after_end {
            after_end.truncate(keep);
        }

        if self.end_marker {
            lines.push(format!("END\t{} \tSAMPLES\tEVENTS\tRES\t38.00\t33.00", tick()));
        }
        lines.extend(after_end);

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

/// A full log: recording header followed by the given trials
pub(crate) fn log_of(fixtures: &[TrialFixture]) -> String {
    let mut log = String::from("** CONVERTED FROM D:\\data\\s01.edf\n** DATE: Tue Mar  3 10:12:44 2015\n");
    for fixture in fixtures {
        log.push_str("START\t");
        log.push_str(&fixture.render());
    }
    log
}
