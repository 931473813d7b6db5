//! Per-resource creation timing and the markdown report.
//!
//! Successful attempts accumulate in completion order; `render` produces the
//! report table with durations to two decimals. Single-threaded accumulation
//! only.

use crate::provision::fallback::{AttemptOutcome, ProvisioningAttempt};

pub struct TimingRecorder {
    title: String,
    notes: Vec<(String, String)>,
    rows: Vec<TimingRow>,
}

struct TimingRow {
    instance_name: String,
    zone: String,
    duration_secs: f64,
}

impl TimingRecorder {
    pub fn new(title: impl Into<String>) -> Self {
        TimingRecorder {
            title: title.into(),
            notes: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Adds a preamble line (e.g. base instance, snapshot name).
    pub fn note(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.notes.push((key.into(), value.into()));
    }

    /// Records a successful attempt; failed attempts are not part of the
    /// report (they live in the audit trail).
    pub fn record(&mut self, attempt: &ProvisioningAttempt) {
        if let AttemptOutcome::Succeeded { duration_secs } = attempt.outcome {
            self.rows.push(TimingRow {
                instance_name: attempt.instance_name.clone(),
                zone: attempt.zone.clone(),
                duration_secs,
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the markdown report document.
    pub fn render(&self) -> String {
        let mut out = format!("# {}\n\n", self.title);
        for (key, value) in &self.notes {
            out.push_str(&format!("{}: `{}`  \n", key, value));
        }
        if !self.notes.is_empty() {
            out.push('\n');
        }
        out.push_str("| Instance Name | Zone | Time (seconds) |\n");
        out.push_str("|---|---|---:|\n");
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | {:.2} |\n",
                row.instance_name, row.zone, row.duration_secs
            ));
        }
        out
    }
}
