//! Cross-stream event report
//!
//! Renders the correlated-events panel: entries sorted by time with severity
//! labels, active highlighting, and summary statistics.

use serde::Serialize;
use std::fmt::Write as FmtWrite;
use std::path::Path;

use super::timeline::{format_time, Severity};
use super::{CorrelatedEvent, EventType, Result, StreamId};

const EMPTY_MESSAGE: &str = "No cross-stream events detected yet. Events will appear when \
                             similar activities occur across multiple streams.";

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// JSON (machine-readable)
    Json,
    /// Markdown
    Markdown,
    /// Plain text panel
    #[default]
    Text,
}

/// One correlated event as shown in the panel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub id: String,
    pub timestamp: f64,
    pub time_label: String,
    pub streams: [StreamId; 2],
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub description: String,
    pub time_diff: f64,
    pub severity: Severity,
    pub active: bool,
}

/// Correlated-events panel at one playback position
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossStreamReport {
    pub current_time: f64,
    pub total: usize,
    /// Entries with a time difference under one second
    pub simultaneous: usize,
    pub entries: Vec<ReportEntry>,
}

impl CrossStreamReport {
    /// Build the panel; `events` need not be sorted.
    #[must_use]
    pub fn new(events: &[CorrelatedEvent], current_time: f64, active_window: f64) -> Self {
        let mut entries: Vec<ReportEntry> = events
            .iter()
            .map(|c| ReportEntry {
                id: c.id.clone(),
                timestamp: c.timestamp,
                time_label: format_time(c.timestamp),
                streams: c.streams,
                event_type: c.event_type.clone(),
                description: c.description.clone(),
                time_diff: c.time_diff,
                severity: Severity::from_time_diff(c.time_diff),
                active: (c.timestamp - current_time).abs() < active_window,
            })
            .collect();
        entries.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        let simultaneous = entries
            .iter()
            .filter(|e| e.severity == Severity::Simultaneous)
            .count();

        Self {
            current_time,
            total: entries.len(),
            simultaneous,
            entries,
        }
    }

    /// Generate report in specified format
    pub fn generate(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ReportFormat::Markdown => self.to_markdown(),
            ReportFormat::Text => self.to_text(),
        }
    }

    /// Save report to file
    pub fn save(&self, format: ReportFormat, path: &Path) -> Result<()> {
        let content = self.generate(format)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn to_markdown(&self) -> Result<String> {
        let mut md = String::new();

        writeln!(md, "# Cross-Stream Events\n")?;
        writeln!(md, "Correlated events detected across multiple streams.\n")?;

        if self.entries.is_empty() {
            writeln!(md, "_{EMPTY_MESSAGE}_")?;
            return Ok(md);
        }

        writeln!(md, "| Time | Severity | Type | Streams | Δt | Active |")?;
        writeln!(md, "|------|----------|------|---------|----|--------|")?;
        for e in &self.entries {
            writeln!(
                md,
                "| {} | {} | {} | {}, {} | {:.1}s | {} |",
                e.time_label,
                e.severity.label(),
                e.event_type,
                e.streams[0],
                e.streams[1],
                e.time_diff,
                if e.active { "yes" } else { "" }
            )?;
        }

        writeln!(md, "\n## Summary\n")?;
        writeln!(md, "- **Total Events**: {}", self.total)?;
        writeln!(md, "- **Simultaneous**: {}", self.simultaneous)?;

        Ok(md)
    }

    fn to_text(&self) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "Cross-Stream Events")?;
        if self.entries.is_empty() {
            writeln!(out, "{EMPTY_MESSAGE}")?;
            return Ok(out);
        }

        for e in &self.entries {
            let marker = if e.active { '>' } else { ' ' };
            writeln!(
                out,
                "{marker} [{}] {}  {}",
                e.severity.label(),
                e.time_label,
                e.event_type
            )?;
            writeln!(out, "    {}", e.description)?;
            writeln!(out, "    Streams: {}, {}", e.streams[0], e.streams[1])?;
            if e.time_diff > 0.0 {
                writeln!(out, "    Time difference: {:.1}s", e.time_diff)?;
            }
            if !e.active {
                writeln!(out, "    Jump to Event: {:.2}s", e.timestamp)?;
            }
        }

        writeln!(out)?;
        writeln!(
            out,
            "Total Events: {}   Simultaneous: {}",
            self.total, self.simultaneous
        )?;

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{Correlator, Event};

    fn sample() -> Vec<CorrelatedEvent> {
        let a = vec![
            Event::new("a1", 30.0, "vehicle", "", 0.9),
            Event::new("a2", 5.0, "motion", "", 0.9),
        ];
        let b = vec![
            Event::new("b1", 32.5, "vehicle", "", 0.9),
            Event::new("b2", 5.5, "motion", "", 0.9),
        ];
        Correlator::new().correlate([(StreamId(1), &a[..]), (StreamId(3), &b[..])])
    }

    #[test]
    fn entries_sorted_with_severity_and_stats() {
        let report = CrossStreamReport::new(&sample(), 6.0, 2.0);

        assert_eq!(report.total, 2);
        assert_eq!(report.simultaneous, 1);
        assert_eq!(report.entries[0].timestamp, 5.25);
        assert_eq!(report.entries[0].severity, Severity::Simultaneous);
        assert!(report.entries[0].active);
        assert_eq!(report.entries[1].severity, Severity::Related);
        assert!(!report.entries[1].active);
    }

    #[test]
    fn text_report_lists_jump_targets_for_inactive_entries() {
        let report = CrossStreamReport::new(&sample(), 6.0, 2.0);
        let text = report.generate(ReportFormat::Text).unwrap();

        assert!(text.contains("> [Simultaneous] 00:05  motion"));
        assert!(text.contains("[Related] 00:31  vehicle"));
        assert!(text.contains("Time difference: 2.5s"));
        assert!(text.contains("Jump to Event: 31.25s"));
        assert!(text.contains("Total Events: 2   Simultaneous: 1"));
    }

    #[test]
    fn markdown_and_json_formats() {
        let report = CrossStreamReport::new(&sample(), 0.0, 2.0);

        let md = report.generate(ReportFormat::Markdown).unwrap();
        assert!(md.contains("| 00:05 | Simultaneous | motion | 1, 3 | 0.5s |  |"));

        let json = report.generate(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entries"][0]["type"], "motion");
        assert_eq!(value["entries"][0]["timeDiff"], 0.5);
        assert_eq!(value["entries"][0]["streams"], serde_json::json!([1, 3]));
    }

    #[test]
    fn empty_report_explains_itself() {
        let report = CrossStreamReport::new(&[], 0.0, 2.0);
        let text = report.generate(ReportFormat::Text).unwrap();
        assert!(text.contains("No cross-stream events detected yet"));
        assert_eq!(report.simultaneous, 0);
    }
}
