//! Console and JSON presentation of a ranking report

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::RankingReport;
use colored::{Color, Colorize};
use std::path::Path;

pub trait OutputFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Ranked table with colored score bands
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

/// Report generator that coordinates the formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let (prefix, color) = match level {
            1 => ("█", Color::Blue),
            2 => ("▓", Color::Green),
            _ => ("▒", Color::Yellow),
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn score_color(score: f32) -> Color {
        match score {
            s if s >= 0.75 => Color::Green,
            s if s >= 0.5 => Color::BrightGreen,
            s if s >= 0.25 => Color::Yellow,
            s if s > 0.0 => Color::BrightYellow,
            _ => Color::Red,
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("CANDIDATE RANKING", 1));
        output.push_str(&format!(
            "Generated: {} | Model: {} | Processing time: {}ms\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.embedding_model,
            report.processing_time_ms
        ));
        if self.detailed {
            output.push_str(&format!("Batch: {}\n", report.batch_id));
        }

        output.push_str(&self.format_header("Ranked Candidates", 2));
        let name_width = report
            .candidates
            .iter()
            .map(|row| row.candidate.chars().count())
            .max()
            .unwrap_or(0)
            .max("Candidate".len());

        output.push_str(&format!(
            "{:>4}  {:<width$}  {}\n",
            "#",
            "Candidate",
            "Similarity Score",
            width = name_width
        ));
        for row in &report.candidates {
            let score = format!("{:.4}", row.score);
            output.push_str(&format!(
                "{:>4}  {:<width$}  {}",
                row.rank,
                row.candidate,
                self.colorize(&score, Self::score_color(row.score)),
                width = name_width
            ));
            if let Some(failure) = &row.failure {
                if self.detailed {
                    output.push_str(&format!("  {}", self.colorize(&format!("({})", failure), Color::BrightBlack)));
                } else {
                    output.push_str(&format!("  {}", self.colorize("(not scored)", Color::BrightBlack)));
                }
            }
            output.push('\n');
        }

        match (report.artifact.path(), report.artifact.warning()) {
            (Some(path), _) => output.push_str(&format!("\nRanking saved to {}\n", path.display())),
            (None, Some(warning)) => output.push_str(&format!(
                "\n{} {}\n",
                self.colorize("Ranking not saved:", Color::Red),
                warning
            )),
            (None, None) => {}
        }

        if !report.summaries.is_empty() {
            output.push_str(&self.format_header("Candidate Summaries", 2));
            for summary in &report.summaries {
                output.push_str(&self.format_header(&summary.candidate, 3));
                output.push_str(summary.summary.trim());
                output.push('\n');
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &RankingReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false, true)
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
        }
    }

    pub fn generate_report(&self, report: &RankingReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractionError, StageError};
    use crate::input::file_detector::DocumentFormat;
    use crate::output::report::CandidateSummary;
    use crate::processing::document::{ArtifactStatus, DocumentDiagnostic, ScoredCandidate};
    use crate::processing::session::BatchId;
    use std::path::PathBuf;

    fn sample_report() -> RankingReport {
        let candidates = vec![ScoredCandidate::new("alice.pdf", 0.8123), ScoredCandidate::new("notes.md", 0.0)];
        let diagnostics = vec![DocumentDiagnostic {
            name: "notes.md".to_string(),
            format: DocumentFormat::from_extension("md"),
            score: 0.0,
            text_chars: 0,
            failure: Some(StageError::Extraction(ExtractionError::UnsupportedFormat("md".to_string()))),
        }];
        RankingReport::new(
            BatchId::new(),
            "potion-base-8M",
            &candidates,
            &diagnostics,
            ArtifactStatus::Written(PathBuf::from("output/ranked_candidates.csv")),
            42,
        )
    }

    #[test]
    fn test_console_lists_candidates_in_rank_order() {
        let output = ConsoleFormatter::new(false, false).format_report(&sample_report()).unwrap();

        let alice = output.find("alice.pdf").unwrap();
        let notes = output.find("notes.md").unwrap();
        assert!(alice < notes);
        assert!(output.contains("0.8123"));
        assert!(output.contains("(not scored)"));
        assert!(output.contains("Ranking saved to output/ranked_candidates.csv"));
    }

    #[test]
    fn test_detailed_console_shows_failure_reason() {
        let output = ConsoleFormatter::new(false, true).format_report(&sample_report()).unwrap();
        assert!(output.contains("unsupported document format: md"));
    }

    #[test]
    fn test_json_includes_summaries() {
        let report = sample_report().with_summaries(vec![CandidateSummary {
            candidate: "alice.pdf".to_string(),
            summary: "1. Candidate Profile Summary".to_string(),
        }]);
        let json = ReportGenerator::with_options(false, false, false)
            .generate_report(&report, &OutputFormat::Json)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["candidates"][0]["candidate"], "alice.pdf");
        assert_eq!(value["candidates"][0]["rank"], 1);
        assert_eq!(value["summaries"][0]["candidate"], "alice.pdf");
        assert_eq!(value["artifact"]["status"], "written");
    }
}
