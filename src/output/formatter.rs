//! Output formatters for analysis reports

use crate::config::{OutputConfig, OutputFormat};
use crate::error::{Result, ZoneGapError};
use crate::output::report::{AnalysisReport, STRONG_ZONE_THRESHOLD, WEAK_ZONE_THRESHOLD};
use crate::processing::gaps::GapRecord;
use colored::{Color, Colorize};
use std::fmt::Write as _;
use std::path::Path;

const BAR_WIDTH: usize = 30;
const FRAGMENT_PREVIEW_CHARS: usize = 90;

/// Trait for formatting analysis reports
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors and a relevance bar chart
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for downstream tooling
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for sharing reports
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

fn fmt_err(e: std::fmt::Error) -> ZoneGapError {
    ZoneGapError::OutputFormatting(e.to_string())
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated.trim_end())
    }
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
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn score_color(score: f32) -> Color {
        if score >= STRONG_ZONE_THRESHOLD {
            Color::Green
        } else if score >= WEAK_ZONE_THRESHOLD {
            Color::Yellow
        } else {
            Color::Red
        }
    }

    /// Bar over [0, 1]; negative scores render empty
    fn format_bar(&self, score: f32) -> String {
        let filled = ((score.max(0.0) * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
        let bar = format!("{}{}", "■".repeat(filled), "·".repeat(BAR_WIDTH - filled));
        self.colorize(&bar, Self::score_color(score))
    }

    fn format_gap(&self, index: usize, gap: &GapRecord) -> String {
        let mut line = format!(
            "  {}. {} [kw {:.2}]\n",
            index + 1,
            preview(&gap.fragment, FRAGMENT_PREVIEW_CHARS),
            gap.keywords_sim
        );
        if self.detailed {
            line.push_str(&format!(
                "     zone kw: {:.2} | vs my zone: {:.2} | vs my page: {:.2} | {}\n",
                gap.my_doc_kw_sim,
                gap.my_doc_sim_zone,
                gap.my_doc_sim_full,
                self.colorize(&gap.competitor, Color::Cyan)
            ));
        }
        line
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();
        let metadata = &report.metadata;

        output.push_str(&self.format_header("📊 ZONE RELEVANCE ANALYSIS", 1));
        writeln!(
            output,
            "Generated: {} | Processing time: {}ms | Model: {}",
            metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            metadata.processing_time_ms,
            metadata.embedding_model
        )
        .map_err(fmt_err)?;
        writeln!(output, "Target: {}", metadata.target).map_err(fmt_err)?;
        writeln!(output, "Competitors: {}", metadata.competitors.len()).map_err(fmt_err)?;
        writeln!(output, "Keywords: {}", metadata.keywords.join(", ")).map_err(fmt_err)?;

        output.push_str(&self.format_header("Zone Relevance to Top Competitors", 2));
        if report.summary.ranked.is_empty() {
            output.push_str("No zone had data on both sides.\n");
        }
        for (zone, score) in &report.summary.ranked {
            writeln!(output, "{:<16} {} {:>6.3}", zone.as_str(), self.format_bar(*score), score)
                .map_err(fmt_err)?;
        }
        if let Some(average) = report.summary.average_relevance {
            writeln!(output, "\nAverage relevance: {:.3}", average).map_err(fmt_err)?;
        }
        if !report.summary.strong_zones.is_empty() {
            let zones: Vec<&str> = report.summary.strong_zones.iter().map(|z| z.as_str()).collect();
            writeln!(output, "💪 Strong zones: {}", self.colorize(&zones.join(", "), Color::Green))
                .map_err(fmt_err)?;
        }
        if !report.summary.weak_zones.is_empty() {
            let zones: Vec<&str> = report.summary.weak_zones.iter().map(|z| z.as_str()).collect();
            writeln!(output, "⚠️  Weak zones: {}", self.colorize(&zones.join(", "), Color::Red))
                .map_err(fmt_err)?;
        }
        if self.detailed && !report.summary.unscored_zones.is_empty() {
            let zones: Vec<&str> = report.summary.unscored_zones.iter().map(|z| z.as_str()).collect();
            writeln!(output, "➖ No data: {}", zones.join(", ")).map_err(fmt_err)?;
        }

        output.push_str(&self.format_header("Semantic Gaps", 2));
        let mut any_gaps = false;
        for (zone, gaps) in &report.semantic_gaps {
            if gaps.is_empty() {
                continue;
            }
            any_gaps = true;
            output.push_str(&self.format_header(zone.as_str(), 3));
            for (i, gap) in gaps.iter().enumerate() {
                output.push_str(&self.format_gap(i, gap));
            }
        }
        if !any_gaps {
            writeln!(
                output,
                "No competitor fragment reached the keyword threshold ({:.2}).",
                metadata.settings.min_sim
            )
            .map_err(fmt_err)?;
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
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
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

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut md = String::new();
        let metadata = &report.metadata;

        md.push_str("# Zone Relevance Analysis\n\n");
        if self.include_metadata {
            writeln!(md, "- **Target:** {}", metadata.target).map_err(fmt_err)?;
            writeln!(md, "- **Competitors:** {}", metadata.competitors.join(", ")).map_err(fmt_err)?;
            writeln!(md, "- **Keywords:** {}", metadata.keywords.join(", ")).map_err(fmt_err)?;
            writeln!(md, "- **Model:** {}", metadata.embedding_model).map_err(fmt_err)?;
            writeln!(
                md,
                "- **Generated:** {}\n",
                metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
            .map_err(fmt_err)?;
        }

        md.push_str("## Zone relevance\n\n| Zone | Relevance |\n|------|-----------|\n");
        for (zone, score) in &report.summary.ranked {
            writeln!(md, "| {} | {:.3} |", zone, score).map_err(fmt_err)?;
        }
        if !report.summary.unscored_zones.is_empty() {
            let zones: Vec<&str> = report.summary.unscored_zones.iter().map(|z| z.as_str()).collect();
            writeln!(md, "\n_No data on one side:_ {}", zones.join(", ")).map_err(fmt_err)?;
        }

        md.push_str("\n## Semantic gaps\n");
        for (zone, gaps) in &report.semantic_gaps {
            writeln!(md, "\n### {}\n", zone).map_err(fmt_err)?;
            if gaps.is_empty() {
                md.push_str("_No fragments above threshold._\n");
                continue;
            }
            md.push_str("| Fragment | Competitor | keywords_sim | my_doc_kw_sim | my_doc_sim_zone | my_doc_sim_full |\n");
            md.push_str("|----------|------------|--------------|---------------|-----------------|-----------------|\n");
            for gap in gaps {
                writeln!(
                    md,
                    "| {} | {} | {:.3} | {:.3} | {:.3} | {:.3} |",
                    Self::escape_cell(&preview(&gap.fragment, FRAGMENT_PREVIEW_CHARS)),
                    Self::escape_cell(&gap.competitor),
                    gap.keywords_sim,
                    gap.my_doc_kw_sim,
                    gap.my_doc_sim_zone,
                    gap.my_doc_sim_full
                )
                .map_err(fmt_err)?;
            }
        }

        Ok(md)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(output.color_output, output.detailed),
            json_formatter: JsonFormatter::new(output.pretty_json),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}
