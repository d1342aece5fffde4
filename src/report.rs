/*!
 * Reporting functionality for dirdigest
 *
 * Prints a summary of a digest build using the tabled library.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::types::CandidateFile;
use crate::utils::format_file_size;

/// Statistics for one digest build
#[derive(Debug, Clone)]
pub struct DigestReport {
    /// Where the digest went
    pub output: String,
    /// Time taken to build and write
    pub duration: Duration,
    /// Files written into the digest
    pub included_count: usize,
    /// Candidates left out
    pub skipped_count: usize,
    /// Attachments that were active for the folder
    pub attachment_count: usize,
    /// Size of the final text in bytes
    pub output_bytes: usize,
    /// Included files
    pub files: Vec<CandidateFile>,
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for digest builds
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &DigestReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stderr so it never mixes with a digest on stdout
    pub fn print_report(&self, report: &DigestReport) {
        eprintln!("\n{}", self.generate_report(report));
    }

    fn styled(mut table: Table) -> String {
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));
        table.to_string()
    }

    fn create_summary_table(&self, report: &DigestReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let row = |key: &str, value: String| SummaryRow {
            key: key.to_string(),
            value,
        };

        let rows = vec![
            row("📂 Output", report.output.clone()),
            row("⏱️ Build Time", format!("{:.4?}", report.duration)),
            row("📄 Files Included", self.format_number(report.included_count)),
            row("🚫 Files Skipped", self.format_number(report.skipped_count)),
            row("📎 Attachments", self.format_number(report.attachment_count)),
            row("📦 Digest Size", format_file_size(report.output_bytes as u64)),
            row(
                "🔤 LLM Tokens",
                format!("{} tokens (estimated)", self.format_number(report.output_bytes / 4)),
            ),
        ];

        Self::styled(Table::new(rows))
    }

    fn create_files_table(&self, report: &DigestReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Size")]
            size: String,
        }

        let mut files: Vec<&CandidateFile> = report.files.iter().collect();
        files.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
        if files.len() > 15 {
            files.truncate(10);
        }

        let rows: Vec<FileRow> = files
            .into_iter()
            .map(|f| FileRow {
                path: truncate_path(&f.relative_path, 60),
                size: format_file_size(f.size_bytes),
            })
            .collect();

        Self::styled(Table::new(rows))
    }

    fn generate_console_report(&self, report: &DigestReport) -> String {
        let summary_table = self.create_summary_table(report);
        if report.files.is_empty() {
            return format!("✅  DIGEST COMPLETE\n{}", summary_table);
        }

        let files_title = if report.files.len() > 15 {
            "📋  TOP 10 LARGEST FILES  📋"
        } else {
            "📋  INCLUDED FILES"
        };

        format!(
            "{}\n{}\n\n✅  DIGEST COMPLETE\n{}",
            files_title,
            self.create_files_table(report),
            summary_table
        )
    }
}

/// Shorten a `/`-separated path to `max_len`, keeping its trailing segments
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let mut kept = Vec::new();
    let mut len = 3;
    for part in path.split('/').rev() {
        if len + part.len() + 1 > max_len {
            break;
        }
        len += part.len() + 1;
        kept.push(part);
    }

    if kept.is_empty() {
        let tail: String = path
            .chars()
            .rev()
            .take(max_len.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("...{}", tail);
    }

    kept.reverse();
    format!(".../{}", kept.join("/"))
}
