//! Output formatting for rewrite results.

use crate::cli::OutputFormat;
use camino::Utf8PathBuf;
use serde::Serialize;

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// The output differs from the input.
    Rewritten,
    /// Rewriting produced the input text.
    Unchanged,
    /// Loading or rewriting failed.
    Failed,
}

/// The result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Path relative to the workspace.
    pub path: Utf8PathBuf,
    /// Outcome.
    pub status: FileStatus,
    /// Where the rewritten text was written, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<Utf8PathBuf>,
    /// The failure, for [`FileStatus::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    /// Number of files processed.
    pub file_count: usize,
    /// Files whose output changed.
    pub rewritten: usize,
    /// Files whose output matched the input.
    pub unchanged: usize,
    /// Files that failed.
    pub failed: usize,
}

impl RewriteSummary {
    /// Tallies `reports`.
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Self {
            file_count: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.status {
                FileStatus::Rewritten => summary.rewritten += 1,
                FileStatus::Unchanged => summary.unchanged += 1,
                FileStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        let file_word = if self.file_count == 1 {
            "file"
        } else {
            "files"
        };
        let failure_word = if self.failed == 1 {
            "failure"
        } else {
            "failures"
        };

        format!(
            "====================================\nsplice rewrote {} of {} {} ({} unchanged, {} {})",
            self.rewritten, self.file_count, file_word, self.unchanged, self.failed, failure_word
        )
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    files: &'a [FileReport],
    summary: &'a RewriteSummary,
}

/// Formats a run for display.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the per-file reports and the summary.
    pub fn format(&self, reports: &[FileReport], summary: &RewriteSummary) -> String {
        match self.format {
            OutputFormat::Human => Self::format_human(reports, summary),
            OutputFormat::Json => Self::format_json(reports, summary),
        }
    }

    fn format_human(reports: &[FileReport], summary: &RewriteSummary) -> String {
        let mut output = String::new();
        for report in reports {
            match report.status {
                FileStatus::Rewritten => {
                    output.push_str(&format!("rewrote {}", report.path));
                    if let Some(target) = &report.written_to {
                        output.push_str(&format!(" -> {target}"));
                    }
                    output.push('\n');
                }
                FileStatus::Unchanged => {}
                FileStatus::Failed => {
                    output.push_str(&format!(
                        "Error: {}\n  {}\n",
                        report.path,
                        report.error.as_deref().unwrap_or("unknown error")
                    ));
                }
            }
        }
        output.push_str(&summary.format());
        output
    }

    fn format_json(reports: &[FileReport], summary: &RewriteSummary) -> String {
        serde_json::to_string_pretty(&JsonOutput {
            files: reports,
            summary,
        })
        .unwrap_or_else(|_| "{}".to_string())
    }
}
