//! Rendering utilities for scanguard reports.
//!
//! This crate provides renderers that convert a `Report` into review-facing
//! output formats:
//! - Markdown for PR comments
//! - GitHub workflow annotation commands
//!
//! plus [`AnnotationSink`], a [`CommentSink`] that buffers workflow commands
//! for stdout dispatch.

use scanguard_ports::CommentSink;
use scanguard_types::{Report, Severity, VerdictStatus};

/// Default maximum number of rows to show in the markdown table.
pub const DEFAULT_MAX_ROWS: usize = 10;

/// Default maximum number of GitHub annotations to emit.
pub const DEFAULT_MAX_ANNOTATIONS: usize = 50;

/// Returns an emoji representing the verdict status.
///
/// # Examples
///
/// ```rust
/// use scanguard_render::status_emoji;
/// use scanguard_types::VerdictStatus;
///
/// assert_eq!(status_emoji(&VerdictStatus::Pass), "\u{2705}");
/// assert_eq!(status_emoji(&VerdictStatus::Fail), "\u{274C}");
/// ```
pub fn status_emoji(status: &VerdictStatus) -> &'static str {
    match status {
        VerdictStatus::Pass => "\u{2705}",
        VerdictStatus::Warn => "\u{26A0}\u{FE0F}",
        VerdictStatus::Fail => "\u{274C}",
    }
}

/// Returns a human-readable status label.
fn status_label(status: &VerdictStatus) -> &'static str {
    match status {
        VerdictStatus::Pass => "pass",
        VerdictStatus::Warn => "warn",
        VerdictStatus::Fail => "fail",
    }
}

/// Renders the report as a Markdown comment for pull requests.
///
/// # Arguments
///
/// * `report` - The scan report to render.
/// * `max_rows` - Maximum number of violations to show in the table.
///
/// # Example Output
///
/// ```markdown
/// ## scanguard: Scan Report
///
/// **Status**: [emoji] [status]
///
/// ### Summary
/// - **Reported violations**: N
/// - **On changed lines**: N
///
/// ### Violations
///
/// | File | Line | Message |
/// |------|------|---------|
/// | Sources/Foo.swift | 5 | unused parameter |
/// ```
pub fn render_markdown(report: &Report, max_rows: usize) -> String {
    let mut output = String::new();

    // Header
    output.push_str("## scanguard: Scan Report\n\n");

    // Status line
    let emoji = status_emoji(&report.verdict.status);
    let label = status_label(&report.verdict.status);
    output.push_str(&format!("**Status**: {} {}\n\n", emoji, label));

    // Summary section
    output.push_str("### Summary\n");
    output.push_str(&format!(
        "- **Reported violations**: {}\n",
        report.data.violations_total
    ));
    output.push_str(&format!(
        "- **On changed lines**: {}\n",
        report.data.violations_relevant
    ));
    if report.data.excluded_files_count > 0 {
        output.push_str(&format!(
            "- **Excluded files**: {}\n",
            report.data.excluded_files_count
        ));
    }

    // Violations table (only findings with locations)
    let located: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.location.is_some())
        .collect();

    if !located.is_empty() {
        output.push_str("\n### Violations\n\n");
        output.push_str("| File | Line | Message |\n");
        output.push_str("|------|------|--------|\n");

        let total = located.len();
        let shown = total.min(max_rows);

        for finding in located.iter().take(max_rows) {
            if let Some(location) = &finding.location {
                let line_str = location
                    .line
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "-".to_string());
                output.push_str(&format!(
                    "| {} | {} | {} |\n",
                    location.path,
                    line_str,
                    finding.message.replace('|', "\\|")
                ));
            }
        }

        if total > max_rows {
            output.push('\n');
            output.push_str(&format!("*Showing {} of {} violations*\n", shown, total));
        }
    }

    // Reproduce locally section
    output.push_str("\n<details>\n");
    output.push_str("<summary>Reproduce locally</summary>\n\n");
    output.push_str("```bash\n");

    let inputs = &report.data.inputs;
    let mut cmd_parts = vec!["scanguard scan".to_string()];

    if let Some(report_file) = &inputs.report_file {
        cmd_parts.push(format!("--report {}", report_file));
    } else if let Some(scanner_cmd) = &inputs.scanner_cmd {
        cmd_parts.push(format!("--exec '{}'", scanner_cmd));
    } else {
        cmd_parts.push("--report <file>".to_string());
    }

    if let Some(diff_file) = &inputs.diff_file {
        cmd_parts.push(format!("--diff-file {}", diff_file));
    } else if inputs.base.is_some() || inputs.head.is_some() {
        if let Some(base) = &inputs.base {
            cmd_parts.push(format!("--base {}", base));
        }
        if let Some(head) = &inputs.head {
            cmd_parts.push(format!("--head {}", head));
        }
    } else {
        cmd_parts.push("--diff-file <file>".to_string());
    }

    output.push_str(&cmd_parts.join(" \\\n  "));
    output.push_str("\n```\n\n");
    output.push_str("</details>\n");

    output
}

/// Renders the report as GitHub workflow annotation commands.
///
/// # Example Output
///
/// ```text
/// ::warning file=Sources/Foo.swift,line=5::unused parameter
/// ```
pub fn render_annotations(report: &Report, max_annotations: usize) -> String {
    let mut output = String::new();

    for finding in report.findings.iter().take(max_annotations) {
        let level = match finding.severity {
            Severity::Error => "error",
            Severity::Warn => "warning",
            Severity::Info => "notice",
        };

        match &finding.location {
            Some(location) => {
                let mut params = vec![format!("file={}", location.path)];
                if let Some(line) = location.line {
                    params.push(format!("line={}", line));
                }
                output.push_str(&format!(
                    "::{} {}::{}\n",
                    level,
                    params.join(","),
                    finding.message
                ));
            }
            None => {
                output.push_str(&format!("::{}::{}\n", level, finding.message));
            }
        }
    }

    output
}

// ============================================================================
// Annotation Sink
// ============================================================================

/// A [`CommentSink`] that buffers GitHub workflow commands.
///
/// `warn` becomes a `::warning` annotation tied to a file and line; `fail`
/// becomes a single location-less `::error`. The buffer is flushed to stdout
/// by the caller.
#[derive(Debug, Default)]
pub struct AnnotationSink {
    buffer: String,
}

impl AnnotationSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffered workflow commands.
    pub fn output(&self) -> &str {
        &self.buffer
    }

    /// Whether anything was dispatched.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl CommentSink for AnnotationSink {
    fn warn(&mut self, message: &str, file: &str, line: u32) {
        self.buffer
            .push_str(&format!("::warning file={},line={}::{}\n", file, line, message));
    }

    fn fail(&mut self, message: &str) {
        self.buffer.push_str(&format!("::error::{}\n", message));
    }
}

// ============================================================================
// Tests
// ============================================================================
