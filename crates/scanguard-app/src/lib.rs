//! Application orchestration for scanguard.
//!
//! This crate provides the high-level `scan` function that orchestrates the
//! violation-relevance pipeline:
//!
//! 1. Parse the diff into the per-file change model
//! 2. Parse the checkstyle report into violations
//! 3. Keep the violations that fall on changed lines
//! 4. Apply path include/exclude filtering and the comment cap
//! 5. Build the receipt with markdown and annotation renderings
//!
//! and `dispatch_comments`, which hands the outcome to a [`CommentSink`]:
//! one warning per surfaced violation on success, a single failure message
//! otherwise.

use std::collections::BTreeSet;

use scanguard_config::should_include_path;
pub use scanguard_config::FailOn;
use scanguard_diff::{DiffError, PatchDiffProvider, parse_patch};
use scanguard_domain::filter_relevant;
use scanguard_ports::{Clock, CommentSink, ExecutionError, SystemClock};
use scanguard_render::{
    DEFAULT_MAX_ANNOTATIONS, DEFAULT_MAX_ROWS, render_annotations, render_markdown,
};
use scanguard_report::{ReportError, parse_checkstyle};
use scanguard_types::{
    Finding, Inputs, REASON_CLEAN_SCAN, REASON_NO_RELEVANT, REASON_TOOL_ERROR, REASON_TRUNCATED,
    REASON_VIOLATIONS, Report, ReportData, Run, Severity, Tool, Truncation, Verdict,
    VerdictCounts, VerdictStatus, Violation,
};
use thiserror::Error;

// ============================================================================
// Request and Result Types
// ============================================================================

/// Request for a scan operation.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Raw checkstyle report text from the scanner.
    pub report_text: String,
    /// Absolute project root used to relativize report paths.
    pub project_root: String,
    /// Unified diff text for the reviewed revision.
    pub diff_text: String,
    /// Path to the report file, for receipt metadata.
    pub report_file_path: Option<String>,
    /// Scanner command line, for receipt metadata (when the scanner was run).
    pub scanner_cmd: Option<String>,
    /// Path to the diff file, for receipt metadata.
    pub diff_file_path: Option<String>,
    /// Base git ref, for receipt metadata (alternative to diff_file_path).
    pub base_ref: Option<String>,
    /// Head git ref, for receipt metadata (alternative to diff_file_path).
    pub head_ref: Option<String>,
    /// Glob patterns to include (allowlist).
    pub include_patterns: Vec<String>,
    /// Glob patterns to exclude.
    pub exclude_patterns: Vec<String>,
    /// Determines whether surfaced violations fail the scan.
    pub fail_on: FailOn,
    /// Maximum number of violations to surface.
    pub max_comments: Option<usize>,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self {
            report_text: String::new(),
            project_root: String::new(),
            diff_text: String::new(),
            report_file_path: None,
            scanner_cmd: None,
            diff_file_path: None,
            base_ref: None,
            head_ref: None,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            fail_on: FailOn::Never,
            max_comments: None,
        }
    }
}

/// Result of a scan operation.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// The scan receipt (scanguard.report.v1).
    pub report: Report,
    /// Violations to surface, in report order (post filtering and cap).
    pub violations: Vec<Violation>,
    /// Markdown rendering of the report.
    pub markdown: String,
    /// GitHub annotations rendering of the report.
    pub annotations: String,
    /// Exit code for the CLI.
    /// - 0: pass or warn
    /// - 2: policy fail (fail_on = violations and violations surfaced)
    /// - 1: tool/runtime error (not returned here, only via AppError)
    pub exit_code: i32,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that terminate the whole scan.
///
/// No partial violation list is ever produced: a malformed report or diff
/// fails the scan outright.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to parse the scanner report.
    #[error("Failed to parse scanner report: {0}")]
    ReportParse(String),

    /// Failed to parse the diff.
    #[error("Failed to parse diff: {0}")]
    DiffParse(String),

    /// The external scanner failed to run.
    #[error("Scanner execution failed: {0}")]
    ScanExecution(String),
}

impl From<ReportError> for AppError {
    fn from(e: ReportError) -> Self {
        AppError::ReportParse(e.to_string())
    }
}

impl From<DiffError> for AppError {
    fn from(e: DiffError) -> Self {
        AppError::DiffParse(e.to_string())
    }
}

impl From<ExecutionError> for AppError {
    fn from(e: ExecutionError) -> Self {
        AppError::ScanExecution(e.to_string())
    }
}

// ============================================================================
// Main Scan Function
// ============================================================================

/// Run a violation-relevance scan.
///
/// # Errors
///
/// Returns [`AppError`] when the report or diff cannot be parsed. Diff
/// *lookup* failures inside the relevance check are not errors; they mean
/// the file was untouched and the violation is simply not surfaced.
pub fn scan(request: ScanRequest) -> Result<ScanResult, AppError> {
    scan_with_clock(request, &SystemClock)
}

/// Run a violation-relevance scan with a custom clock.
///
/// This allows for deterministic testing with fixed timestamps.
pub fn scan_with_clock<C: Clock>(request: ScanRequest, clock: &C) -> Result<ScanResult, AppError> {
    let started_at = clock.now();

    // Parse the diff into the change model
    let changes = parse_patch(&request.diff_text)?;
    tracing::debug!(files = changes.len(), "parsed diff");
    let provider = PatchDiffProvider::new(changes);

    // Parse the scanner report (all-or-nothing)
    let all_violations = parse_checkstyle(&request.report_text, &request.project_root)?;
    let violations_total = all_violations.len() as u32;
    tracing::debug!(violations = violations_total, "parsed scanner report");

    // Keep violations on changed lines
    let relevant = filter_relevant(all_violations, &provider);

    // Path include/exclude filtering
    let mut excluded_files: BTreeSet<String> = BTreeSet::new();
    let surfaced: Vec<Violation> = relevant
        .into_iter()
        .filter(|violation| {
            if should_include_path(
                &violation.file_path,
                &request.include_patterns,
                &request.exclude_patterns,
            ) {
                true
            } else {
                excluded_files.insert(violation.file_path.clone());
                false
            }
        })
        .collect();
    let violations_relevant = surfaced.len() as u32;

    // Comment cap
    let (surfaced, truncation) = truncate_violations(surfaced, request.max_comments);
    tracing::debug!(
        surfaced = surfaced.len(),
        relevant = violations_relevant,
        "relevance filtering done"
    );

    // Verdict
    let mut reasons = Vec::new();
    let status = if violations_relevant == 0 {
        reasons.push(
            if violations_total == 0 {
                REASON_CLEAN_SCAN
            } else {
                REASON_NO_RELEVANT
            }
            .to_string(),
        );
        VerdictStatus::Pass
    } else {
        reasons.push(REASON_VIOLATIONS.to_string());
        match request.fail_on {
            FailOn::Violations => VerdictStatus::Fail,
            FailOn::Never => VerdictStatus::Warn,
        }
    };
    if truncation.is_some() {
        reasons.push(REASON_TRUNCATED.to_string());
    }

    let findings: Vec<Finding> = surfaced
        .iter()
        .map(|v| Finding::violation(v.file_path.clone(), v.line, v.message.clone()))
        .collect();

    let counts = VerdictCounts {
        info: 0,
        warn: violations_relevant,
        error: 0,
    };

    let ended_at = clock.now();
    let report = Report {
        schema: scanguard_types::SCHEMA_ID.to_string(),
        tool: Tool::default(),
        run: build_run(started_at, ended_at),
        verdict: Verdict {
            status,
            counts,
            reasons,
        },
        findings,
        data: ReportData {
            violations_total,
            violations_relevant,
            excluded_files_count: excluded_files.len() as u32,
            inputs: build_inputs(&request),
            truncation,
        },
    };

    let markdown = render_markdown(&report, DEFAULT_MAX_ROWS);
    let annotations = render_annotations(&report, DEFAULT_MAX_ANNOTATIONS);

    let exit_code = match report.verdict.status {
        VerdictStatus::Pass | VerdictStatus::Warn => 0,
        VerdictStatus::Fail => 2,
    };

    Ok(ScanResult {
        report,
        violations: surfaced,
        markdown,
        annotations,
        exit_code,
    })
}

// ============================================================================
// Comment Dispatch
// ============================================================================

/// Hand the scan outcome to a comment sink.
///
/// On success, one `warn(message, file, line)` per surfaced violation in
/// report order; on failure, a single `fail(message)`. Does nothing when
/// `post_comments` is false.
pub fn dispatch_comments<S: CommentSink>(
    outcome: &Result<ScanResult, AppError>,
    sink: &mut S,
    post_comments: bool,
) {
    if !post_comments {
        return;
    }
    match outcome {
        Ok(result) => {
            for violation in &result.violations {
                sink.warn(&violation.message, &violation.file_path, violation.line);
            }
        }
        Err(error) => {
            sink.fail(&error.to_string());
        }
    }
}

// ============================================================================
// Error Receipt
// ============================================================================

/// Build a failure receipt for a scan that could not complete.
///
/// Used by callers to still write a `scanguard.report.v1` document when the
/// report or diff was unparseable or the scanner did not run.
pub fn error_report<C: Clock>(request: &ScanRequest, error: &AppError, clock: &C) -> Report {
    let now = clock.now();
    Report {
        schema: scanguard_types::SCHEMA_ID.to_string(),
        tool: Tool::default(),
        run: build_run(now, now),
        verdict: Verdict {
            status: VerdictStatus::Fail,
            counts: VerdictCounts {
                info: 0,
                warn: 0,
                error: 1,
            },
            reasons: vec![REASON_TOOL_ERROR.to_string()],
        },
        findings: vec![Finding {
            severity: Severity::Error,
            check_id: "tool.runtime_error".to_string(),
            code: error_code(error).to_string(),
            message: error.to_string(),
            location: None,
            fingerprint: None,
        }],
        data: ReportData {
            violations_total: 0,
            violations_relevant: 0,
            excluded_files_count: 0,
            inputs: build_inputs(request),
            truncation: None,
        },
    }
}

fn error_code(error: &AppError) -> &'static str {
    match error {
        AppError::ReportParse(_) => scanguard_types::CODE_INVALID_REPORT,
        AppError::DiffParse(_) => scanguard_types::CODE_INVALID_DIFF,
        AppError::ScanExecution(_) => scanguard_types::CODE_SCAN_FAILED,
    }
}

// ============================================================================
// Builders
// ============================================================================

fn truncate_violations(
    violations: Vec<Violation>,
    max: Option<usize>,
) -> (Vec<Violation>, Option<Truncation>) {
    if let Some(max) = max {
        let total = violations.len();
        if total > max {
            let truncated = violations.into_iter().take(max).collect();
            let trunc = Truncation {
                findings_truncated: true,
                shown: max as u32,
                total: total as u32,
            };
            return (truncated, Some(trunc));
        }
        (violations, None)
    } else {
        (violations, None)
    }
}

fn build_run(
    started_at: chrono::DateTime<chrono::Utc>,
    ended_at: chrono::DateTime<chrono::Utc>,
) -> Run {
    Run {
        started_at: started_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        ended_at: Some(ended_at.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        duration_ms: Some((ended_at - started_at).num_milliseconds().max(0) as u64),
    }
}

fn build_inputs(request: &ScanRequest) -> Inputs {
    let report_source = if request.report_file_path.is_some() {
        "report-file"
    } else if request.scanner_cmd.is_some() {
        "scanner"
    } else {
        "stdin"
    };
    let diff_source = if request.diff_file_path.is_some() {
        "diff-file"
    } else if request.base_ref.is_some() && request.head_ref.is_some() {
        "git-refs"
    } else {
        "stdin"
    };

    Inputs {
        report_source: report_source.to_string(),
        report_file: request.report_file_path.clone(),
        scanner_cmd: request.scanner_cmd.clone(),
        diff_source: diff_source.to_string(),
        diff_file: request.diff_file_path.clone(),
        base: request.base_ref.clone(),
        head: request.head_ref.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
