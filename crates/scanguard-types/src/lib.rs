//! Core types and DTOs for scanguard.
//!
//! This crate defines the data transfer objects used throughout scanguard,
//! including violations, the file-change model, the report schema, and error
//! codes.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Schema and Code Constants
// ============================================================================

/// Schema identifier for the scanguard report format.
pub const SCHEMA_ID: &str = "scanguard.report.v1";

/// Error code for a violation surfaced on a changed line.
pub const CODE_VIOLATION: &str = "scanguard.review.violation";

/// Error code for invalid scanner report input.
pub const CODE_INVALID_REPORT: &str = "scanguard.input.invalid_report";

/// Error code for invalid diff input.
pub const CODE_INVALID_DIFF: &str = "scanguard.input.invalid_diff";

/// Error code for a scanner process that failed to run.
pub const CODE_SCAN_FAILED: &str = "scanguard.scan.execution_failed";

/// Error code for runtime errors.
pub const CODE_RUNTIME_ERROR: &str = "tool.runtime_error";

// ============================================================================
// Verdict Reason Tokens
// ============================================================================

/// Reason: relevant violations were found on changed lines.
pub const REASON_VIOLATIONS: &str = "violations_found";

/// Reason: the scanner reported violations, none on changed lines.
pub const REASON_NO_RELEVANT: &str = "no_relevant_violations";

/// Reason: the scanner report contained no violations at all.
pub const REASON_CLEAN_SCAN: &str = "clean_scan";

/// Reason: a tool/runtime error occurred.
pub const REASON_TOOL_ERROR: &str = "tool_error";

/// Reason: surfaced violations were truncated to the comment cap.
pub const REASON_TRUNCATED: &str = "truncated";

// ============================================================================
// Fingerprint
// ============================================================================

/// Compute a SHA-256 fingerprint from pipe-delimited parts.
///
/// Joins all parts with `|`, hashes with SHA-256, and returns lowercase hex.
pub fn compute_fingerprint(parts: &[&str]) -> String {
    let input = parts.join("|");
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

// ============================================================================
// Code Registry
// ============================================================================

/// Metadata for a scanguard error code.
#[derive(Debug, Clone, Copy)]
pub struct CodeInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub short_description: &'static str,
    pub full_description: &'static str,
    pub remediation: &'static str,
    pub help_anchor: &'static str,
    pub help_uri: &'static str,
}

/// Registry of all scanguard codes.
pub const CODE_REGISTRY: &[CodeInfo] = &[
    CodeInfo {
        code: CODE_VIOLATION,
        name: "ReviewViolation",
        short_description: "Violation on a changed line",
        full_description: "The scanner reported a finding on a line touched by the reviewed revision.",
        remediation: "Fix the reported finding, or suppress it in the scanner's own configuration.",
        help_anchor: "violation",
        help_uri: "https://github.com/scanguard/scanguard/blob/main/docs/codes.md#violation",
    },
    CodeInfo {
        code: CODE_INVALID_REPORT,
        name: "InvalidReport",
        short_description: "Invalid scanner report input",
        full_description: "Scanner output could not be parsed as a checkstyle XML report.",
        remediation: "Re-run the scanner with checkstyle output enabled and ensure the report is not truncated.",
        help_anchor: "invalid_report",
        help_uri: "https://github.com/scanguard/scanguard/blob/main/docs/codes.md#invalid_report",
    },
    CodeInfo {
        code: CODE_INVALID_DIFF,
        name: "InvalidDiff",
        short_description: "Invalid diff input",
        full_description: "Diff input could not be parsed as a unified diff.",
        remediation: "Ensure a valid unified diff is provided or use --base/--head.",
        help_anchor: "invalid_diff",
        help_uri: "https://github.com/scanguard/scanguard/blob/main/docs/codes.md#invalid_diff",
    },
    CodeInfo {
        code: CODE_SCAN_FAILED,
        name: "ScanFailed",
        short_description: "Scanner execution failed",
        full_description: "The external analysis tool could not be run or exited abnormally.",
        remediation: "Check that the scanner executable is installed and the argument list is valid.",
        help_anchor: "scan_failed",
        help_uri: "https://github.com/scanguard/scanguard/blob/main/docs/codes.md#scan_failed",
    },
    CodeInfo {
        code: CODE_RUNTIME_ERROR,
        name: "RuntimeError",
        short_description: "Tool runtime error",
        full_description: "scanguard failed due to a runtime or internal error.",
        remediation: "Re-run with raw inputs captured and file a bug if reproducible.",
        help_anchor: "runtime_error",
        help_uri: "https://github.com/scanguard/scanguard/blob/main/docs/codes.md#runtime_error",
    },
];

/// Lookup code metadata by code string.
pub fn explain(code: &str) -> Option<&'static CodeInfo> {
    CODE_REGISTRY.iter().find(|info| info.code == code)
}

// ============================================================================
// Violation Model
// ============================================================================

/// One reported finding from the static-analysis tool.
///
/// Produced only by the report parser; duplicates are possible and preserved
/// in report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Root-relative path to the file the finding is in.
    pub file_path: String,
    /// Line number (1-indexed), as reported by the scanner.
    pub line: u32,
    /// Human-readable description of the finding.
    pub message: String,
}

impl Violation {
    /// Create a new violation.
    pub fn new(file_path: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            message: message.into(),
        }
    }
}

// ============================================================================
// File Change Model
// ============================================================================

/// A contiguous block of changed lines in the new version of a modified file.
///
/// The span is the new-side span of a diff hunk, 1-indexed and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// Inclusive line range in the new file version.
    pub new_lines: RangeInclusive<u32>,
}

impl Hunk {
    /// Create a hunk over `start..=end`. Requires `start <= end`.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "hunk range must satisfy start <= end");
        Self {
            new_lines: start..=end,
        }
    }

    /// Whether the hunk's new-side span contains `line`.
    pub fn contains(&self, line: u32) -> bool {
        self.new_lines.contains(&line)
    }
}

/// The change status of one file between the base and head of a revision.
///
/// Only `Modified` carries line data; matches over this enum are exhaustive
/// so a new variant is a compile-time-visible change everywhere it is
/// handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "hunks")]
pub enum FileChange {
    /// File is new in the head revision.
    Created,
    /// File was removed.
    Deleted,
    /// File was renamed. Carries no line data; a rename is excluded from
    /// relevance even when the diff also reports content hunks.
    Renamed,
    /// File exists in both revisions and was edited.
    Modified(Vec<Hunk>),
}

// ============================================================================
// Enums
// ============================================================================

/// Severity level for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Status of the overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    Warn,
    Fail,
}

// ============================================================================
// Report Structs
// ============================================================================

/// Information about the tool that generated the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool.
    pub name: String,
    /// Version of the tool.
    pub version: String,
    /// Git commit hash of the tool, if available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            name: "scanguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: None,
        }
    }
}

/// Information about the run timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// ISO 8601 timestamp when the run started.
    pub started_at: String,
    /// ISO 8601 timestamp when the run ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    /// Duration of the run in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            started_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            ended_at: None,
            duration_ms: None,
        }
    }
}

/// Counts of findings by severity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerdictCounts {
    /// Number of info-level findings.
    pub info: u32,
    /// Number of warn-level findings.
    pub warn: u32,
    /// Number of error-level findings.
    pub error: u32,
}

/// The overall verdict of the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Overall status of the scan.
    pub status: VerdictStatus,
    /// Counts of findings by severity.
    pub counts: VerdictCounts,
    /// Reasons for the verdict.
    pub reasons: Vec<String>,
}

impl Default for Verdict {
    fn default() -> Self {
        Self {
            status: VerdictStatus::Pass,
            counts: VerdictCounts::default(),
            reasons: Vec::new(),
        }
    }
}

/// Location of a finding in the source code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Root-relative path to the file (forward slashes, no ./ prefix).
    pub path: String,
    /// Line number (1-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// A single finding in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Severity of the finding.
    pub severity: Severity,
    /// Check identifier (e.g., "review.violation").
    pub check_id: String,
    /// Full error code (e.g., "scanguard.review.violation").
    pub code: String,
    /// Human-readable message describing the finding.
    pub message: String,
    /// Location of the finding in source code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// SHA-256 fingerprint for deduplication (`^[a-f0-9]{64}$`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Finding {
    /// Create a finding for a violation surfaced on a changed line.
    pub fn violation(path: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        let path = path.into();
        let message = message.into();
        let line_str = line.to_string();
        let fp = compute_fingerprint(&[CODE_VIOLATION, &path, &line_str, &message]);
        Self {
            severity: Severity::Warn,
            check_id: "review.violation".to_string(),
            code: CODE_VIOLATION.to_string(),
            message,
            location: Some(Location {
                path,
                line: Some(line),
            }),
            fingerprint: Some(fp),
        }
    }
}

/// Information about the inputs used for the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inputs {
    /// Source of the report ("report-file", "scanner", "stdin").
    pub report_source: String,
    /// Path to the report file, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file: Option<String>,
    /// Scanner command line, if the scanner was executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanner_cmd: Option<String>,
    /// Source of the diff ("diff-file", "git-refs", "stdin").
    pub diff_source: String,
    /// Path to the diff file, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_file: Option<String>,
    /// Base git ref, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Head git ref, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            report_source: "report-file".to_string(),
            report_file: None,
            scanner_cmd: None,
            diff_source: "diff-file".to_string(),
            diff_file: None,
            base: None,
            head: None,
        }
    }
}

/// Truncation metadata when surfaced violations exceed the comment cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truncation {
    /// Whether findings were truncated.
    pub findings_truncated: bool,
    /// Number of findings shown in the report.
    pub shown: u32,
    /// Total number of findings before truncation.
    pub total: u32,
}

/// Aggregated data about the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    /// Total violations in the scanner report.
    pub violations_total: u32,
    /// Violations on lines changed by the reviewed revision.
    pub violations_relevant: u32,
    /// Number of files excluded via include/exclude filtering.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub excluded_files_count: u32,
    /// Information about the inputs.
    pub inputs: Inputs,
    /// Truncation metadata (populated when findings exceed the cap).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation: Option<Truncation>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Default for ReportData {
    fn default() -> Self {
        Self {
            violations_total: 0,
            violations_relevant: 0,
            excluded_files_count: 0,
            inputs: Inputs::default(),
            truncation: None,
        }
    }
}

/// The full scan report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Schema identifier.
    pub schema: String,
    /// Tool information.
    pub tool: Tool,
    /// Run timing information.
    pub run: Run,
    /// Overall verdict.
    pub verdict: Verdict,
    /// List of findings.
    pub findings: Vec<Finding>,
    /// Aggregated data.
    pub data: ReportData,
}

impl Report {
    /// Create a new report with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for Report {
    fn default() -> Self {
        Self {
            schema: SCHEMA_ID.to_string(),
            tool: Tool::default(),
            run: Run::default(),
            verdict: Verdict::default(),
            findings: Vec::new(),
            data: ReportData::default(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_fingerprint_known_values() {
        assert_eq!(
            compute_fingerprint(&["a", "b"]),
            "0eab8a0a3380abf4c7d1fb0b43b66aafbb64a4b953e4eb2dccca579461912d0c"
        );
        assert_eq!(
            compute_fingerprint(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_explain_returns_code_info() {
        let info = explain(CODE_VIOLATION).expect("code should exist");
        assert_eq!(info.code, CODE_VIOLATION);
        assert_eq!(info.name, "ReviewViolation");
        assert!(explain("scanguard.missing.code").is_none());
    }

    #[test]
    fn test_code_registry_contains_known_codes() {
        let codes: Vec<&str> = CODE_REGISTRY.iter().map(|c| c.code).collect();
        assert!(codes.contains(&CODE_VIOLATION));
        assert!(codes.contains(&CODE_INVALID_REPORT));
        assert!(codes.contains(&CODE_INVALID_DIFF));
        assert!(codes.contains(&CODE_SCAN_FAILED));
        assert!(codes.contains(&CODE_RUNTIME_ERROR));
    }

    // ========================================================================
    // Violation Tests
    // ========================================================================

    #[test]
    fn test_violation_new() {
        let v = Violation::new("Sources/Foo.swift", 5, "unused parameter");
        assert_eq!(v.file_path, "Sources/Foo.swift");
        assert_eq!(v.line, 5);
        assert_eq!(v.message, "unused parameter");
    }

    #[test]
    fn test_violation_roundtrip() {
        let v = Violation::new("src/lib.rs", 42, "dead code");
        let json = serde_json::to_string(&v).unwrap();
        let parsed: Violation = serde_json::from_str(&json).unwrap();
        assert_eq!(v, parsed);
    }

    #[test]
    fn test_violations_with_same_fields_are_equal() {
        // Duplicates have no identity beyond their fields
        let a = Violation::new("a.rs", 1, "m");
        let b = Violation::new("a.rs", 1, "m");
        assert_eq!(a, b);
    }

    // ========================================================================
    // Hunk Tests
    // ========================================================================

    #[test]
    fn test_hunk_contains_boundaries() {
        let hunk = Hunk::new(10, 20);
        assert!(hunk.contains(10));
        assert!(hunk.contains(15));
        assert!(hunk.contains(20));
        assert!(!hunk.contains(9));
        assert!(!hunk.contains(21));
    }

    #[test]
    fn test_hunk_single_line() {
        let hunk = Hunk::new(7, 7);
        assert!(hunk.contains(7));
        assert!(!hunk.contains(6));
        assert!(!hunk.contains(8));
    }

    // ========================================================================
    // FileChange Tests
    // ========================================================================

    #[test]
    fn test_file_change_serialization() {
        let created = serde_json::to_value(&FileChange::Created).unwrap();
        assert_eq!(created["status"], "created");

        let modified = serde_json::to_value(&FileChange::Modified(vec![Hunk::new(1, 3)])).unwrap();
        assert_eq!(modified["status"], "modified");
        assert_eq!(modified["hunks"][0]["new_lines"]["start"], 1);
        assert_eq!(modified["hunks"][0]["new_lines"]["end"], 3);
    }

    #[test]
    fn test_file_change_roundtrip() {
        for change in [
            FileChange::Created,
            FileChange::Deleted,
            FileChange::Renamed,
            FileChange::Modified(vec![Hunk::new(1, 5), Hunk::new(9, 9)]),
        ] {
            let json = serde_json::to_string(&change).unwrap();
            let parsed: FileChange = serde_json::from_str(&json).unwrap();
            assert_eq!(change, parsed);
        }
    }

    // ========================================================================
    // Enum Tests
    // ========================================================================

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
        assert_eq!(
            serde_json::to_string(&Severity::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_verdict_status_serialization() {
        assert_eq!(
            serde_json::to_string(&VerdictStatus::Pass).unwrap(),
            "\"pass\""
        );
        assert_eq!(
            serde_json::to_string(&VerdictStatus::Warn).unwrap(),
            "\"warn\""
        );
        assert_eq!(
            serde_json::to_string(&VerdictStatus::Fail).unwrap(),
            "\"fail\""
        );
    }

    #[test]
    fn test_invalid_severity_deserialization() {
        let result = serde_json::from_str::<Severity>("\"invalid\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_verdict_status_deserialization() {
        let result = serde_json::from_str::<VerdictStatus>("\"invalid\"");
        assert!(result.is_err());
    }

    // ========================================================================
    // Finding Tests
    // ========================================================================

    #[test]
    fn test_finding_violation() {
        let finding = Finding::violation("Sources/Foo.swift", 5, "unused import");

        assert_eq!(finding.severity, Severity::Warn);
        assert_eq!(finding.check_id, "review.violation");
        assert_eq!(finding.code, CODE_VIOLATION);
        assert_eq!(finding.message, "unused import");

        let location = finding.location.unwrap();
        assert_eq!(location.path, "Sources/Foo.swift");
        assert_eq!(location.line, Some(5));

        let fp = finding.fingerprint.unwrap();
        assert_eq!(fp.len(), 64);
    }

    #[test]
    fn test_finding_fingerprint_is_stable() {
        let a = Finding::violation("a.rs", 1, "m");
        let b = Finding::violation("a.rs", 1, "m");
        assert_eq!(a.fingerprint, b.fingerprint);

        let c = Finding::violation("a.rs", 2, "m");
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn test_finding_without_location_omits_field() {
        let finding = Finding {
            severity: Severity::Error,
            check_id: "scan.execution_failed".to_string(),
            code: CODE_SCAN_FAILED.to_string(),
            message: "scanner exited with status 2".to_string(),
            location: None,
            fingerprint: None,
        };
        let json = serde_json::to_string(&finding).unwrap();
        assert!(!json.contains("location"));
        assert!(!json.contains("fingerprint"));
    }

    // ========================================================================
    // Report Tests
    // ========================================================================

    #[test]
    fn test_report_default() {
        let report = Report::new();

        assert_eq!(report.schema, SCHEMA_ID);
        assert_eq!(report.tool.name, "scanguard");
        assert_eq!(report.verdict.status, VerdictStatus::Pass);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn test_run_default_has_timestamp() {
        let run = Run::default();
        assert!(!run.started_at.is_empty());
        assert!(run.started_at.contains("T"));
        assert!(run.ended_at.is_none());
        assert!(run.duration_ms.is_none());
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let tool = Tool {
            name: "scanguard".to_string(),
            version: "0.3.0".to_string(),
            commit: None,
        };

        let json = serde_json::to_string(&tool).unwrap();
        assert!(!json.contains("commit"));
    }

    #[test]
    fn test_report_data_excluded_files_omitted_when_zero() {
        let data = ReportData::default();
        let json = serde_json::to_string(&data).unwrap();
        assert!(!json.contains("excluded_files_count"));

        let data = ReportData {
            excluded_files_count: 2,
            ..Default::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("excluded_files_count"));
    }

    #[test]
    fn test_report_matches_expected_json_structure() {
        let report = Report {
            schema: SCHEMA_ID.to_string(),
            tool: Tool {
                name: "scanguard".to_string(),
                version: "0.3.0".to_string(),
                commit: None,
            },
            run: Run {
                started_at: "2026-08-01T00:00:00Z".to_string(),
                ended_at: Some("2026-08-01T00:00:01Z".to_string()),
                duration_ms: Some(1000),
            },
            verdict: Verdict {
                status: VerdictStatus::Warn,
                counts: VerdictCounts {
                    info: 0,
                    warn: 2,
                    error: 0,
                },
                reasons: vec![REASON_VIOLATIONS.to_string()],
            },
            findings: vec![
                Finding::violation("Sources/Foo.swift", 5, "unused parameter"),
                Finding::violation("Sources/Bar.swift", 12, "unused import"),
            ],
            data: ReportData {
                violations_total: 7,
                violations_relevant: 2,
                excluded_files_count: 0,
                inputs: Inputs {
                    report_source: "report-file".to_string(),
                    report_file: Some("fixtures/reports/two_violations.xml".to_string()),
                    scanner_cmd: None,
                    diff_source: "diff-file".to_string(),
                    diff_file: Some("fixtures/diff/mixed.patch".to_string()),
                    base: None,
                    head: None,
                },
                truncation: None,
            },
        };

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["schema"], "scanguard.report.v1");
        assert_eq!(json["tool"]["name"], "scanguard");
        assert_eq!(json["verdict"]["status"], "warn");
        assert_eq!(json["verdict"]["counts"]["warn"], 2);
        assert_eq!(json["findings"].as_array().unwrap().len(), 2);
        assert_eq!(json["findings"][0]["severity"], "warn");
        assert_eq!(json["findings"][0]["location"]["path"], "Sources/Foo.swift");
        assert_eq!(json["findings"][0]["location"]["line"], 5);
        assert_eq!(json["data"]["violations_total"], 7);
        assert_eq!(json["data"]["violations_relevant"], 2);
        assert_eq!(json["data"]["inputs"]["report_source"], "report-file");
    }

    #[test]
    fn test_full_report_roundtrip() {
        let report = Report::new();
        let json = serde_json::to_string(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();

        assert_eq!(report.schema, parsed.schema);
        assert_eq!(report.tool.name, parsed.tool.name);
        assert_eq!(report.verdict.status, parsed.verdict.status);
    }

    // ========================================================================
    // Token & Code Hygiene Tests
    // ========================================================================

    #[test]
    fn test_reason_tokens_match_pattern() {
        let reason_re = regex_lite::Regex::new(r"^[a-z0-9_]+$").unwrap();
        let reasons = [
            REASON_VIOLATIONS,
            REASON_NO_RELEVANT,
            REASON_CLEAN_SCAN,
            REASON_TOOL_ERROR,
            REASON_TRUNCATED,
        ];
        for reason in &reasons {
            assert!(reason_re.is_match(reason));
        }
    }

    #[test]
    fn test_code_constants_match_pattern() {
        let code_re = regex_lite::Regex::new(r"^[a-z0-9_.]+$").unwrap();
        let codes = [
            CODE_VIOLATION,
            CODE_INVALID_REPORT,
            CODE_INVALID_DIFF,
            CODE_SCAN_FAILED,
            CODE_RUNTIME_ERROR,
        ];
        for code in &codes {
            assert!(code_re.is_match(code));
        }
    }

    #[test]
    fn test_code_registry_entries_have_valid_codes() {
        let code_re = regex_lite::Regex::new(r"^[a-z0-9_.]+$").unwrap();
        for entry in CODE_REGISTRY {
            assert!(code_re.is_match(entry.code));
        }
    }
}
