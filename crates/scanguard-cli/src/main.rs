//! scanguard wraps a static-analysis scan and surfaces only the findings that fall on lines changed by a reviewed revision, by consuming a checkstyle report and a diff (base<->head or patch) and emitting a canonical receipt plus review comments.
//!
//! This CLI tool decides which scanner findings are worth surfacing during a
//! code review.

use clap::{Parser, Subcommand, ValueEnum};
use scanguard_app::{
    AppError, FailOn as AppFailOn, ScanRequest, ScanResult, dispatch_comments, error_report, scan,
};
use scanguard_config::{
    CliOverrides, FailOn as ConfigFailOn, discover_config, load_config, resolve_config,
};
use scanguard_exec::ProcessScanExecutor;
use scanguard_ports::{ScanExecutor, SystemClock};
use scanguard_render::AnnotationSink;
use scanguard_types::explain;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// scanguard surfaces static-analysis findings that fall on lines changed by a reviewed revision.
#[derive(Parser)]
#[command(name = "scanguard")]
#[command(
    about = "scanguard wraps a static-analysis scan and surfaces only the findings that fall on lines changed by a reviewed revision, by consuming a checkstyle report and a diff (base<->head or patch) and emitting a canonical receipt plus review comments."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// CLI fail-on option
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFailOn {
    Never,
    Violations,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relevance scan
    Scan {
        /// Path to a pre-captured checkstyle report ('-' for stdin)
        #[arg(long)]
        report: Option<String>,

        /// Scanner command to execute (alternative to --report)
        #[arg(long)]
        exec: Option<String>,

        /// Additional argument for the scanner command (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Path to diff/patch file ('-' for stdin)
        #[arg(long)]
        diff_file: Option<String>,

        /// Base git ref (alternative to --diff-file)
        #[arg(long)]
        base: Option<String>,

        /// Head git ref (alternative to --diff-file)
        #[arg(long)]
        head: Option<String>,

        /// Project root for path relativization (default: git toplevel)
        #[arg(long)]
        root: Option<String>,

        /// Output path for receipt JSON
        #[arg(long, default_value = "artifacts/scanguard/report.json")]
        out: String,

        /// Output path for markdown comment
        #[arg(long)]
        md: Option<String>,

        /// Suppress comment dispatch
        #[arg(long)]
        no_comment: bool,

        /// When the scan should fail the review (overrides config file)
        #[arg(long, value_enum)]
        fail_on: Option<CliFailOn>,

        /// Maximum number of violations to surface (overrides config file)
        #[arg(long)]
        max_comments: Option<usize>,

        /// Path to config file (default: auto-discover scanguard.toml)
        #[arg(long, short = 'c')]
        config: Option<String>,

        /// Enable debug logging to stderr
        #[arg(long)]
        verbose: bool,
    },
    /// Explain an error code
    Explain {
        /// Error code to explain
        code: String,
    },
}

/// CLI errors
#[derive(Debug, Error)]
enum CliError {
    #[error("Must provide either --report or a scanner command (--exec or scanner.command)")]
    MissingReportSource,

    #[error("Cannot use --report together with --exec")]
    ConflictingReportSource,

    #[error("Must provide either --diff-file or both --base and --head")]
    MissingDiffSource,

    #[error("Cannot use --diff-file together with --base/--head")]
    ConflictingDiffSource,

    #[error("Only one of --report and --diff-file may read from stdin")]
    StdinConflict,

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirCreate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read stdin: {0}")]
    StdinRead(std::io::Error),

    #[error("Failed to run git diff: {0}")]
    GitDiff(String),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to load config: {0}")]
    ConfigLoad(String),

    #[error("Unknown error code '{0}'")]
    UnknownCode(String),
}

/// Exit codes:
/// - 0: Pass (or warn when not fail-configured)
/// - 1: Tool/runtime error (I/O, parse failure, scanner failure)
/// - 2: Policy fail (fail_on = violations and violations surfaced)
const EXIT_CODE_ERROR: i32 = 1;

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            EXIT_CODE_ERROR
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Commands::Scan {
            report,
            exec,
            args,
            diff_file,
            base,
            head,
            root,
            out,
            md,
            no_comment,
            fail_on,
            max_comments,
            config,
            verbose,
        } => run_scan(ScanArgs {
            report,
            exec,
            args,
            diff_file,
            base,
            head,
            root,
            out,
            md,
            no_comment,
            fail_on,
            max_comments,
            config,
            verbose,
        }),
        Commands::Explain { code } => run_explain(&code),
    }
}

struct ScanArgs {
    report: Option<String>,
    exec: Option<String>,
    args: Vec<String>,
    diff_file: Option<String>,
    base: Option<String>,
    head: Option<String>,
    root: Option<String>,
    out: String,
    md: Option<String>,
    no_comment: bool,
    fail_on: Option<CliFailOn>,
    max_comments: Option<usize>,
    config: Option<String>,
    verbose: bool,
}

fn run_scan(args: ScanArgs) -> Result<i32, CliError> {
    init_tracing(args.verbose);

    // Load configuration
    let loaded_config = if let Some(path) = &args.config {
        Some(load_config(Path::new(path)).map_err(|e| CliError::ConfigLoad(e.to_string()))?)
    } else {
        discover_config().map(|(_, c)| c)
    };

    // Build CLI overrides
    let cli_overrides = CliOverrides {
        fail_on: args.fail_on.map(|f| match f {
            CliFailOn::Never => ConfigFailOn::Never,
            CliFailOn::Violations => ConfigFailOn::Violations,
        }),
        scanner_command: args.exec.clone(),
        scanner_args: if args.args.is_empty() {
            None
        } else {
            Some(args.args.clone())
        },
        post_comments: if args.no_comment { Some(false) } else { None },
        max_comments: args.max_comments,
    };

    // Resolve effective configuration
    let effective = resolve_config(loaded_config.as_ref(), &cli_overrides);

    // Validate report source
    if args.report.is_some() && args.exec.is_some() {
        return Err(CliError::ConflictingReportSource);
    }
    if args.report.is_none() && effective.scanner_command.is_none() {
        return Err(CliError::MissingReportSource);
    }

    // Validate diff source
    let has_refs = args.base.is_some() || args.head.is_some();
    if args.diff_file.is_some() && has_refs {
        return Err(CliError::ConflictingDiffSource);
    }
    if args.diff_file.is_none() && !(args.base.is_some() && args.head.is_some()) {
        return Err(CliError::MissingDiffSource);
    }
    if args.report.as_deref() == Some("-") && args.diff_file.as_deref() == Some("-") {
        return Err(CliError::StdinConflict);
    }

    // Resolve project root for relativization and git invocations
    let repo_root = resolve_repo_root(args.root.clone());
    tracing::debug!(root = %repo_root.display(), "resolved project root");

    // Read the diff
    let (diff_text, diff_file_path) = match &args.diff_file {
        Some(path) if path == "-" => (read_stdin()?, None),
        Some(path) => (read_file(path)?, Some(path.clone())),
        None => {
            let base = args.base.as_deref().unwrap_or_default();
            let head = args.head.as_deref().unwrap_or_default();
            (load_diff_from_git(base, head, &repo_root)?, None)
        }
    };

    // Receipt metadata is needed even when obtaining the report fails
    let scanner_cmd = if args.report.is_none() {
        effective
            .scanner_command
            .as_ref()
            .map(|cmd| command_line(cmd, &effective.scanner_args))
    } else {
        None
    };
    let base_request = ScanRequest {
        report_text: String::new(),
        project_root: repo_root.display().to_string(),
        diff_text,
        report_file_path: args.report.clone().filter(|p| p != "-"),
        scanner_cmd,
        diff_file_path,
        base_ref: args.base.clone(),
        head_ref: args.head.clone(),
        include_patterns: effective.include_patterns.clone(),
        exclude_patterns: effective.exclude_patterns.clone(),
        fail_on: match effective.fail_on {
            ConfigFailOn::Never => AppFailOn::Never,
            ConfigFailOn::Violations => AppFailOn::Violations,
        },
        max_comments: effective.max_comments,
    };

    // Read a pre-captured report up front; scanner execution failures flow
    // into the outcome so they still produce a failure receipt.
    let pre_report = match &args.report {
        Some(path) if path == "-" => Some(read_stdin()?),
        Some(path) => Some(read_file(path)?),
        None => None,
    };

    let outcome: Result<ScanResult, AppError> = match pre_report {
        Some(report_text) => Ok(report_text),
        None => run_scanner(&effective),
    }
    .and_then(|report_text| {
        let mut request = base_request.clone();
        request.report_text = report_text;
        scan(request)
    });

    // Write the receipt (also on failure, so CI always has a document)
    let receipt = match &outcome {
        Ok(result) => result.report.clone(),
        Err(error) => error_report(&base_request, error, &SystemClock),
    };
    write_output(&args.out, &format!("{}\n", serde_json::to_string_pretty(&receipt)?))?;
    tracing::debug!(out = %args.out, "wrote receipt");

    // Write the markdown comment when requested
    if let Some(md_path) = &args.md
        && let Ok(result) = &outcome
    {
        write_output(md_path, &result.markdown)?;
    }

    // Dispatch review comments as workflow annotations on stdout
    let mut sink = AnnotationSink::new();
    dispatch_comments(&outcome, &mut sink, effective.post_comments);
    if !sink.is_empty() {
        print!("{}", sink.output());
    }

    match outcome {
        Ok(result) => Ok(result.exit_code),
        Err(error) => {
            eprintln!("error: {}", error);
            Ok(EXIT_CODE_ERROR)
        }
    }
}

fn run_explain(code: &str) -> Result<i32, CliError> {
    let info = explain(code).ok_or_else(|| CliError::UnknownCode(code.to_string()))?;

    println!("{} ({})", info.code, info.name);
    println!();
    println!("{}", info.full_description);
    println!();
    println!("Remediation: {}", info.remediation);
    println!("Help: {}", info.help_uri);

    Ok(0)
}

// ============================================================================
// Input Helpers
// ============================================================================

/// Run the configured scanner and capture its report output.
fn run_scanner(effective: &scanguard_config::EffectiveConfig) -> Result<String, AppError> {
    let command = effective
        .scanner_command
        .as_deref()
        .expect("report source validated before dispatch");
    let executor = ProcessScanExecutor::new(command, &effective.scanner_args)
        .map_err(|e| AppError::ScanExecution(e.to_string()))?;
    tracing::debug!(command = executor.command_line(), "running scanner");
    Ok(executor.execute()?)
}

fn command_line(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}

fn read_file(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::FileRead {
        path: path.to_string(),
        source,
    })
}

fn read_stdin() -> Result<String, CliError> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(CliError::StdinRead)?;
    Ok(buffer)
}

fn write_output(path: &str, content: &str) -> Result<(), CliError> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| CliError::DirCreate {
            path: parent.display().to_string(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| CliError::FileWrite {
        path: path.to_string(),
        source,
    })
}

// ============================================================================
// Git Helpers
// ============================================================================

/// Resolve the project root: explicit flag, then `git rev-parse
/// --show-toplevel`, then the current directory.
fn resolve_repo_root(cli_root: Option<String>) -> PathBuf {
    if let Some(root) = cli_root {
        return PathBuf::from(root);
    }

    if let Ok(output) = std::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        && output.status.success()
        && let Ok(stdout) = String::from_utf8(output.stdout)
    {
        let trimmed = stdout.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load a unified diff between two refs via `git diff`.
fn load_diff_from_git(base: &str, head: &str, repo_root: &Path) -> Result<String, CliError> {
    let range = format!("{}...{}", base, head);
    let output = std::process::Command::new("git")
        .current_dir(repo_root)
        .args(["diff", "--no-color", &range])
        .output()
        .map_err(|e| CliError::GitDiff(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CliError::GitDiff(stderr));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| CliError::GitDiff("git produced non-UTF-8 diff output".to_string()))
}

// ============================================================================
// Logging
// ============================================================================

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
