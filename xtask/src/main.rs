//! xtask - Development tasks for scanguard
//!
//! This crate provides utilities for:
//! - Receipt schema validation
//! - Validating report.json files against the schema
//! - Golden fixture checks

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use jsonschema::Validator;
use std::fs;
use std::path::{Path, PathBuf};

use scanguard_types::CODE_REGISTRY;

/// Development tasks for scanguard
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tasks for scanguard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the receipt schema is itself a valid JSON Schema
    Schema,

    /// Validate a report.json file against the schema
    Validate {
        /// Path to the report.json file to validate
        report_path: PathBuf,

        /// Path to custom schema file (defaults to schemas/scanguard.report.v1.json)
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Check golden fixtures in fixtures/expected/ against the schema
    Fixtures {
        /// Exit non-zero on the first invalid fixture
        #[arg(long)]
        check: bool,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Schema => check_schema(),
        Commands::Validate {
            report_path,
            schema,
        } => validate_report(&report_path, schema.as_deref()),
        Commands::Fixtures { check } => check_fixtures(check),
    }
}

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn default_schema_path() -> PathBuf {
    workspace_root().join("schemas/scanguard.report.v1.json")
}

fn load_validator(schema_path: &Path) -> Result<Validator> {
    let schema_text = fs::read_to_string(schema_path)
        .with_context(|| format!("reading schema {}", schema_path.display()))?;
    let schema_json: serde_json::Value = serde_json::from_str(&schema_text)
        .with_context(|| format!("parsing schema {}", schema_path.display()))?;
    jsonschema::validator_for(&schema_json)
        .with_context(|| format!("compiling schema {}", schema_path.display()))
}

fn check_schema() -> Result<()> {
    let path = default_schema_path();
    load_validator(&path)?;
    println!("ok: {} compiles as a JSON Schema", path.display());
    Ok(())
}

fn validate_instance(
    validator: &Validator,
    instance: &serde_json::Value,
    label: &str,
) -> Result<()> {
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("  {} at {}", e, e.instance_path))
        .collect();
    if !errors.is_empty() {
        bail!("{} is invalid:\n{}", label, errors.join("\n"));
    }
    Ok(())
}

fn validate_report(report_path: &Path, schema_path: Option<&Path>) -> Result<()> {
    let schema_path = schema_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_schema_path);
    let validator = load_validator(&schema_path)?;

    let report_text = fs::read_to_string(report_path)
        .with_context(|| format!("reading report {}", report_path.display()))?;
    let report: serde_json::Value = serde_json::from_str(&report_text)
        .with_context(|| format!("parsing report {}", report_path.display()))?;

    validate_instance(&validator, &report, &report_path.display().to_string())?;
    check_finding_codes(&report, &report_path.display().to_string())?;
    println!(
        "ok: {} conforms to scanguard.report.v1",
        report_path.display()
    );
    Ok(())
}

/// Every finding code in a receipt must be a registered code.
fn check_finding_codes(report: &serde_json::Value, label: &str) -> Result<()> {
    let registered: Vec<&str> = CODE_REGISTRY.iter().map(|info| info.code).collect();
    if let Some(findings) = report.get("findings").and_then(|f| f.as_array()) {
        for finding in findings {
            if let Some(code) = finding.get("code").and_then(|c| c.as_str())
                && !registered.contains(&code)
            {
                bail!("{}: unregistered finding code '{}'", label, code);
            }
        }
    }
    Ok(())
}

fn check_fixtures(check: bool) -> Result<()> {
    let dir = workspace_root().join("fixtures/expected");
    if !dir.exists() {
        bail!("fixtures directory {} does not exist", dir.display());
    }
    let validator = load_validator(&default_schema_path())?;

    let mut failures = Vec::new();
    let mut checked = 0usize;
    for entry in fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        checked += 1;
        let label = path.display().to_string();
        let result = fs::read_to_string(&path)
            .with_context(|| format!("reading fixture {}", label))
            .and_then(|text| {
                serde_json::from_str::<serde_json::Value>(&text)
                    .with_context(|| format!("parsing fixture {}", label))
            })
            .and_then(|fixture| {
                validate_instance(&validator, &fixture, &label)?;
                check_finding_codes(&fixture, &label)
            });
        match result {
            Ok(()) => println!("ok: {}", label),
            Err(e) => failures.push(format!("{e:#}")),
        }
    }

    if checked == 0 {
        bail!("no fixtures found in {}", dir.display());
    }
    if !failures.is_empty() {
        if check {
            bail!(
                "{} invalid fixture(s):\n{}",
                failures.len(),
                failures.join("\n")
            );
        }
        for failure in &failures {
            eprintln!("warning: {}", failure);
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
