//! Configuration parsing and management for scanguard.
//!
//! This crate provides:
//! - Configuration types (`Config` and its sections)
//! - TOML parsing and validation
//! - Upward discovery of `scanguard.toml`
//! - Precedence handling (CLI > config file > defaults)

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Determines when the scan should fail the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    /// Never fail on findings; surface them as warnings only.
    #[default]
    Never,
    /// Fail the scan when any relevant violation is surfaced.
    Violations,
}

/// Scanner invocation configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScannerConfig {
    /// Executable invocation, split on whitespace (e.g. "swift run periphery").
    #[serde(default)]
    pub command: Option<String>,
    /// Additional arguments appended to the command.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Comment dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentsConfig {
    /// Whether to post review comments at all.
    #[serde(default = "default_true")]
    pub post: bool,
    /// Maximum number of violations to surface as comments.
    #[serde(default)]
    pub max: Option<usize>,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            post: true,
            max: None,
        }
    }
}

/// Path filtering configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathConfig {
    /// Glob patterns for files/directories to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Glob patterns for files/directories to include (allowlist).
    /// If empty, all files are included.
    #[serde(default)]
    pub include: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Full configuration for scanguard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Determines when the scan should fail the review.
    #[serde(default)]
    pub fail_on: Option<FailOn>,

    /// Scanner invocation configuration.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Comment dispatch configuration.
    #[serde(default)]
    pub comments: CommentsConfig,

    /// Path filtering configuration.
    #[serde(default)]
    pub paths: PathConfig,
}

// ============================================================================
// Effective Configuration
// ============================================================================

/// Effective configuration with all values resolved.
///
/// This represents the final configuration after applying:
/// 1. Defaults
/// 2. Config file values
/// 3. CLI overrides
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub fail_on: FailOn,
    pub scanner_command: Option<String>,
    pub scanner_args: Vec<String>,
    pub post_comments: bool,
    pub max_comments: Option<usize>,
    pub exclude_patterns: Vec<String>,
    pub include_patterns: Vec<String>,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            fail_on: FailOn::Never,
            scanner_command: None,
            scanner_args: vec![],
            post_comments: true,
            max_comments: None,
            exclude_patterns: vec![],
            include_patterns: vec![],
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if let Some(command) = &config.scanner.command
        && command.trim().is_empty()
    {
        return Err(ConfigError::InvalidValue(
            "scanner.command must not be empty".to_string(),
        ));
    }
    if config.comments.max == Some(0) {
        return Err(ConfigError::InvalidValue(
            "comments.max must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Try to find and load configuration from the standard location.
///
/// Searches for `scanguard.toml` in the current directory and parent
/// directories.
pub fn discover_config() -> Option<(std::path::PathBuf, Config)> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join("scanguard.toml");
        if config_path.exists()
            && let Ok(config) = load_config(&config_path)
        {
            return Some((config_path, config));
        }

        if !current.pop() {
            break;
        }
    }

    None
}

// ============================================================================
// Precedence Resolution
// ============================================================================

/// CLI override options.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub fail_on: Option<FailOn>,
    pub scanner_command: Option<String>,
    pub scanner_args: Option<Vec<String>>,
    pub post_comments: Option<bool>,
    pub max_comments: Option<usize>,
}

/// Resolve effective configuration from config file and CLI overrides.
///
/// Precedence: CLI > config file > defaults
pub fn resolve_config(config: Option<&Config>, cli: &CliOverrides) -> EffectiveConfig {
    let mut effective = EffectiveConfig::default();

    // Apply config file values
    if let Some(config) = config {
        if let Some(fail_on) = config.fail_on {
            effective.fail_on = fail_on;
        }
        if let Some(command) = &config.scanner.command {
            effective.scanner_command = Some(command.clone());
        }
        effective.scanner_args = config.scanner.args.clone();
        effective.post_comments = config.comments.post;
        effective.max_comments = config.comments.max;
        effective.exclude_patterns = config.paths.exclude.clone();
        effective.include_patterns = config.paths.include.clone();
    }

    // Apply CLI overrides
    if let Some(fail_on) = cli.fail_on {
        effective.fail_on = fail_on;
    }
    if let Some(command) = &cli.scanner_command {
        effective.scanner_command = Some(command.clone());
    }
    if let Some(args) = &cli.scanner_args {
        effective.scanner_args = args.clone();
    }
    if let Some(post) = cli.post_comments {
        effective.post_comments = post;
    }
    if let Some(max) = cli.max_comments {
        effective.max_comments = Some(max);
    }

    effective
}

// ============================================================================
// Path Filtering
// ============================================================================

/// Check if a path matches any of the given glob patterns.
pub fn matches_any_pattern(path: &str, patterns: &[String]) -> bool {
    for pattern in patterns {
        if let Ok(glob_pattern) = glob::Pattern::new(pattern)
            && glob_pattern.matches(path)
        {
            return true;
        }
    }
    false
}

/// Filter a path based on include/exclude patterns.
///
/// Returns `true` if violations in the path should be surfaced.
pub fn should_include_path(
    path: &str,
    include_patterns: &[String],
    exclude_patterns: &[String],
) -> bool {
    // If exclude patterns match, exclude the path
    if matches_any_pattern(path, exclude_patterns) {
        return false;
    }

    // If include patterns are specified and path doesn't match, exclude it
    if !include_patterns.is_empty() && !matches_any_pattern(path, include_patterns) {
        return false;
    }

    true
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config("").unwrap();
        assert!(config.fail_on.is_none());
        assert!(config.scanner.command.is_none());
        assert!(config.scanner.args.is_empty());
        assert!(config.comments.post);
        assert!(config.comments.max.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
fail_on = "violations"

[scanner]
command = "periphery scan"
args = ["--format", "checkstyle"]

[comments]
post = false
max = 25

[paths]
exclude = ["vendor/**", "Generated/**"]
include = ["Sources/**"]
"#;
        let config = parse_config(toml).unwrap();

        assert_eq!(config.fail_on, Some(FailOn::Violations));
        assert_eq!(config.scanner.command.as_deref(), Some("periphery scan"));
        assert_eq!(config.scanner.args, vec!["--format", "checkstyle"]);
        assert!(!config.comments.post);
        assert_eq!(config.comments.max, Some(25));
        assert_eq!(config.paths.exclude, vec!["vendor/**", "Generated/**"]);
        assert_eq!(config.paths.include, vec!["Sources/**"]);
    }

    #[test]
    fn test_parse_invalid_fail_on() {
        let result = parse_config("fail_on = \"sometimes\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_scanner_command_is_invalid() {
        let result = parse_config("[scanner]\ncommand = \"  \"");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_zero_max_comments_is_invalid() {
        let result = parse_config("[comments]\nmax = 0");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanguard.toml");
        std::fs::write(&path, "[scanner]\ncommand = \"periphery scan\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.scanner.command.as_deref(), Some("periphery scan"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/scanguard.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    // ------------------------------------------------------------------------
    // Precedence Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_config_no_config() {
        let effective = resolve_config(None, &CliOverrides::default());

        assert_eq!(effective.fail_on, FailOn::Never);
        assert!(effective.scanner_command.is_none());
        assert!(effective.post_comments);
        assert!(effective.max_comments.is_none());
    }

    #[test]
    fn test_resolve_config_file_values_apply() {
        let config = parse_config(
            "fail_on = \"violations\"\n[comments]\npost = false\nmax = 10\n",
        )
        .unwrap();

        let effective = resolve_config(Some(&config), &CliOverrides::default());

        assert_eq!(effective.fail_on, FailOn::Violations);
        assert!(!effective.post_comments);
        assert_eq!(effective.max_comments, Some(10));
    }

    #[test]
    fn test_resolve_config_cli_overrides_file() {
        let config = parse_config("[scanner]\ncommand = \"periphery scan\"\n").unwrap();
        let cli = CliOverrides {
            scanner_command: Some("periphery scan --strict".to_string()),
            post_comments: Some(false),
            ..Default::default()
        };

        let effective = resolve_config(Some(&config), &cli);

        assert_eq!(
            effective.scanner_command.as_deref(),
            Some("periphery scan --strict")
        );
        assert!(!effective.post_comments);
    }

    #[test]
    fn test_resolve_config_cli_args_replace_file_args() {
        let config = parse_config("[scanner]\nargs = [\"--format\", \"checkstyle\"]\n").unwrap();
        let cli = CliOverrides {
            scanner_args: Some(vec!["--quiet".to_string()]),
            ..Default::default()
        };

        let effective = resolve_config(Some(&config), &cli);
        assert_eq!(effective.scanner_args, vec!["--quiet"]);
    }

    // ------------------------------------------------------------------------
    // Path Filtering Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_matches_any_pattern() {
        assert!(matches_any_pattern(
            "vendor/lib/foo.swift",
            &["vendor/**".to_string()]
        ));
        assert!(!matches_any_pattern(
            "Sources/foo.swift",
            &["vendor/**".to_string()]
        ));
    }

    #[test]
    fn test_should_include_path() {
        let exclude = vec!["vendor/**".to_string(), "Generated/**".to_string()];
        let include = vec![];

        assert!(should_include_path("Sources/Foo.swift", &include, &exclude));
        assert!(!should_include_path("vendor/Dep.swift", &include, &exclude));
        assert!(!should_include_path(
            "Generated/Models.swift",
            &include,
            &exclude
        ));
    }

    #[test]
    fn test_should_include_path_with_allowlist() {
        let exclude = vec![];
        let include = vec!["Sources/**".to_string()];

        assert!(should_include_path("Sources/Foo.swift", &include, &exclude));
        assert!(!should_include_path("Tests/FooTests.swift", &include, &exclude));
    }
}
