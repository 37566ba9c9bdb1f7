//! Subprocess scan-execution adapter for scanguard.
//!
//! Runs the external analysis tool and captures its report output. Argument
//! assembly is the caller's concern; this adapter only launches the process
//! and maps failures to [`ExecutionError`].

use std::process::Command;

use scanguard_ports::{ExecutionError, ScanExecutor};
use thiserror::Error;

/// The scanner command was empty.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("scanner command is empty")]
pub struct EmptyCommand;

/// A [`ScanExecutor`] that runs the scanner as a child process.
///
/// The command string is split on whitespace so multi-word invocations like
/// `swift run periphery` work as a single configuration value; `args` are
/// appended verbatim after the split command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessScanExecutor {
    program: String,
    args: Vec<String>,
    display: String,
}

impl ProcessScanExecutor {
    /// Build an executor from a command string and extra arguments.
    pub fn new(command: &str, extra_args: &[String]) -> Result<Self, EmptyCommand> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(EmptyCommand)?;
        let mut args: Vec<String> = words.collect();
        args.extend(extra_args.iter().cloned());

        let display = if args.is_empty() {
            program.clone()
        } else {
            format!("{} {}", program, args.join(" "))
        };

        Ok(Self {
            program,
            args,
            display,
        })
    }

    /// The full command line, for receipts and error messages.
    pub fn command_line(&self) -> &str {
        &self.display
    }
}

impl ScanExecutor for ProcessScanExecutor {
    fn execute(&self) -> Result<String, ExecutionError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| ExecutionError::Launch {
                command: self.display.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ExecutionError::NonZeroExit {
                command: self.display.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ExecutionError::InvalidOutput {
            command: self.display.clone(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_is_rejected() {
        assert_eq!(ProcessScanExecutor::new("", &[]), Err(EmptyCommand));
        assert_eq!(ProcessScanExecutor::new("   ", &[]), Err(EmptyCommand));
    }

    #[test]
    fn test_command_line_splits_on_whitespace() {
        let exec =
            ProcessScanExecutor::new("swift run periphery", &["--format".to_string()]).unwrap();
        assert_eq!(exec.command_line(), "swift run periphery --format");
    }

    #[test]
    fn test_execute_captures_stdout() {
        let exec = ProcessScanExecutor::new("echo hello world", &[]).unwrap();
        let output = exec.execute().unwrap();
        assert_eq!(output.trim(), "hello world");
    }

    #[test]
    fn test_execute_missing_program_is_launch_error() {
        let exec = ProcessScanExecutor::new("scanguard-no-such-binary-xyz", &[]).unwrap();
        let err = exec.execute().unwrap_err();
        assert!(matches!(err, ExecutionError::Launch { .. }));
    }

    #[test]
    fn test_execute_nonzero_exit_carries_stderr() {
        // `sh -c` gives a portable non-zero exit with stderr output
        let exec =
            ProcessScanExecutor::new("sh", &["-c".to_string(), "echo boom >&2; exit 3".to_string()])
                .unwrap();
        let err = exec.execute().unwrap_err();
        match err {
            ExecutionError::NonZeroExit { stderr, .. } => {
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected NonZeroExit, got {:?}", other),
        }
    }
}
