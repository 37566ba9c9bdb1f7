//! Shared port traits for scanguard's hexagonal architecture.

use scanguard_types::FileChange;
use thiserror::Error;

/// Failure to resolve a file's change record.
///
/// A lookup failure is a routine outcome, not an error condition: most files
/// in a repository are untouched by any given revision. Callers degrade it to
/// "not relevant" rather than propagating it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffLookupError {
    /// The file has no change record in the reviewed revision.
    #[error("file '{0}' was not touched by the reviewed revision")]
    NotTouched(String),

    /// The provider could not produce a diff at all.
    #[error("diff unavailable: {0}")]
    Unavailable(String),
}

/// Failure to run the external analysis tool.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The scanner process could not be spawned.
    #[error("failed to launch scanner '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The scanner exited with a non-zero status.
    #[error("scanner '{command}' exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: String,
        stderr: String,
    },

    /// The scanner produced output that is not valid UTF-8.
    #[error("scanner '{command}' produced non-UTF-8 output")]
    InvalidOutput { command: String },
}

/// Port for resolving the change status of a single file.
pub trait DiffProvider {
    /// Return the `FileChange` for `path`, or a lookup failure when the file
    /// has no change record.
    fn diff_for_file(&self, path: &str) -> Result<FileChange, DiffLookupError>;
}

/// Port for running the external analysis tool and capturing its report.
pub trait ScanExecutor {
    /// Run the scanner and return the raw report text.
    fn execute(&self) -> Result<String, ExecutionError>;
}

/// Port for dispatching review comments.
pub trait CommentSink {
    /// Post an inline warning tied to a file and line.
    fn warn(&mut self, message: &str, file: &str, line: u32);

    /// Post a single scan-level failure message.
    fn fail(&mut self, message: &str);
}

/// Port for obtaining the current UTC time.
pub trait Clock {
    /// Returns the current time in UTC.
    fn now(&self) -> chrono::DateTime<chrono::Utc>;
}

/// System clock implementation that returns the actual current time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}
