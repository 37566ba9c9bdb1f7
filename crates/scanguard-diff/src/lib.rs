//! Diff parsing adapter for scanguard.
//!
//! This crate parses unified diff text (as produced by `git diff`) into the
//! four-variant [`FileChange`] model, and provides [`PatchDiffProvider`], the
//! concrete [`DiffProvider`] used to answer per-file change lookups.

use std::collections::BTreeMap;

use scanguard_ports::{DiffLookupError, DiffProvider};
use scanguard_types::{FileChange, Hunk};
use thiserror::Error;

// ============================================================================
// Types
// ============================================================================

/// Map of normalized file paths to their change classification.
pub type ChangeMap = BTreeMap<String, FileChange>;

/// Errors that can occur during diff parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// The diff format is invalid or malformed.
    #[error("invalid diff format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// Path Normalization
// ============================================================================

/// Normalize a path from a diff header to repo-relative format.
///
/// - Strips `b/` prefix (git diff convention)
/// - Strips `a/` prefix
/// - Converts backslashes to forward slashes
/// - Removes leading `./`
///
/// # Examples
///
/// ```
/// use scanguard_diff::normalize_path;
///
/// assert_eq!(normalize_path("b/src/lib.rs"), "src/lib.rs");
/// assert_eq!(normalize_path("a/src/lib.rs"), "src/lib.rs");
/// assert_eq!(normalize_path("./src/lib.rs"), "src/lib.rs");
/// assert_eq!(normalize_path("src\\lib.rs"), "src/lib.rs");
/// ```
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();

    let path = path.replace('\\', "/");

    let path = path
        .strip_prefix("b/")
        .or_else(|| path.strip_prefix("a/"))
        .unwrap_or(&path);

    let path = path.strip_prefix("./").unwrap_or(path);

    path.to_string()
}

// ============================================================================
// Diff Parsing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EntryKind {
    #[default]
    Plain,
    Created,
    Deleted,
    Renamed,
}

/// One file section of the diff, accumulated until the next section starts.
#[derive(Debug, Default)]
struct Entry {
    kind: EntryKind,
    old_path: Option<String>,
    new_path: Option<String>,
    saw_new_side: bool,
    hunks: Vec<Hunk>,
}

impl Entry {
    fn finish(self, changes: &mut ChangeMap) {
        match self.kind {
            EntryKind::Created => {
                if let Some(path) = self.new_path.or(self.old_path) {
                    changes.insert(path, FileChange::Created);
                }
            }
            EntryKind::Deleted => {
                if let Some(path) = self.old_path.or(self.new_path) {
                    changes.insert(path, FileChange::Deleted);
                }
            }
            EntryKind::Renamed => {
                // A rename carries no line data: hunks are discarded so the
                // exclusion from relevance is structural.
                if let Some(path) = self.new_path.or(self.old_path) {
                    changes.insert(path, FileChange::Renamed);
                }
            }
            EntryKind::Plain => {
                if let Some(path) = self.new_path.clone().or(self.old_path.clone()) {
                    changes.insert(path, FileChange::Modified(self.hunks));
                }
            }
        }
    }
}

/// Parse a unified diff/patch into a per-file change classification.
///
/// Handles the standard output of `git diff` as well as plain `---`/`+++`
/// unified diffs:
///
/// - `new file mode` headers classify the file as [`FileChange::Created`]
/// - `deleted file mode` headers (or a `+++ /dev/null` side) as
///   [`FileChange::Deleted`]
/// - `rename from`/`rename to` headers as [`FileChange::Renamed`], keyed by
///   the new name
/// - everything else as [`FileChange::Modified`] with one [`Hunk`] per `@@`
///   header, spanning the header's new-side range (a zero-count new side
///   contributes no hunk)
///
/// # Errors
///
/// Returns [`DiffError::InvalidFormat`] for malformed hunk headers.
///
/// # Examples
///
/// ```
/// use scanguard_diff::parse_patch;
/// use scanguard_types::FileChange;
///
/// let diff = r#"diff --git a/src/lib.rs b/src/lib.rs
/// index 1111111..2222222 100644
/// --- a/src/lib.rs
/// +++ b/src/lib.rs
/// @@ -10,3 +10,4 @@
///  fn main() {
/// +    new_line();
///  }
/// "#;
///
/// let changes = parse_patch(diff).unwrap();
/// let FileChange::Modified(hunks) = &changes["src/lib.rs"] else {
///     panic!("expected modified");
/// };
/// assert!(hunks[0].contains(10));
/// assert!(hunks[0].contains(13));
/// assert!(!hunks[0].contains(14));
/// ```
pub fn parse_patch(text: &str) -> Result<ChangeMap, DiffError> {
    // Normalize line endings (handle CRLF)
    let text = text.replace("\r\n", "\n");

    let mut changes: ChangeMap = BTreeMap::new();
    let mut current: Option<Entry> = None;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            if let Some(entry) = current.take() {
                entry.finish(&mut changes);
            }
            let mut parts = rest.split_whitespace();
            let a = parts.next().map(normalize_path);
            let b = parts.next().map(normalize_path);
            current = Some(Entry {
                old_path: a,
                new_path: b,
                ..Entry::default()
            });
            continue;
        }

        if line.starts_with("new file mode") {
            if let Some(entry) = current.as_mut() {
                entry.kind = EntryKind::Created;
            }
            continue;
        }

        if line.starts_with("deleted file mode") {
            if let Some(entry) = current.as_mut() {
                entry.kind = EntryKind::Deleted;
            }
            continue;
        }

        if line.starts_with("rename from ") {
            if let Some(entry) = current.as_mut() {
                entry.kind = EntryKind::Renamed;
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("rename to ") {
            if let Some(entry) = current.as_mut() {
                entry.kind = EntryKind::Renamed;
                entry.new_path = Some(normalize_path(rest));
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("--- ") {
            // A plain unified diff has no "diff --git" separator: a new
            // old-side header after a completed section starts a new entry.
            if current.as_ref().is_some_and(|e| e.saw_new_side) {
                if let Some(entry) = current.take() {
                    entry.finish(&mut changes);
                }
            }
            let entry = current.get_or_insert_with(Entry::default);
            let path = rest.trim();
            if path != "/dev/null" {
                entry.old_path = Some(normalize_path(path));
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("+++ ") {
            let entry = current.get_or_insert_with(Entry::default);
            entry.saw_new_side = true;
            let path = rest.trim();
            if path == "/dev/null" {
                entry.kind = EntryKind::Deleted;
            } else if entry.kind != EntryKind::Renamed {
                entry.new_path = Some(normalize_path(path));
            }
            continue;
        }

        if line.starts_with("@@ ") || line == "@@" {
            let Some(entry) = current.as_mut() else {
                continue;
            };
            if entry.kind == EntryKind::Deleted {
                continue;
            }
            let (start, count) = parse_hunk_header(line).ok_or_else(|| {
                DiffError::InvalidFormat(format!("malformed hunk header: '{}'", line))
            })?;
            if count > 0 {
                entry.hunks.push(Hunk::new(start, start.saturating_add(count - 1)));
            }
            continue;
        }

        // Content, index, mode, similarity, and binary marker lines carry
        // nothing the change classification needs.
    }

    if let Some(entry) = current.take() {
        entry.finish(&mut changes);
    }

    Ok(changes)
}

/// Parse a hunk header and return the new-side `(start, count)` pair.
///
/// Hunk headers have the format: `@@ -old_start,old_count +new_start,new_count @@ optional context`
/// or: `@@ -old_start +new_start @@` (count defaults to 1)
fn parse_hunk_header(line: &str) -> Option<(u32, u32)> {
    for part in line.split_whitespace() {
        if let Some(new_part) = part.strip_prefix('+') {
            let mut fields = new_part.split(',');
            let start: u32 = fields.next()?.parse().ok()?;
            let count: u32 = match fields.next() {
                Some(raw) => raw.parse().ok()?,
                None => 1,
            };
            return Some((start, count));
        }
    }
    None
}

// ============================================================================
// Diff Provider
// ============================================================================

/// A [`DiffProvider`] backed by a parsed change map.
///
/// Lookups use the violation's file path verbatim; a miss is the routine
/// "file not touched" outcome, reported as [`DiffLookupError::NotTouched`].
#[derive(Debug, Clone, Default)]
pub struct PatchDiffProvider {
    changes: ChangeMap,
}

impl PatchDiffProvider {
    /// Wrap an already-parsed change map.
    pub fn new(changes: ChangeMap) -> Self {
        Self { changes }
    }

    /// Parse unified diff text into a provider.
    pub fn from_patch(text: &str) -> Result<Self, DiffError> {
        Ok(Self::new(parse_patch(text)?))
    }

    /// The underlying change map.
    pub fn changes(&self) -> &ChangeMap {
        &self.changes
    }
}

impl DiffProvider for PatchDiffProvider {
    fn diff_for_file(&self, path: &str) -> Result<FileChange, DiffLookupError> {
        self.changes
            .get(path)
            .cloned()
            .ok_or_else(|| DiffLookupError::NotTouched(path.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property Tests
// ============================================================================
