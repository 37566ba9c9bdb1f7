//! Pure relevance-decision logic for scanguard.
//!
//! This crate decides, for each violation the scanner reported, whether it
//! falls inside the set of lines actually changed by the reviewed revision.
//! It has no side effects and raises no errors of its own: a diff lookup
//! failure means the file was not touched and degrades to "not relevant".

use scanguard_ports::DiffProvider;
use scanguard_types::{FileChange, Violation};

/// Decide whether a single violation should be surfaced.
///
/// The violation's `file_path` is used verbatim as the lookup key. A lookup
/// failure is the routine "file not part of the reviewed change" outcome and
/// is never escalated.
///
/// Decision table when the lookup succeeds:
///
/// | change   | decision                                      |
/// |----------|-----------------------------------------------|
/// | created  | relevant (every line of a new file is new)    |
/// | deleted  | not relevant                                  |
/// | renamed  | not relevant                                  |
/// | modified | relevant iff some hunk contains the line      |
pub fn is_relevant<P: DiffProvider>(violation: &Violation, diff: &P) -> bool {
    let Ok(change) = diff.diff_for_file(&violation.file_path) else {
        return false;
    };

    match change {
        FileChange::Created => true,
        FileChange::Deleted => false,
        FileChange::Renamed => false,
        FileChange::Modified(hunks) => hunks.iter().any(|hunk| hunk.contains(violation.line)),
    }
}

/// Apply [`is_relevant`] across a violation list, keeping report order.
///
/// Stable filter: no reordering, no deduplication.
pub fn filter_relevant<P: DiffProvider>(violations: Vec<Violation>, diff: &P) -> Vec<Violation> {
    violations
        .into_iter()
        .filter(|violation| is_relevant(violation, diff))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use scanguard_ports::DiffLookupError;
    use scanguard_types::Hunk;
    use std::collections::BTreeMap;

    /// A diff provider backed by a plain map; anything absent is a lookup
    /// failure, mirroring how a real provider behaves for untouched files.
    struct MapProvider {
        changes: BTreeMap<String, FileChange>,
    }

    impl MapProvider {
        fn new(entries: Vec<(&str, FileChange)>) -> Self {
            Self {
                changes: entries
                    .into_iter()
                    .map(|(path, change)| (path.to_string(), change))
                    .collect(),
            }
        }
    }

    impl DiffProvider for MapProvider {
        fn diff_for_file(&self, path: &str) -> Result<FileChange, DiffLookupError> {
            self.changes
                .get(path)
                .cloned()
                .ok_or_else(|| DiffLookupError::NotTouched(path.to_string()))
        }
    }

    /// A provider whose every lookup fails outright, as when no diff could
    /// be produced at all.
    struct BrokenProvider;

    impl DiffProvider for BrokenProvider {
        fn diff_for_file(&self, _path: &str) -> Result<FileChange, DiffLookupError> {
            Err(DiffLookupError::Unavailable("no diff".to_string()))
        }
    }

    fn violation(path: &str, line: u32) -> Violation {
        Violation::new(path, line, "finding")
    }

    // ------------------------------------------------------------------------
    // Decision Table Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_created_file_is_relevant_regardless_of_line() {
        let provider = MapProvider::new(vec![("Sources/New.swift", FileChange::Created)]);

        for line in [1, 5, 100, u32::MAX] {
            assert!(is_relevant(&violation("Sources/New.swift", line), &provider));
        }
    }

    #[test]
    fn test_deleted_file_is_not_relevant_regardless_of_line() {
        let provider = MapProvider::new(vec![("Sources/Gone.swift", FileChange::Deleted)]);

        for line in [1, 5, 100] {
            assert!(!is_relevant(&violation("Sources/Gone.swift", line), &provider));
        }
    }

    #[test]
    fn test_renamed_file_is_not_relevant_regardless_of_line() {
        let provider = MapProvider::new(vec![("Sources/Moved.swift", FileChange::Renamed)]);

        for line in [1, 5, 100] {
            assert!(!is_relevant(&violation("Sources/Moved.swift", line), &provider));
        }
    }

    #[test]
    fn test_modified_file_boundary_lines() {
        let provider = MapProvider::new(vec![(
            "Sources/Edited.swift",
            FileChange::Modified(vec![Hunk::new(10, 20)]),
        )]);

        assert!(is_relevant(&violation("Sources/Edited.swift", 10), &provider));
        assert!(is_relevant(&violation("Sources/Edited.swift", 20), &provider));
        assert!(!is_relevant(&violation("Sources/Edited.swift", 9), &provider));
        assert!(!is_relevant(&violation("Sources/Edited.swift", 21), &provider));
    }

    #[test]
    fn test_modified_file_any_hunk_matches() {
        let provider = MapProvider::new(vec![(
            "a.rs",
            FileChange::Modified(vec![Hunk::new(1, 3), Hunk::new(40, 45)]),
        )]);

        assert!(is_relevant(&violation("a.rs", 2), &provider));
        assert!(is_relevant(&violation("a.rs", 42), &provider));
        assert!(!is_relevant(&violation("a.rs", 20), &provider));
    }

    #[test]
    fn test_modified_file_without_hunks_is_not_relevant() {
        let provider = MapProvider::new(vec![("a.rs", FileChange::Modified(vec![]))]);
        assert!(!is_relevant(&violation("a.rs", 1), &provider));
    }

    // ------------------------------------------------------------------------
    // Lookup Failure Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_untouched_file_is_not_relevant() {
        let provider = MapProvider::new(vec![("a.rs", FileChange::Created)]);
        assert!(!is_relevant(&violation("b.rs", 1), &provider));
    }

    #[test]
    fn test_unavailable_diff_degrades_to_not_relevant() {
        // A failed lookup never escalates into an error
        assert!(!is_relevant(&violation("a.rs", 1), &BrokenProvider));
        assert!(filter_relevant(vec![violation("a.rs", 1)], &BrokenProvider).is_empty());
    }

    #[test]
    fn test_lookup_key_is_verbatim() {
        let provider = MapProvider::new(vec![("src/lib.rs", FileChange::Created)]);
        assert!(is_relevant(&violation("src/lib.rs", 1), &provider));
        assert!(!is_relevant(&violation("./src/lib.rs", 1), &provider));
    }

    // ------------------------------------------------------------------------
    // Batch Filter Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_filter_preserves_order() {
        let provider = MapProvider::new(vec![
            ("keep.rs", FileChange::Created),
            ("drop.rs", FileChange::Deleted),
        ]);

        let v1 = Violation::new("keep.rs", 1, "first");
        let v2 = Violation::new("drop.rs", 2, "second");
        let v3 = Violation::new("keep.rs", 3, "third");

        let filtered = filter_relevant(vec![v1.clone(), v2, v3.clone()], &provider);
        assert_eq!(filtered, vec![v1, v3]);
    }

    #[test]
    fn test_filter_keeps_duplicates() {
        let provider = MapProvider::new(vec![("a.rs", FileChange::Created)]);

        let v = violation("a.rs", 1);
        let filtered = filter_relevant(vec![v.clone(), v.clone()], &provider);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_empty_input() {
        let provider = MapProvider::new(vec![]);
        assert!(filter_relevant(vec![], &provider).is_empty());
    }

    #[test]
    fn test_end_to_end_scenario() {
        // Foo.swift:5 in a created file is surfaced; Bar.swift:100 outside
        // the modified file's hunks is not.
        let provider = MapProvider::new(vec![
            ("Foo.swift", FileChange::Created),
            ("Bar.swift", FileChange::Modified(vec![Hunk::new(90, 95)])),
        ]);

        let violations = vec![
            Violation::new("Foo.swift", 5, "unused class"),
            Violation::new("Bar.swift", 100, "unused function"),
        ];

        let filtered = filter_relevant(violations, &provider);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].file_path, "Foo.swift");
        assert_eq!(filtered[0].line, 5);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use scanguard_ports::DiffLookupError;
    use scanguard_types::Hunk;
    use std::collections::BTreeMap;

    struct MapProvider {
        changes: BTreeMap<String, FileChange>,
    }

    impl DiffProvider for MapProvider {
        fn diff_for_file(&self, path: &str) -> Result<FileChange, DiffLookupError> {
            self.changes
                .get(path)
                .cloned()
                .ok_or_else(|| DiffLookupError::NotTouched(path.to_string()))
        }
    }

    fn arb_change() -> impl Strategy<Value = FileChange> {
        prop_oneof![
            Just(FileChange::Created),
            Just(FileChange::Deleted),
            Just(FileChange::Renamed),
            prop::collection::vec((1u32..1000, 0u32..50), 0..5).prop_map(|spans| {
                FileChange::Modified(
                    spans
                        .into_iter()
                        .map(|(start, len)| Hunk::new(start, start + len))
                        .collect(),
                )
            }),
        ]
    }

    proptest! {
        #[test]
        fn filter_output_is_a_subsequence(
            lines in prop::collection::vec(1u32..2000, 0..30),
            change in arb_change(),
        ) {
            let violations: Vec<Violation> = lines
                .iter()
                .enumerate()
                .map(|(i, &line)| Violation::new("f.rs", line, format!("m{}", i)))
                .collect();
            let provider = MapProvider {
                changes: [("f.rs".to_string(), change)].into_iter().collect(),
            };

            let filtered = filter_relevant(violations.clone(), &provider);

            // Every kept violation appears in the input, in the same order
            let mut input = violations.iter();
            for kept in &filtered {
                prop_assert!(input.any(|v| v == kept));
            }
        }

        #[test]
        fn created_relevance_ignores_line(line in 1u32..u32::MAX) {
            let provider = MapProvider {
                changes: [("f.rs".to_string(), FileChange::Created)].into_iter().collect(),
            };
            prop_assert!(is_relevant(&Violation::new("f.rs", line, "m"), &provider));
        }

        #[test]
        fn relevance_matches_hunk_membership(
            line in 1u32..200,
            start in 1u32..200,
            len in 0u32..50,
        ) {
            let provider = MapProvider {
                changes: [(
                    "f.rs".to_string(),
                    FileChange::Modified(vec![Hunk::new(start, start + len)]),
                )]
                .into_iter()
                .collect(),
            };
            let expected = line >= start && line <= start + len;
            prop_assert_eq!(
                is_relevant(&Violation::new("f.rs", line, "m"), &provider),
                expected
            );
        }

        #[test]
        fn filter_is_idempotent(
            lines in prop::collection::vec(1u32..100, 0..20),
            change in arb_change(),
        ) {
            let violations: Vec<Violation> = lines
                .iter()
                .map(|&line| Violation::new("f.rs", line, "m"))
                .collect();
            let provider = MapProvider {
                changes: [("f.rs".to_string(), change)].into_iter().collect(),
            };

            let once = filter_relevant(violations, &provider);
            let twice = filter_relevant(once.clone(), &provider);
            prop_assert_eq!(once, twice);
        }
    }
}
