use std::path::PathBuf;

use nforate_acquire::ExtractStrategy;
use nforate_model::RatingRecord;
use serde::Serialize;

/// What happened to one metadata file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum FileOutcome {
    Updated {
        record: RatingRecord,
        strategy: ExtractStrategy,
        /// An older IMDb entry was replaced rather than a new one added.
        replaced: bool,
    },
    /// Dry run: a rating was fetched but nothing was written.
    WouldUpdate {
        record: RatingRecord,
        strategy: ExtractStrategy,
    },
    AlreadyRated,
    Unreadable {
        error: String,
    },
    MissingIdentifier,
    InvalidIdentifier {
        identifier: String,
    },
    NoRating {
        reasons: Vec<String>,
    },
    FetchFailed {
        error: String,
    },
    WriteFailed {
        error: String,
    },
}

impl FileOutcome {
    /// The remote server was queried and returned a rating.
    pub fn is_update(&self) -> bool {
        matches!(self, FileOutcome::Updated { .. } | FileOutcome::WouldUpdate { .. })
    }

    /// Skipped on purpose, no request made.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            FileOutcome::AlreadyRated
                | FileOutcome::MissingIdentifier
                | FileOutcome::InvalidIdentifier { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        !self.is_update() && !self.is_skip()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryReport {
    pub path: PathBuf,
    pub files: Vec<FileReport>,
    /// Set when the directory could not be listed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The inter-directory pause was taken after this directory.
    pub paused: bool,
}

impl DirectoryReport {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            files: Vec::new(),
            error: None,
            paused: false,
        }
    }

    pub fn updated(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_update()).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub directories: usize,
    pub files: usize,
    pub updated: usize,
    pub already_rated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub pauses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub root: PathBuf,
    pub dry_run: bool,
    pub totals: Totals,
    pub directories: Vec<DirectoryReport>,
}

impl RunReport {
    pub fn new(root: PathBuf, dry_run: bool, directories: Vec<DirectoryReport>) -> Self {
        let mut totals = Totals {
            directories: directories.len(),
            ..Totals::default()
        };

        for dir in &directories {
            if dir.paused {
                totals.pauses += 1;
            }
            if dir.error.is_some() {
                totals.failed += 1;
            }
            for file in &dir.files {
                totals.files += 1;
                let outcome = &file.outcome;
                if outcome.is_failure() {
                    totals.failed += 1;
                } else if outcome.is_update() {
                    totals.updated += 1;
                } else if matches!(outcome, FileOutcome::AlreadyRated) {
                    totals.already_rated += 1;
                } else {
                    totals.skipped += 1;
                }
            }
        }

        Self {
            root,
            dry_run,
            totals,
            directories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, outcome: FileOutcome) -> FileReport {
        FileReport {
            path: PathBuf::from(name),
            outcome,
        }
    }

    fn updated() -> FileOutcome {
        FileOutcome::Updated {
            record: RatingRecord::new("7.8", 125_487).unwrap(),
            strategy: ExtractStrategy::StructuredData,
            replaced: false,
        }
    }

    #[test]
    fn test_totals() {
        let mut first = DirectoryReport::new("a".into());
        first.files.push(file("a/movie.nfo", updated()));
        first.files.push(file("a/extra.nfo", FileOutcome::AlreadyRated));
        first.paused = true;

        let mut second = DirectoryReport::new("b".into());
        second.files.push(file("b/movie.nfo", FileOutcome::MissingIdentifier));
        second.files.push(file("b/other.nfo", FileOutcome::FetchFailed { error: "timeout".into() }));

        let report = RunReport::new("/media".into(), false, vec![first, second]);

        assert_eq!(
            report.totals,
            Totals {
                directories: 2,
                files: 4,
                updated: 1,
                already_rated: 1,
                skipped: 1,
                failed: 1,
                pauses: 1,
            }
        );
    }

    #[test]
    fn test_outcome_classes() {
        let failures = [
            FileOutcome::Unreadable { error: "bad xml".into() },
            FileOutcome::NoRating { reasons: Vec::new() },
            FileOutcome::FetchFailed { error: "timeout".into() },
            FileOutcome::WriteFailed { error: "read-only".into() },
        ];
        for outcome in &failures {
            assert!(outcome.is_failure(), "{outcome:?}");
            assert!(!outcome.is_update() && !outcome.is_skip());
        }

        assert!(!updated().is_failure());
        assert!(!FileOutcome::AlreadyRated.is_failure());
        assert!(!FileOutcome::InvalidIdentifier { identifier: "nm1".into() }.is_failure());
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let json = serde_json::to_value(file("a/movie.nfo", updated())).unwrap();

        assert_eq!(json["path"], "a/movie.nfo");
        assert_eq!(json["outcome"], "updated");
        assert_eq!(json["strategy"], "structured-data");
        assert_eq!(json["record"]["value"], "7.8");
        assert_eq!(json["record"]["votes"], 125_487);
    }
}
