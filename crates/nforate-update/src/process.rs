// Per-file update policy.
//
// Order matters: identifier and existing-rating checks happen before any
// request, so skipped files never cost a round trip to the remote server.

use std::path::Path;

use nforate_acquire::{FetchOutcome, RatingSource};
use nforate_model::TitleId;
use nforate_nfo::ratings;
use nforate_nfo::NfoDocument;

use crate::report::FileOutcome;

/// Bring one metadata file up to date.
///
/// Never fails: every problem is logged and reported as a [`FileOutcome`].
pub async fn process_file<S>(path: &Path, source: &S, dry_run: bool) -> FileOutcome
where
    S: RatingSource + ?Sized,
{
    let doc = match NfoDocument::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Skipping unreadable document");
            return FileOutcome::Unreadable {
                error: e.to_string(),
            };
        }
    };

    let Some(identifier) = ratings::imdb_identifier(&doc) else {
        tracing::warn!(path = %path.display(), "No IMDb identifier, skipping");
        return FileOutcome::MissingIdentifier;
    };

    let id = match TitleId::parse(&identifier) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Invalid IMDb identifier, skipping");
            return FileOutcome::InvalidIdentifier { identifier };
        }
    };

    if ratings::has_complete_rating(&doc) {
        tracing::info!(path = %path.display(), id = %id, "Already rated, skipping");
        return FileOutcome::AlreadyRated;
    }

    let (record, strategy) = match source.fetch_rating(&id).await {
        Ok(FetchOutcome::Found { record, strategy }) => (record, strategy),
        Ok(FetchOutcome::NoData { misses }) => {
            let reasons: Vec<String> = misses
                .iter()
                .map(|miss| format!("{}: {}", miss.strategy, miss.reason))
                .collect();
            tracing::warn!(path = %path.display(), id = %id, reasons = ?reasons, "No rating found on title page");
            return FileOutcome::NoRating { reasons };
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                id = %id,
                timeout = e.is_timeout(),
                error = %e,
                "Failed to fetch rating"
            );
            return FileOutcome::FetchFailed {
                error: e.to_string(),
            };
        }
    };

    if dry_run {
        tracing::info!(
            path = %path.display(),
            id = %id,
            value = record.value(),
            votes = record.votes(),
            %strategy,
            "Would update rating (dry run)"
        );
        return FileOutcome::WouldUpdate { record, strategy };
    }

    match ratings::write_rating(doc, &record, path) {
        Ok(summary) => {
            tracing::info!(
                path = %path.display(),
                id = %id,
                value = record.value(),
                votes = record.votes(),
                %strategy,
                replaced = summary.replaced,
                "Updated rating"
            );
            FileOutcome::Updated {
                record,
                strategy,
                replaced: summary.replaced > 0,
            }
        }
        Err(e) => {
            tracing::error!(path = %path.display(), id = %id, error = %e, "Failed to write document");
            FileOutcome::WriteFailed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use nforate_acquire::ExtractStrategy;
    use nforate_model::RatingRecord;

    use super::*;
    use crate::testing::{rated_nfo, unrated_nfo, Reply, ScriptedSource};

    fn write_nfo(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("movie.nfo");
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_updates_unrated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_nfo(dir.path(), &unrated_nfo("tt0111161"));
        let source = ScriptedSource::default().with("tt0111161", Reply::Rating("7.8", 125_487));

        let outcome = process_file(&path, &source, false).await;

        assert_eq!(
            outcome,
            FileOutcome::Updated {
                record: RatingRecord::new("7.8", 125_487).unwrap(),
                strategy: ExtractStrategy::StructuredData,
                replaced: false,
            }
        );
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains(
            "  <ratings>\n    <rating name=\"imdb\" default=\"true\" max=\"10\">\n      <value>7.8</value>\n      <votes>125487</votes>\n    </rating>\n  </ratings>\n</movie>\n"
        ));
    }

    #[tokio::test]
    async fn test_complete_rating_is_not_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let contents = rated_nfo("tt0111161");
        let path = write_nfo(dir.path(), &contents);
        let source = ScriptedSource::default().with("tt0111161", Reply::Rating("9.9", 1));

        let outcome = process_file(&path, &source, false).await;

        assert_eq!(outcome, FileOutcome::AlreadyRated);
        assert!(source.requested().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[tokio::test]
    async fn test_incomplete_rating_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let contents = rated_nfo("tt0111161").replace("<votes>4321</votes>", "<votes/>");
        let path = write_nfo(dir.path(), &contents);
        let source = ScriptedSource::default().with("tt0111161", Reply::Rating("9.3", 2_900_000));

        let outcome = process_file(&path, &source, false).await;

        assert!(matches!(outcome, FileOutcome::Updated { replaced: true, .. }));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.matches("<rating name=\"imdb\"").count(), 1);
        assert!(written.contains("<votes>2900000</votes>"));
    }

    #[tokio::test]
    async fn test_invalid_identifier_is_not_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_nfo(dir.path(), &unrated_nfo("nm0000151"));
        let source = ScriptedSource::default();

        let outcome = process_file(&path, &source, false).await;

        assert_eq!(
            outcome,
            FileOutcome::InvalidIdentifier {
                identifier: "nm0000151".into()
            }
        );
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_missing_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_nfo(dir.path(), "<movie><uniqueid type=\"tmdb\">278</uniqueid></movie>");
        let source = ScriptedSource::default();

        assert_eq!(process_file(&path, &source, false).await, FileOutcome::MissingIdentifier);
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_nfo(dir.path(), "<movie><title>broken</movie>");
        let source = ScriptedSource::default();

        let outcome = process_file(&path, &source, false).await;

        assert!(matches!(outcome, FileOutcome::Unreadable { .. }));
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let contents = unrated_nfo("tt0068646");
        let path = write_nfo(dir.path(), &contents);
        let source = ScriptedSource::default().with("tt0068646", Reply::Fail);

        let outcome = process_file(&path, &source, false).await;

        assert_eq!(
            outcome,
            FileOutcome::FetchFailed {
                error: "HTTP 503 for https://www.imdb.com/title/tt0068646/".into()
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }

    #[tokio::test]
    async fn test_no_rating_on_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_nfo(dir.path(), &unrated_nfo("tt0068646"));
        let source = ScriptedSource::default().with("tt0068646", Reply::NoData);

        let outcome = process_file(&path, &source, false).await;

        assert_eq!(outcome, FileOutcome::NoRating { reasons: Vec::new() });
        assert_eq!(source.requested(), vec!["tt0068646".to_string()]);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let contents = unrated_nfo("tt0111161");
        let path = write_nfo(dir.path(), &contents);
        let source = ScriptedSource::default().with("tt0111161", Reply::Rating("7.8", 10));

        let outcome = process_file(&path, &source, true).await;

        assert!(matches!(outcome, FileOutcome::WouldUpdate { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }
}
