use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nforate_acquire::RatingSource;

use crate::error::UpdateError;
use crate::process::process_file;
use crate::report::{DirectoryReport, FileReport, RunReport};

pub const METADATA_EXTENSION: &str = "nfo";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Library root; each subdirectory is one title.
    pub root: PathBuf,
    /// Pause after a directory that produced at least one update.
    pub delay: Duration,
    /// Fetch and report, but leave files untouched.
    pub dry_run: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            delay: DEFAULT_DELAY,
            dry_run: false,
        }
    }
}

/// Update every `.nfo` file in the subdirectories of `options.root`.
///
/// Directories and files are handled strictly one after another. After a
/// directory that produced an update the run sleeps for `options.delay`, so
/// the remote server sees at most one burst per title folder.
pub async fn run<S>(options: &UpdateOptions, source: &S) -> Result<RunReport, UpdateError>
where
    S: RatingSource + ?Sized,
{
    let directories = list_directories(&options.root)?;
    if directories.is_empty() {
        return Err(UpdateError::NoDirectories(options.root.clone()));
    }

    tracing::info!(
        root = %options.root.display(),
        directories = directories.len(),
        dry_run = options.dry_run,
        "Scanning library"
    );

    let mut reports = Vec::with_capacity(directories.len());
    for dir in directories {
        let mut report = process_directory(&dir, source, options.dry_run).await;

        if report.updated() > 0 {
            tracing::info!(
                path = %dir.display(),
                updated = report.updated(),
                delay_secs = options.delay.as_secs_f64(),
                "Pausing before next directory"
            );
            tokio::time::sleep(options.delay).await;
            report.paused = true;
        }

        reports.push(report);
    }

    let report = RunReport::new(options.root.clone(), options.dry_run, reports);
    let totals = &report.totals;
    tracing::info!(
        directories = totals.directories,
        files = totals.files,
        updated = totals.updated,
        already_rated = totals.already_rated,
        skipped = totals.skipped,
        failed = totals.failed,
        "Run complete"
    );

    Ok(report)
}

async fn process_directory<S>(dir: &Path, source: &S, dry_run: bool) -> DirectoryReport
where
    S: RatingSource + ?Sized,
{
    let mut report = DirectoryReport::new(dir.to_path_buf());

    let files = match list_metadata_files(dir) {
        Ok(files) => files,
        Err(e) => {
            tracing::error!(path = %dir.display(), error = %e, "Failed to list directory");
            report.error = Some(e.to_string());
            return report;
        }
    };
    tracing::debug!(path = %dir.display(), files = files.len(), "Processing directory");

    for path in files {
        let outcome = process_file(&path, source, dry_run).await;
        report.files.push(FileReport { path, outcome });
    }

    report
}

/// Immediate subdirectories of `root`, sorted.
pub fn list_directories(root: &Path) -> Result<Vec<PathBuf>, UpdateError> {
    let read_error = |source| UpdateError::ReadRoot {
        path: root.to_path_buf(),
        source,
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// `.nfo` files (any case) directly inside `dir`, sorted.
pub fn list_metadata_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_metadata = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(METADATA_EXTENSION));
        if is_metadata && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
