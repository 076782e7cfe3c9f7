use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a run before any file is touched.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("cannot read library root '{path}': {source}")]
    ReadRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no directories found under '{0}'")]
    NoDirectories(PathBuf),
}
