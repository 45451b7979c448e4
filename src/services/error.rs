use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole filemap rebuild or index read.
///
/// Problems confined to one mod folder are not errors: the collector logs them
/// and skips the affected subtree.
#[derive(Error, Debug)]
pub enum FilemapError {
    #[error("Staging directory not found: {0}")]
    StagingRootMissing(Utf8PathBuf),

    #[error("Failed to write index {path}: {source}")]
    OutputWrite {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read index {path}: {source}")]
    IndexRead {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("Failed to load modlist: {0:#}")]
    Modlist(anyhow::Error),

    #[error("Rebuild worker panicked: {0}")]
    WorkerPanicked(String),
}
