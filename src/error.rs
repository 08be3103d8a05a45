//! Error types for bindery operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while loading a descriptor or building an archive.
///
/// Every variant is fatal to the run; none are retried.
#[derive(Error, Debug)]
pub enum Error {
    /// The descriptor is unreadable, malformed, or inconsistent.
    #[error("invalid descriptor {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// A content document could not be read or decoded.
    #[error("cannot read document {}: {message}", path.display())]
    DocumentRead { path: PathBuf, message: String },

    /// A file referenced by the descriptor or a document does not exist.
    #[error("missing asset: {}", path.display())]
    MissingAsset { path: PathBuf },

    /// The archive could not be written.
    #[error("cannot write archive {}: {source}", path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn config(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Error::Config {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn document_read(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Error::DocumentRead {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    pub(crate) fn missing_asset(path: impl AsRef<Path>) -> Self {
        Error::MissingAsset {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub(crate) fn archive_write(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::ArchiveWrite {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
