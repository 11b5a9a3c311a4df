//! Error types for conversion operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading an EPUB or writing its text output.
///
/// Only run-level failures live here. Per-document problems (a missing
/// archive entry, a lossy decode, a failed write) are absorbed by the
/// conversion loop and surface through the progress channel instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("not a readable EPUB archive: {}", path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("cannot create output directory: {}", path.display())]
    OutputDirUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("no content documents in reading order")]
    NoContent,

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
