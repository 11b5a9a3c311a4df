//! # epub2txt
//!
//! A small, robust library for extracting the plain text of an EPUB in its
//! natural reading order.
//!
//! ## Features
//!
//! - Resolves the spine through `META-INF/container.xml` and the package
//!   document, tolerating case and slash mismatches between hrefs and
//!   archive entries
//! - Decodes content of unknown or mixed encoding without ever failing
//! - Flattens markup into clean text, surviving malformed HTML
//! - Writes one text file per content document, optionally merged into a
//!   single file, and reports per-run statistics
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use epub2txt::{convert, ConvertOptions, NullSink};
//!
//! let options = ConvertOptions { merge: true, ..Default::default() };
//! let stats = convert(Path::new("book.epub"), &options, &mut NullSink)?;
//! println!("{} files, {} bytes", stats.files_processed, stats.total_bytes);
//! # Ok::<(), epub2txt::Error>(())
//! ```
//!
//! Individual stages are exposed for callers that want less than the full
//! pipeline: [`Archive`] for entry access, [`reading_order`] for spine
//! resolution, [`decode`] for tolerant byte decoding, and [`extract_text`]
//! for markup flattening.

pub mod archive;
pub mod convert;
pub mod decode;
pub mod error;
pub mod extract;
pub mod opf;
pub mod progress;
pub(crate) mod util;

pub use archive::Archive;
pub use convert::{ConversionStats, ConvertOptions, convert};
pub use decode::{Decoded, decode};
pub use error::{Error, Result};
pub use extract::{clean_text, extract_text};
pub use opf::{ManifestItem, SpineEntry, reading_order};
pub use progress::{LogSink, NullSink, ProgressEvent, ProgressSink};
