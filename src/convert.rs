//! End-to-end conversion: reading order in, ordered text files out.
//!
//! The loop is a map then a fold. Each spine entry independently produces an
//! [`ItemOutcome`] under its original index; the merged file and statistics
//! are then folded from those outcomes in spine order, never in completion
//! order. Per-item failures never abort the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::archive::Archive;
use crate::decode::decode;
use crate::error::{Error, Result};
use crate::extract::extract_text;
use crate::opf::reading_order;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::util::{entry_stem, is_content_document};

/// Options for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Output directory. Defaults to the archive's base name, relative to
    /// the current directory.
    pub output_dir: Option<PathBuf>,
    /// Also write a single merged file containing every section.
    pub merge: bool,
    /// Extension for output text files.
    pub extension: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            merge: false,
            extension: "txt".into(),
        }
    }
}

/// Statistics for one completed conversion run.
#[derive(Debug, Clone)]
pub struct ConversionStats {
    /// Documents successfully converted and written.
    pub files_processed: usize,
    /// Sum of the output files' byte sizes.
    pub total_bytes: u64,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
}

impl ConversionStats {
    /// Mean output file size, when anything was processed.
    pub fn average_bytes(&self) -> Option<u64> {
        (self.files_processed > 0).then(|| self.total_bytes / self.files_processed as u64)
    }
}

/// One successfully converted document.
#[derive(Debug)]
struct ExtractedDoc {
    /// Archive entry the text came from.
    source: String,
    /// Output file name inside the output directory.
    file_name: String,
    /// UTF-8 byte size of the written text.
    bytes: u64,
    text: String,
}

/// Result of attempting one spine entry.
#[derive(Debug)]
enum ItemOutcome {
    Converted(ExtractedDoc),
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug)]
enum SkipReason {
    /// The href resolved to no archive entry.
    MissingEntry,
    /// The entry is not a content document (image, stylesheet, ...).
    NotContent,
}

/// Convert an EPUB into one text file per content document.
///
/// Returns statistics for the run, or an error when the archive is
/// unreadable, the output directory cannot be created, or the reading order
/// is empty. A run where every single item failed still completes, with
/// `files_processed == 0`; the caller decides what that means.
pub fn convert(
    archive_path: &Path,
    options: &ConvertOptions,
    sink: &mut dyn ProgressSink,
) -> Result<ConversionStats> {
    let start = Instant::now();

    let base_name = archive_stem(archive_path);
    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&base_name));
    fs::create_dir_all(&output_dir).map_err(|e| Error::OutputDirUnwritable {
        path: output_dir.clone(),
        source: e,
    })?;

    let mut archive = Archive::open(archive_path)?;
    let order = reading_order(&mut archive);
    if order.is_empty() {
        return Err(Error::NoContent);
    }

    sink.emit(&ProgressEvent::Started {
        documents: order.len(),
    });

    // Map: one outcome per spine entry, keyed by its original index.
    let mut outcomes: Vec<ItemOutcome> = Vec::with_capacity(order.len());
    for href in &order {
        outcomes.push(convert_item(
            &mut archive,
            href,
            &output_dir,
            &options.extension,
            sink,
        ));
    }

    // Fold: merged output and statistics, in spine order.
    let mut converted: Vec<&ExtractedDoc> = Vec::new();
    for (href, outcome) in order.iter().zip(&outcomes) {
        match outcome {
            ItemOutcome::Converted(doc) => converted.push(doc),
            ItemOutcome::Skipped(reason) => log::debug!("skipped {href}: {reason:?}"),
            ItemOutcome::Failed(reason) => log::debug!("gave up on {href}: {reason}"),
        }
    }

    if options.merge && !converted.is_empty() {
        let merged_name = format!("{base_name}_merged.{}", options.extension);
        let merged_path = output_dir.join(&merged_name);
        fs::write(&merged_path, merge_sections(&converted))?;
        sink.emit(&ProgressEvent::MergedWritten {
            path: merged_path.display().to_string(),
        });
    }

    let stats = ConversionStats {
        files_processed: converted.len(),
        total_bytes: converted.iter().map(|doc| doc.bytes).sum(),
        elapsed: start.elapsed(),
    };
    sink.emit(&ProgressEvent::Finished {
        stats: stats.clone(),
    });
    Ok(stats)
}

fn convert_item(
    archive: &mut Archive,
    href: &str,
    output_dir: &Path,
    extension: &str,
    sink: &mut dyn ProgressSink,
) -> ItemOutcome {
    let Some(entry) = archive.resolve(href).map(str::to_string) else {
        sink.emit(&ProgressEvent::MissingEntry {
            href: href.to_string(),
        });
        return ItemOutcome::Skipped(SkipReason::MissingEntry);
    };

    if !is_content_document(&entry) {
        return ItemOutcome::Skipped(SkipReason::NotContent);
    }

    match write_document(archive, &entry, output_dir, extension, sink) {
        Ok(doc) => {
            sink.emit(&ProgressEvent::Converted {
                source: doc.source.clone(),
                output: output_dir.join(&doc.file_name).display().to_string(),
                bytes: doc.bytes,
            });
            ItemOutcome::Converted(doc)
        }
        Err(e) => {
            sink.emit(&ProgressEvent::ItemFailed {
                source: entry,
                reason: e.to_string(),
            });
            ItemOutcome::Failed(e.to_string())
        }
    }
}

fn write_document(
    archive: &mut Archive,
    entry: &str,
    output_dir: &Path,
    extension: &str,
    sink: &mut dyn ProgressSink,
) -> Result<ExtractedDoc> {
    let raw = archive.read(entry)?;
    let decoded = decode(&raw);
    if decoded.lossy {
        sink.emit(&ProgressEvent::LossyDecode {
            source: entry.to_string(),
            encoding: decoded.encoding.name(),
        });
    }

    let text = extract_text(&decoded.text);
    let file_name = format!("{}.{extension}", entry_stem(entry));
    fs::write(output_dir.join(&file_name), text.as_bytes())?;

    Ok(ExtractedDoc {
        source: entry.to_string(),
        bytes: text.len() as u64,
        file_name,
        text,
    })
}

/// Concatenate sections with a `---<name>---` header before each, one blank
/// line between header and body and between sections.
fn merge_sections(docs: &[&ExtractedDoc]) -> String {
    let mut merged = String::new();
    for (index, doc) in docs.iter().enumerate() {
        if index > 0 {
            merged.push_str("\n\n");
        }
        merged.push_str("---");
        merged.push_str(entry_stem(&doc.file_name));
        merged.push_str("---\n\n");
        merged.push_str(&doc.text);
    }
    merged
}

/// Archive base filename without its extension.
fn archive_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string())
}
