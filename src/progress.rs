//! Progress reporting for conversion runs.
//!
//! The conversion loop emits one event per item attempted plus one at
//! completion. Sinks are injected by the caller and may display, forward,
//! or drop events; nothing in the pipeline depends on an event being
//! observed.

use std::fmt;

use crate::convert::ConversionStats;

/// One observable step of a conversion run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Reading order resolved; extraction is starting.
    Started { documents: usize },
    /// One content document was converted and written.
    Converted {
        source: String,
        output: String,
        bytes: u64,
    },
    /// A spine href did not resolve to any archive entry.
    MissingEntry { href: String },
    /// A document decoded with replacement characters.
    LossyDecode {
        source: String,
        encoding: &'static str,
    },
    /// A document failed to convert; the run continues without it.
    ItemFailed { source: String, reason: String },
    /// The merged output file was written.
    MergedWritten { path: String },
    /// The run finished.
    Finished { stats: ConversionStats },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Started { documents } => {
                write!(f, "Processing {documents} content documents...")
            }
            ProgressEvent::Converted {
                source,
                output,
                bytes,
            } => {
                write!(f, "Converted: {source} -> {output} ({bytes} bytes)")
            }
            ProgressEvent::MissingEntry { href } => {
                write!(f, "File not found in EPUB: {href}")
            }
            ProgressEvent::LossyDecode { source, encoding } => {
                write!(f, "Decoded {source} as {encoding} with replacements")
            }
            ProgressEvent::ItemFailed { source, reason } => {
                write!(f, "Error processing {source}: {reason}")
            }
            ProgressEvent::MergedWritten { path } => {
                write!(f, "Created merged file: {path}")
            }
            ProgressEvent::Finished { stats } => {
                write!(
                    f,
                    "Files processed: {}, total size: {} bytes, time elapsed: {:.2} seconds",
                    stats.files_processed,
                    stats.total_bytes,
                    stats.elapsed.as_secs_f64()
                )
            }
        }
    }
}

/// Receives conversion progress events.
///
/// This is a notification contract only: the conversion's correctness never
/// depends on what a sink does with an event.
pub trait ProgressSink {
    fn emit(&mut self, event: &ProgressEvent);
}

/// Discards every event.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&mut self, _event: &ProgressEvent) {}
}

/// Routes events to the `log` crate: warnings for skips and failures, info
/// for everything else.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::MissingEntry { .. }
            | ProgressEvent::LossyDecode { .. }
            | ProgressEvent::ItemFailed { .. } => log::warn!("{event}"),
            _ => log::info!("{event}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_event_display() {
        let event = ProgressEvent::Converted {
            source: "OEBPS/c1.xhtml".into(),
            output: "book/c1.txt".into(),
            bytes: 1234,
        };
        assert_eq!(
            event.to_string(),
            "Converted: OEBPS/c1.xhtml -> book/c1.txt (1234 bytes)"
        );

        let event = ProgressEvent::Finished {
            stats: ConversionStats {
                files_processed: 2,
                total_bytes: 10,
                elapsed: Duration::from_millis(1500),
            },
        };
        assert_eq!(
            event.to_string(),
            "Files processed: 2, total size: 10 bytes, time elapsed: 1.50 seconds"
        );
    }
}
