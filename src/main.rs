//! epub2txt - EPUB to plain text converter

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use epub2txt::{ConvertOptions, NullSink, ProgressEvent, ProgressSink, convert};

#[derive(Parser)]
#[command(name = "epub2txt")]
#[command(version, about = "Convert EPUB files to plain text", long_about = None)]
#[command(after_help = "EXAMPLES:
    epub2txt book.epub            Extract into ./book/
    epub2txt -m book.epub         Also write book_merged.txt
    epub2txt -o out book.epub     Extract into out/")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "EPUB")]
    input: PathBuf,

    /// Output directory (defaults to the EPUB's base name)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Merge all text files into a single file
    #[arg(short, long)]
    merge: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Prints progress events to stdout, statistics as a closing block.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&mut self, event: &ProgressEvent) {
        if let ProgressEvent::Finished { stats } = event {
            println!();
            println!("Conversion statistics:");
            println!("Files processed: {}", stats.files_processed);
            println!("Total size: {} bytes", stats.total_bytes);
            if let Some(average) = stats.average_bytes() {
                println!("Average file size: {average} bytes");
            }
            println!("Time elapsed: {:.2} seconds", stats.elapsed.as_secs_f64());
        } else {
            println!("{event}");
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.input.is_file() {
        eprintln!("error: EPUB file not found: {}", cli.input.display());
        return ExitCode::FAILURE;
    }

    let options = ConvertOptions {
        output_dir: cli.output,
        merge: cli.merge,
        ..Default::default()
    };

    let result = if cli.quiet {
        convert(&cli.input, &options, &mut NullSink)
    } else {
        convert(&cli.input, &options, &mut ConsoleSink)
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
