// src/main.rs
//! clipkeep: save everything that passes through the clipboard
//!
//! Polls the clipboard every few seconds and writes new text, images and
//! copied files into a target directory until interrupted.

#![deny(unsafe_op_in_unsafe_fn)]

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use clipkeep::backends::{Backend, HelperProgram};
use clipkeep::config::{self, BackendChoice, CaptureConfig};
use clipkeep::core::{CaptureEvent, CaptureListener, CaptureLoop};

/// Command line interface for the clipboard keeper
#[derive(Debug, Parser)]
#[command(
    name = "clipkeep",
    version,
    about = "Watches the clipboard and saves any new images, text and files",
    long_about = "Polls the system clipboard at a fixed interval and saves every new piece of text (.txt), image (.png) or single copied file into TARGET_DIR. Repeats of the previous capture are skipped. Runs until Ctrl-C."
)]
struct Args {
    /// Target directory to store the saved clipboard files
    ///
    /// Defaults to your Pictures directory, or your home directory when
    /// there is none.
    target_dir: Option<PathBuf>,

    /// Sleep duration (in seconds) between two clipboard checks
    #[arg(long, default_value_t = config::DEFAULT_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    period: u64,

    /// Prefix for saved file names
    #[arg(long, default_value = config::DEFAULT_PREFIX)]
    prefix: String,

    /// Clipboard backend
    #[arg(long, default_value = "auto", value_enum)]
    backend: BackendChoice,

    /// Helper program for image and file reads (detected when omitted)
    #[arg(long, value_enum)]
    helper: Option<HelperProgram>,

    /// Seconds before a helper invocation is killed
    #[arg(long, default_value_t = config::DEFAULT_HELPER_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    helper_timeout: u64,

    /// Image MIME type to capture; repeat to allow several, in preference order
    #[arg(long = "image-type", value_name = "MIME")]
    image_types: Vec<String>,

    /// Output format for status events
    #[arg(long, default_value = "human", value_enum)]
    format: OutputFormat,

    /// Append every status event as a JSON line to this file
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Verbosity level for logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable output with emoji markers
    Human,
    /// JSON lines for programmatic processing
    Json,
}

impl Args {
    fn into_config(self) -> Result<(CaptureConfig, OutputFormat, Option<PathBuf>)> {
        let target_dir = match self.target_dir {
            Some(dir) => dir,
            None => config::candidate_target_dir()
                .context("No target directory given and no Pictures or home directory found")?,
        };

        let mut config = CaptureConfig::new(target_dir);
        config.interval = Duration::from_secs(self.period);
        config.prefix = self.prefix;
        config.backend = self.backend;
        config.helper = self.helper;
        config.helper_timeout = Duration::from_secs(self.helper_timeout);
        if !self.image_types.is_empty() {
            config.image_types = self.image_types;
        }

        Ok((config, self.format, self.output_file))
    }
}

/// Set up logging based on verbosity level
fn setup_logging(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .with_thread_ids(verbose > 2)
        .init();
}

/// Human-readable form of an event; `None` for events not worth a line
fn human_lines(event: &CaptureEvent) -> Option<String> {
    let text = match event {
        CaptureEvent::Started {
            target_dir,
            interval,
            backend,
        } => format!(
            "🚀 clipkeep started\n   Target dir: {}\n   Checking every {}s\n   Backend: {}\n   Press Ctrl+C to stop",
            target_dir.display(),
            interval.as_secs(),
            backend
        ),
        CaptureEvent::Saved { record } => {
            let mut line = format!("💾 Saved {}: {}", record.kind, record.path.display());
            if let Some(source) = &record.source {
                line.push_str(&format!("\n   From: {}", source.display()));
            }
            line
        }
        CaptureEvent::Unsupported { reason } => format!("⏭️  Skipped: {}", reason),
        CaptureEvent::Failed { kind, error } => format!("⚠️  {} failed: {}", kind, error),
        CaptureEvent::Stopped { ticks, saved } => {
            format!("🛑 Stopped after {} checks, {} files saved", ticks, saved)
        }
        CaptureEvent::Unchanged { .. } => return None,
    };
    Some(text)
}

/// Prints saves, skips and failures to stdout
struct ConsoleReporter {
    format: OutputFormat,
}

impl CaptureListener for ConsoleReporter {
    fn on_event(&mut self, event: &CaptureEvent) {
        match self.format {
            OutputFormat::Human => {
                if let Some(text) = human_lines(event) {
                    println!("{}", text);
                }
            }
            OutputFormat::Json => {
                if matches!(event, CaptureEvent::Unchanged { .. }) {
                    return;
                }
                let mut line = serde_json::to_value(event).unwrap_or_default();
                line["timestamp"] = chrono::Utc::now().to_rfc3339().into();
                println!("{}", line);
            }
        }
    }
}

/// Append-only JSON-lines journal of capture events
struct JournalWriter {
    file: std::fs::File,
}

impl JournalWriter {
    fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open output file {}", path.display()))?;

        Ok(Self { file })
    }
}

impl CaptureListener for JournalWriter {
    fn on_event(&mut self, event: &CaptureEvent) {
        if matches!(event, CaptureEvent::Unchanged { .. }) {
            return;
        }

        let mut line = match serde_json::to_value(event) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to serialize event: {}", e);
                return;
            }
        };
        line["timestamp"] = chrono::Utc::now().to_rfc3339().into();

        if let Err(e) = writeln!(self.file, "{}", line) {
            error!("Failed to write to output file: {}", e);
        }
    }
}

/// Application entry point
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    info!("Starting clipkeep v{}", env!("CARGO_PKG_VERSION"));

    let (config, format, output_file) = args.into_config()?;
    config
        .validate()
        .context("Target is not a valid directory")?;

    let backend = Backend::from_config(&config);
    let mut capture = CaptureLoop::new(backend, config);
    capture.add_listener(ConsoleReporter { format });

    if let Some(path) = output_file {
        info!("📁 Journal enabled: {}", path.display());
        capture.add_listener(JournalWriter::new(path)?);
    }

    let shutdown = clipkeep::core::shutdown_signal().context("Failed to install signal handlers")?;
    capture.run_until(shutdown).await;

    Ok(())
}
