// src/bin/clip_probe.rs
//! Reads the clipboard once and shows how each channel classifies

use anyhow::Result;
use clap::Parser;

use clipkeep::backends::{Backend, ClipboardSource, HelperProgram};
use clipkeep::config::{BackendChoice, CaptureConfig};
use clipkeep::core::{classify, Classification, RawClipboardRead};
use clipkeep::error::ClipboardError;

#[derive(Debug, Parser)]
#[command(name = "clip-probe", about = "Show what clipkeep would see on the clipboard right now")]
struct Args {
    /// Clipboard backend
    #[arg(long, default_value = "auto", value_enum)]
    backend: BackendChoice,

    /// Helper program for image and file reads (detected when omitted)
    #[arg(long, value_enum)]
    helper: Option<HelperProgram>,
}

fn describe(channel: &str, read: Result<Option<RawClipboardRead>, ClipboardError>) {
    let read = match read {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            println!("{channel:>6}: empty");
            return;
        }
        Err(e) => {
            println!("{channel:>6}: read failed: {e}");
            return;
        }
    };

    match classify(read) {
        Ok(Classification::Payload(payload)) => {
            println!("{channel:>6}: {} ({})", payload.kind(), payload.summary())
        }
        Ok(Classification::Unsupported(shape)) => println!("{channel:>6}: unsupported, {shape}"),
        Ok(Classification::Nothing) => println!("{channel:>6}: no content"),
        Err(e) => println!("{channel:>6}: read failed: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = CaptureConfig::new(".");
    config.backend = args.backend;
    config.helper = args.helper;
    let mut backend = Backend::from_config(&config);

    println!("Clipboard probe ({})", backend.name());
    println!("==================================");

    let text = backend.read_text().await;
    describe("text", text.map(|t| t.map(RawClipboardRead::Text)));

    if backend.supports_rich_content() {
        let image = backend.read_image().await;
        describe("image", image.map(|i| i.map(RawClipboardRead::Image)));

        let files = backend.read_file_list().await;
        describe("files", files.map(|f| f.map(RawClipboardRead::FileList)));
    } else {
        println!("{:>6}: not supported by this backend", "rich");
    }

    Ok(())
}
