// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — command-line shell around the composition engine.
//
// Entry point. Initialises logging, reads the images named on the command line,
// composes them into one PDF and writes it to disk. Ctrl-C cancels the run
// without leaving a partial file behind.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use folio_core::{ComposerConfig, PageFormat, PageItem, Rotation, SourceImage};
use folio_document::{CancellationToken, DocumentComposer, DocumentSink, FileSink};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "folio", about = "Convert an ordered list of images into a single PDF", version)]
struct Cli {
    /// Images in page order. Append `:90`, `:180` or `:270` to rotate clockwise.
    #[arg(required = true, num_args = 1..)]
    images: Vec<String>,

    /// Output PDF file
    #[arg(short, long, default_value = "converted-images.pdf")]
    output: PathBuf,

    /// Page format: a4, letter, fit, or WIDTHxHEIGHT in mm
    #[arg(short, long)]
    format: Option<PageFormat>,

    /// JSON settings file (title, jpeg_quality, parallelism, page_format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Document title
    #[arg(long)]
    title: Option<String>,

    /// Number of images decoded in parallel (0 = one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

/// Split `path[:degrees]`. The suffix only counts as a rotation when it is an
/// integer, so paths that contain colons still work.
fn parse_image_arg(arg: &str) -> Result<(PathBuf, Rotation)> {
    if let Some((path, suffix)) = arg.rsplit_once(':') {
        if let Ok(degrees) = suffix.trim().parse::<i32>() {
            let rotation = Rotation::from_degrees(degrees)
                .with_context(|| format!("invalid rotation in '{arg}'"))?;
            return Ok((PathBuf::from(path), rotation));
        }
    }
    Ok((PathBuf::from(arg), Rotation::Deg0))
}

fn load_config(cli: &Cli) -> Result<ComposerConfig> {
    let mut config = match &cli.config {
        Some(path) => ComposerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ComposerConfig::default(),
    };
    if let Some(format) = cli.format {
        config.page_format = format;
    }
    if let Some(title) = &cli.title {
        config.title = title.clone();
    }
    if let Some(jobs) = cli.jobs {
        config.parallelism = jobs;
    }
    config.validate()?;
    Ok(config)
}

async fn read_items(args: &[String]) -> Result<Vec<PageItem>> {
    let mut items = Vec::with_capacity(args.len());
    for arg in args {
        let (path, rotation) = parse_image_arg(arg)?;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut image = SourceImage::new(bytes);
        if let Some(name) = path.file_name() {
            image = image.with_name(name.to_string_lossy());
        }
        items.push(PageItem::new(image, rotation));
    }
    Ok(items)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = load_config(&cli)?;
    let format = config.page_format;
    let items = read_items(&cli.images).await?;
    if items.is_empty() {
        bail!("no images given");
    }
    info!(images = items.len(), %format, output = %cli.output.display(), "Folio starting");

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                cancel.cancel();
            }
        })
    };

    let composer = DocumentComposer::new(config)?;
    let result = composer.compose_async(items, format, cancel).await;
    ctrl_c.abort();

    let document = result.context("failed to build PDF")?;
    let mut sink = FileSink::new(&cli.output);
    sink.deliver(document.bytes())
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    info!(
        pages = document.page_count(),
        sha256 = document.sha256(),
        "Done"
    );
    Ok(())
}
