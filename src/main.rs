use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use layoutkit::{check_document, init_logging, Annotator, Config, BUILD_DATE, VERSION};
use layoutkit_editor::FileImageProvider;

#[derive(Parser)]
#[command(
    name = "layoutkit",
    about = "Loads a layout annotation document and checks its geometry",
    version,
    author
)]
struct Cli {
    /// Annotation document (JSON)
    document: PathBuf,

    /// Configuration file (TOML or JSON); defaults to the user config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory page images are resolved against; defaults to the document's directory
    #[arg(short, long)]
    images: Option<PathBuf>,

    /// Re-save the loaded document to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    tracing::info!("layoutkit {} (built {})", VERSION, BUILD_DATE);

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_or_default().context("loading default config")?,
    };

    let image_dir = cli.images.clone().unwrap_or_else(|| {
        cli.document
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let mut annotator =
        Annotator::new(&config).with_image_provider(FileImageProvider::new(image_dir));

    annotator
        .load_document(&cli.document)
        .with_context(|| format!("loading {}", cli.document.display()))?;
    if let Err(err) = annotator.load_page_images() {
        tracing::warn!("Some page images could not be read: {}", err);
    }

    let report = check_document(annotator.scene());
    tracing::info!(
        "{}: {} pages, {} nodes, {} invalid, {} irregular tables",
        cli.document.display(),
        report.pages,
        report.nodes,
        report.failures.len(),
        report.irregular_tables.len()
    );
    for (id, err) in &report.failures {
        println!("{}: {}", id, err);
    }
    for id in &report.irregular_tables {
        println!("{}: cells do not form a grid", id);
    }

    if let Some(output) = &cli.output {
        let written = annotator
            .save_document(Some(output.as_path()))
            .with_context(|| format!("saving {}", output.display()))?;
        tracing::info!("Wrote {}", written.display());
    }

    if !report.is_clean() {
        bail!("{} nodes failed validation", report.failures.len());
    }
    Ok(())
}
