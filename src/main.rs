// chronyx CLI: scan Form-16 PDFs and render annotation stroke files.
use anyhow::{Context, Result};
use chronyx::config::ScanConfig;
use chronyx::ink::{DrawingSurface, Stroke};
use chronyx::scan::{scan_document, ScanProgress, ScanStage};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chronyx", version, about = "Form-16 scanning and annotation toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract filing fields from a Form-16 PDF.
    Scan {
        /// Path to the PDF.
        file: PathBuf,
        /// Emit the full outcome as JSON instead of a field table.
        #[arg(long)]
        json: bool,
    },
    /// Rasterize a saved stroke file to PNG.
    Render {
        /// Stroke list JSON, as produced by the annotation layer.
        strokes: PathBuf,
        /// Output PNG path.
        #[arg(long, short)]
        out: PathBuf,
        #[arg(long, default_value_t = 1024)]
        width: u32,
        #[arg(long, default_value_t = 768)]
        height: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Scan { file, json } => scan(file, json).await,
        Command::Render { strokes, out, width, height } => render(strokes, out, width, height),
    }
}

async fn scan(file: PathBuf, json: bool) -> Result<()> {
    let config = ScanConfig::load();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ScanProgress>();
    let reporter = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            match progress.stage {
                ScanStage::Ocr { page, total } => {
                    log::info!("OCR page {page}/{total} ({:.0}%)", progress.fraction * 100.0)
                }
                stage => log::debug!("{stage:?} ({:.0}%)", progress.fraction * 100.0),
            }
        }
    });

    let outcome = scan_document(&file, &config, Some(tx)).await?;
    reporter.await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{} page(s), {:?} in {}ms",
            outcome.pages, outcome.source, outcome.elapsed_ms
        );
        for (field, extracted) in outcome.fields.iter() {
            let value = match (extracted.value.as_text(), extracted.value.as_amount()) {
                (Some(text), _) => text.to_string(),
                (_, Some(amount)) => format!("{amount:.2}"),
                _ => String::new(),
            };
            println!("{:<20} {:<16} ({:.0}%)", field.label(), value, extracted.confidence * 100.0);
        }
        if outcome.fields.is_empty() {
            println!("no fields recognized");
        }
    }
    Ok(())
}

fn render(strokes: PathBuf, out: PathBuf, width: u32, height: u32) -> Result<()> {
    let raw = std::fs::read_to_string(&strokes)
        .with_context(|| format!("reading {}", strokes.display()))?;
    let strokes: Vec<Stroke> = serde_json::from_str(&raw).context("parsing stroke list")?;
    let surface = DrawingSurface::with_strokes(width, height, strokes)?;
    let png = surface
        .pixmap()
        .encode_png()
        .context("encoding PNG")?;
    std::fs::write(&out, png).with_context(|| format!("writing {}", out.display()))?;
    log::info!("wrote {}", out.display());
    Ok(())
}
