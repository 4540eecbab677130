use anyhow::{Context, Result};
use bingopress::{BingoPress, GenerationRequest, GridSize, inspect_pdf_bytes};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "bingopress",
    version,
    about = "Generate printable bingo card PDFs, one card per A4 page"
)]
struct Cli {
    /// Grid size: 4, 5 or 6
    #[arg(long, default_value_t = 5)]
    grid: u8,

    /// Number of cards to generate (clamped to 1..=100)
    #[arg(long, default_value_t = 1)]
    count: i64,

    /// Output file path
    #[arg(long, default_value = bingopress::DEFAULT_FILE_NAME)]
    out: PathBuf,

    /// RNG seed for reproducible card sets
    #[arg(long)]
    seed: Option<u64>,

    /// JPEG quality for embedded card bitmaps (1..=100)
    #[arg(long, default_value_t = 60)]
    quality: u8,

    /// Font file to use for card numbers (repeatable)
    #[arg(long = "font-file")]
    font_files: Vec<PathBuf>,

    /// Directory to scan for fonts (repeatable)
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bingopress=info")),
        )
        .init();

    let cli = Cli::parse();
    let grid = GridSize::try_from(cli.grid)?;

    let mut builder = BingoPress::builder().jpeg_quality(cli.quality);
    for file in &cli.font_files {
        builder = builder.register_font_file(file);
    }
    for dir in &cli.font_dirs {
        builder = builder.register_font_dir(dir);
    }
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    let press = builder.build().context("configuring the generator")?;

    let request = GenerationRequest::new(grid, cli.count);
    if request.count() as i64 != cli.count {
        info!(
            requested = cli.count,
            clamped = request.count(),
            "card count clamped into supported range"
        );
    }

    let (bytes, metrics) = press
        .generate_with_metrics(request)
        .context("generating cards")?;

    // Verify with an independent parser before touching the filesystem.
    let report = inspect_pdf_bytes(&bytes).context("verifying generated pdf")?;
    anyhow::ensure!(
        report.page_count == request.count(),
        "generated pdf has {} pages, expected {}",
        report.page_count,
        request.count()
    );

    std::fs::write(&cli.out, &bytes)
        .with_context(|| format!("writing {}", cli.out.display()))?;

    info!(
        path = %cli.out.display(),
        grid = %grid,
        cards = request.count(),
        pages = report.page_count,
        bytes = metrics.total_bytes,
        "export complete"
    );
    Ok(())
}
