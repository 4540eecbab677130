//! Bingo card generation and PDF export.
//!
//! A [`BingoPress`] turns a [`GenerationRequest`] into a finished PDF:
//! unique shuffled cards are drawn from an injected RNG, each card is
//! rasterized to a fixed-size bitmap, JPEG encoded, and placed on its own
//! A4 page. Configuration happens up front through [`BingoPressBuilder`];
//! a built press is immutable and can serve any number of requests.
//!
//! ```no_run
//! use bingopress::{BingoPress, GenerationRequest, GridSize};
//!
//! let press = BingoPress::builder().seed(7).build()?;
//! let request = GenerationRequest::new(GridSize::Five, 10);
//! let pdf = press.generate(request)?;
//! std::fs::write(bingopress::DEFAULT_FILE_NAME, pdf)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod canvas;
mod error;
mod font;
mod grid;
mod layout;
mod metrics;
mod pdf;
mod pdfinspect;
mod raster;
mod render;
mod shuffle;
mod types;

use base64::Engine;
use font::FontRegistry;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

pub use canvas::{Canvas, Command, Document, Page};
pub use error::BingoError;
pub use grid::{Card, CardSet, GenerationRequest, GridSize, MAX_CARDS, MIN_CARDS};
pub use layout::{CARD_HEIGHT_PX, CARD_WIDTH_PX, CardLayout};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use pdf::{document_to_pdf, document_to_pdf_with_metrics};
pub use pdfinspect::{PageInfo, PdfInspectReport, inspect_pdf_bytes};
pub use shuffle::{build_unique_set, generate_card};
pub use types::{Color, Margins, Pt, Size};

/// Default name for the exported file.
pub const DEFAULT_FILE_NAME: &str = "bingo-cards.pdf";

const DEFAULT_MARGIN_PT: f32 = 36.0;
const DEFAULT_JPEG_QUALITY: u8 = 60;

#[derive(Debug)]
pub struct BingoPress {
    font_registry: FontRegistry,
    page_size: Size,
    margins: Margins,
    jpeg_quality: u8,
    seed: Option<u64>,
}

#[derive(Clone)]
pub struct BingoPressBuilder {
    page_size: Size,
    margins: Margins,
    jpeg_quality: u8,
    font_files: Vec<std::path::PathBuf>,
    font_dirs: Vec<std::path::PathBuf>,
    use_system_fonts: bool,
    seed: Option<u64>,
}

impl BingoPressBuilder {
    pub fn new() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all(DEFAULT_MARGIN_PT),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            font_files: Vec::new(),
            font_dirs: Vec::new(),
            use_system_fonts: true,
            seed: None,
        }
    }

    /// Output page size in points. Defaults to A4 portrait.
    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn margin_all(mut self, value: f32) -> Self {
        self.margins = Margins::all(value);
        self
    }

    /// JPEG quality for the embedded card bitmaps, 1..=100.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn register_font_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.font_files.push(path.into());
        self
    }

    pub fn register_font_dir(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.font_dirs.push(path.into());
        self
    }

    /// Whether to fall back to platform font directories when no explicit
    /// font yields a usable face. On by default.
    pub fn use_system_fonts(mut self, enabled: bool) -> Self {
        self.use_system_fonts = enabled;
        self
    }

    /// Fix the RNG seed; the same seed and request produce byte-identical
    /// card sets. Without a seed each run draws from the process RNG.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<BingoPress, BingoError> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(BingoError::InvalidConfiguration(format!(
                "jpeg quality {} out of range 1..=100",
                self.jpeg_quality
            )));
        }

        let mut registry = FontRegistry::new();
        for file in &self.font_files {
            if !registry.register_file(file) {
                debug!(path = %file.display(), "skipping unusable font file");
            }
        }
        for dir in &self.font_dirs {
            registry.register_dir(dir);
        }
        if registry.is_empty() && self.use_system_fonts {
            registry.register_system_fallback();
        }
        if registry.is_empty() {
            return Err(BingoError::FontUnavailable(
                "no font with digit coverage found; register one explicitly or set BINGOPRESS_FONT_DIR"
                    .to_string(),
            ));
        }

        Ok(BingoPress {
            font_registry: registry,
            page_size: self.page_size,
            margins: self.margins,
            jpeg_quality: self.jpeg_quality,
            seed: self.seed,
        })
    }
}

impl Default for BingoPressBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BingoPress {
    pub fn builder() -> BingoPressBuilder {
        BingoPressBuilder::new()
    }

    /// Generate the PDF for `request`.
    pub fn generate(&self, request: GenerationRequest) -> Result<Vec<u8>, BingoError> {
        self.generate_with_metrics(request).map(|(bytes, _)| bytes)
    }

    /// Generate the PDF and report per-page byte accounting alongside.
    pub fn generate_with_metrics(
        &self,
        request: GenerationRequest,
    ) -> Result<(Vec<u8>, DocumentMetrics), BingoError> {
        match self.seed {
            Some(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                self.generate_with_rng(request, &mut rng)
            }
            None => {
                let mut rng = rand::thread_rng();
                self.generate_with_rng(request, &mut rng)
            }
        }
    }

    /// Generate with a caller-supplied RNG. This is the deterministic entry
    /// point: the same RNG state and request yield byte-identical output.
    pub fn generate_with_rng<R: Rng>(
        &self,
        request: GenerationRequest,
        rng: &mut R,
    ) -> Result<(Vec<u8>, DocumentMetrics), BingoError> {
        let grid = request.grid();
        let count = request.count();
        info!(grid = %grid, count, "generating card set");

        let cards = build_unique_set(grid, count, rng);
        let layout = CardLayout::for_grid(grid);
        let font = self
            .font_registry
            .primary()
            .ok_or_else(|| BingoError::FontUnavailable("font registry is empty".to_string()))?;

        let page_size = self.page_size;
        let mut canvas = Canvas::new(page_size);
        let placement = self.card_placement(page_size);
        let started = std::time::Instant::now();

        for (index, card) in cards.iter().enumerate() {
            let commands = render::card_commands(card, grid, &layout, &font.metrics);
            let pixmap = raster::rasterize(&commands, CARD_WIDTH_PX, CARD_HEIGHT_PX, font)?;
            let jpeg = raster::encode_jpeg(&pixmap, self.jpeg_quality)?;
            debug!(card = index + 1, jpeg_bytes = jpeg.len(), "card rasterized");

            let resource_id = format!(
                "data:image/jpeg;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(&jpeg)
            );
            let (x, y, w, h) = placement;
            canvas.draw_image(x, y, w, h, resource_id);
            canvas.show_page();
        }

        let document = canvas.finish();
        let (bytes, doc_metrics) = document_to_pdf_with_metrics(&document)?;
        info!(
            pages = doc_metrics.page_count(),
            bytes = doc_metrics.total_bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pdf assembled"
        );
        Ok((bytes, doc_metrics))
    }

    /// Fit the card bitmap inside the page margins preserving aspect ratio,
    /// then center it. Identical placement on every page.
    fn card_placement(&self, page_size: Size) -> (Pt, Pt, Pt, Pt) {
        let max_w = page_size.width - self.margins.left - self.margins.right;
        let max_h = page_size.height - self.margins.top - self.margins.bottom;
        let ratio = (max_w.to_f32() / CARD_WIDTH_PX as f32)
            .min(max_h.to_f32() / CARD_HEIGHT_PX as f32);
        let w = Pt::from_f32(CARD_WIDTH_PX as f32 * ratio);
        let h = Pt::from_f32(CARD_HEIGHT_PX as f32 * ratio);
        let x = self.margins.left + (max_w - w) / 2.0;
        let y = self.margins.top + (max_h - h) / 2.0;
        (x, y, w, h)
    }
}
