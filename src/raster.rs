//! CPU rasterization of recorded commands into an RGB bitmap, plus JPEG
//! encoding of the result. Glyphs are outlined straight from the font tables
//! and filled as paths; no shaping is involved since cards only draw digits.

use crate::canvas::Command;
use crate::error::BingoError;
use crate::font::RegisteredFont;
use crate::types::Color;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

struct RasterState {
    fill_color: Color,
    stroke_color: Color,
    line_width: f32,
    font_size: f32,
    path: PathBuilder,
}

impl RasterState {
    fn new() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: 1.0,
            font_size: 12.0,
            path: PathBuilder::new(),
        }
    }

    fn take_path(&mut self) -> Option<tiny_skia::Path> {
        std::mem::replace(&mut self.path, PathBuilder::new()).finish()
    }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        1.0,
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

/// Replay `commands` onto a fresh white pixmap of the given dimensions.
/// Coordinates are interpreted 1:1 as pixels, top-left origin.
pub(crate) fn rasterize(
    commands: &[Command],
    width: u32,
    height: u32,
    font: &RegisteredFont,
) -> Result<Pixmap, BingoError> {
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| BingoError::Raster(format!("invalid pixmap size {}x{}", width, height)))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let face = ttf_parser::Face::parse(&font.data, 0)
        .map_err(|err| BingoError::Raster(format!("font '{}' failed to parse: {}", font.name, err)))?;

    let mut state = RasterState::new();
    for command in commands {
        match command {
            Command::SetFillColor(color) => state.fill_color = *color,
            Command::SetStrokeColor(color) => state.stroke_color = *color,
            Command::SetLineWidth(width) => state.line_width = width.to_f32(),
            Command::SetFontSize(size) => state.font_size = size.to_f32(),
            Command::FillRect {
                x,
                y,
                width,
                height,
            } => {
                if let Some(rect) =
                    Rect::from_xywh(x.to_f32(), y.to_f32(), width.to_f32(), height.to_f32())
                {
                    let mut paint = Paint::default();
                    paint.set_color(skia_color(state.fill_color));
                    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
            Command::MoveTo { x, y } => state.path.move_to(x.to_f32(), y.to_f32()),
            Command::LineTo { x, y } => state.path.line_to(x.to_f32(), y.to_f32()),
            Command::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => state.path.cubic_to(
                x1.to_f32(),
                y1.to_f32(),
                x2.to_f32(),
                y2.to_f32(),
                x.to_f32(),
                y.to_f32(),
            ),
            Command::ClosePath => state.path.close(),
            Command::Fill => {
                if let Some(path) = state.take_path() {
                    let mut paint = Paint::default();
                    paint.set_color(skia_color(state.fill_color));
                    paint.anti_alias = true;
                    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
                }
            }
            Command::Stroke => {
                if let Some(path) = state.take_path() {
                    let mut paint = Paint::default();
                    paint.set_color(skia_color(state.stroke_color));
                    paint.anti_alias = true;
                    let stroke = Stroke {
                        width: state.line_width.max(0.1),
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                }
            }
            Command::DrawText { x, y, text } => {
                draw_text(
                    &mut pixmap,
                    &face,
                    text,
                    x.to_f32(),
                    y.to_f32(),
                    state.font_size,
                    state.fill_color,
                );
            }
            // Images never appear at the card raster stage; the page
            // assembly stage routes them to the PDF writer instead.
            Command::DrawImage { .. } => {}
        }
    }

    Ok(pixmap)
}

fn draw_text(
    pixmap: &mut Pixmap,
    face: &ttf_parser::Face,
    text: &str,
    x: f32,
    baseline_y: f32,
    size: f32,
    color: Color,
) {
    let upem = face.units_per_em() as f32;
    if upem <= 0.0 || size <= 0.0 {
        return;
    }
    let scale = size / upem;

    let mut pen_x = x;
    let mut builder = PathBuilder::new();
    for ch in text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            pen_x += size * 0.5;
            continue;
        };
        let mut outline = GlyphOutline {
            path: &mut builder,
            origin_x: pen_x,
            origin_y: baseline_y,
            scale,
        };
        face.outline_glyph(gid, &mut outline);
        pen_x += match face.glyph_hor_advance(gid) {
            Some(advance) => advance as f32 * scale,
            None => size * 0.5,
        };
    }

    if let Some(path) = builder.finish() {
        let mut paint = Paint::default();
        paint.set_color(skia_color(color));
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Adapts glyph outlines into pixmap space: scaled to the requested size,
/// translated to the pen position, y axis flipped from font-up to raster-down.
struct GlyphOutline<'a> {
    path: &'a mut PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl ttf_parser::OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path
            .move_to(self.origin_x + x * self.scale, self.origin_y - y * self.scale);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path
            .line_to(self.origin_x + x * self.scale, self.origin_y - y * self.scale);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.path.quad_to(
            self.origin_x + x1 * self.scale,
            self.origin_y - y1 * self.scale,
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.path.cubic_to(
            self.origin_x + x1 * self.scale,
            self.origin_y - y1 * self.scale,
            self.origin_x + x2 * self.scale,
            self.origin_y - y2 * self.scale,
            self.origin_x + x * self.scale,
            self.origin_y - y * self.scale,
        );
    }

    fn close(&mut self) {
        self.path.close();
    }
}

/// Encode the pixmap as baseline JPEG at the given quality (1..=100).
pub(crate) fn encode_jpeg(pixmap: &Pixmap, quality: u8) -> Result<Vec<u8>, BingoError> {
    let mut rgb = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 3);
    for pixel in pixmap.pixels() {
        let p = pixel.demultiply();
        rgb.extend_from_slice(&[p.red(), p.green(), p.blue()]);
    }

    let mut out = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder
        .encode(
            &rgb,
            pixmap.width(),
            pixmap.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|err| BingoError::Encode(err.to_string()))?;
    Ok(out)
}
