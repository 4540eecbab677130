//! Turns a card into draw commands in card-bitmap pixel space.

use crate::canvas::{Canvas, Command};
use crate::font::FontMetrics;
use crate::grid::{Card, GridSize};
use crate::layout::{CARD_HEIGHT_PX, CARD_WIDTH_PX, CardLayout};
use crate::types::{Color, Pt, Size};

// Cubic approximation factor for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// Record the full command list for one card page: white background, one
/// stroked rounded-rect border per cell, and the cell's number centered
/// both horizontally (by advance width) and vertically (by cap height).
pub(crate) fn card_commands(
    card: &Card,
    grid: GridSize,
    layout: &CardLayout,
    metrics: &FontMetrics,
) -> Vec<Command> {
    let mut canvas = Canvas::new(Size::from_px(CARD_WIDTH_PX, CARD_HEIGHT_PX));

    canvas.set_fill_color(Color::WHITE);
    canvas.fill_rect(
        Pt::ZERO,
        Pt::ZERO,
        Pt::from_u32(CARD_WIDTH_PX),
        Pt::from_u32(CARD_HEIGHT_PX),
    );

    canvas.set_stroke_color(Color::BLACK);
    canvas.set_line_width(Pt::from_f32(layout.border));
    canvas.set_fill_color(Color::BLACK);
    let font_size = Pt::from_f32(layout.font_px);
    canvas.set_font_size(font_size);

    let cap_height = metrics.cap_height(font_size);
    for row in 0..layout.side {
        for col in 0..layout.side {
            let (x, y, cell) = layout.cell_rect(row, col);
            rounded_rect(&mut canvas, x, y, cell, cell, layout.radius);
            canvas.stroke();

            // A permutation card always has side*side cells, so in-range
            // coordinates cannot miss.
            let Some(value) = card.value_at(grid, row, col) else {
                continue;
            };
            let text = value.to_string();
            let text_width = metrics.text_width(font_size, &text);
            let text_x = Pt::from_f32(x) + (Pt::from_f32(cell) - text_width) / 2.0;
            let baseline = Pt::from_f32(y) + (Pt::from_f32(cell) + cap_height) / 2.0;
            canvas.draw_text(text_x, baseline, text);
        }
    }

    let doc = canvas.finish();
    doc.pages.into_iter().next().unwrap_or_default().commands
}

/// Emit a rounded rectangle as a path: four edges joined by quarter-circle
/// cubics. The radius is clamped to half the shorter edge.
fn rounded_rect(canvas: &mut Canvas, x: f32, y: f32, w: f32, h: f32, radius: f32) {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let k = KAPPA * r;

    let (x0, y0) = (x, y);
    let (x1, y1) = (x + w, y + h);

    canvas.move_to(Pt::from_f32(x0 + r), Pt::from_f32(y0));
    canvas.line_to(Pt::from_f32(x1 - r), Pt::from_f32(y0));
    canvas.curve_to(
        Pt::from_f32(x1 - r + k),
        Pt::from_f32(y0),
        Pt::from_f32(x1),
        Pt::from_f32(y0 + r - k),
        Pt::from_f32(x1),
        Pt::from_f32(y0 + r),
    );
    canvas.line_to(Pt::from_f32(x1), Pt::from_f32(y1 - r));
    canvas.curve_to(
        Pt::from_f32(x1),
        Pt::from_f32(y1 - r + k),
        Pt::from_f32(x1 - r + k),
        Pt::from_f32(y1),
        Pt::from_f32(x1 - r),
        Pt::from_f32(y1),
    );
    canvas.line_to(Pt::from_f32(x0 + r), Pt::from_f32(y1));
    canvas.curve_to(
        Pt::from_f32(x0 + r - k),
        Pt::from_f32(y1),
        Pt::from_f32(x0),
        Pt::from_f32(y1 - r + k),
        Pt::from_f32(x0),
        Pt::from_f32(y1 - r),
    );
    canvas.line_to(Pt::from_f32(x0), Pt::from_f32(y0 + r));
    canvas.curve_to(
        Pt::from_f32(x0),
        Pt::from_f32(y0 + r - k),
        Pt::from_f32(x0 + r - k),
        Pt::from_f32(y0),
        Pt::from_f32(x0 + r),
        Pt::from_f32(y0),
    );
    canvas.close_path();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::host_registry;
    use crate::grid::GridSize;
    use crate::shuffle::generate_card;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn render_sample(grid: GridSize) -> Option<Vec<Command>> {
        let registry = host_registry()?;
        let metrics = registry.primary()?.metrics;
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let card = generate_card(grid, &mut rng);
        let layout = CardLayout::for_grid(grid);
        Some(card_commands(&card, grid, &layout, &metrics))
    }

    #[test]
    fn draws_one_number_per_cell_in_row_major_order() {
        let Some(commands) = render_sample(GridSize::Five) else {
            return;
        };
        let texts: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), GridSize::Five.cells());

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let card = generate_card(GridSize::Five, &mut rng);
        let expected: Vec<String> = card.cells().iter().map(|v| v.to_string()).collect();
        assert_eq!(texts, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn starts_with_a_white_background_fill() {
        let Some(commands) = render_sample(GridSize::Four) else {
            return;
        };
        assert_eq!(commands[0], Command::SetFillColor(Color::WHITE));
        assert!(matches!(commands[1], Command::FillRect { .. }));
    }

    #[test]
    fn strokes_one_border_per_cell() {
        let Some(commands) = render_sample(GridSize::Six) else {
            return;
        };
        let strokes = commands
            .iter()
            .filter(|c| matches!(c, Command::Stroke))
            .count();
        assert_eq!(strokes, GridSize::Six.cells());
    }

    #[test]
    fn numbers_stay_inside_their_cells() {
        let Some(commands) = render_sample(GridSize::Five) else {
            return;
        };
        let layout = CardLayout::for_grid(GridSize::Five);
        let grid_left = layout.origin_x;
        let grid_right =
            layout.origin_x + layout.side as f32 * layout.cell + (layout.side as f32 - 1.0) * layout.gap;
        for command in &commands {
            if let Command::DrawText { x, .. } = command {
                assert!(x.to_f32() >= grid_left);
                assert!(x.to_f32() <= grid_right);
            }
        }
    }
}
