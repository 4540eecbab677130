//! Fixed card geometry. One card is rasterized at A4 proportions in pixels
//! (96 DPI), so bitmap dimensions are known before any rendering happens and
//! are identical for every card in an export.

use crate::grid::GridSize;

/// Card bitmap width in pixels (A4 at 96 DPI).
pub const CARD_WIDTH_PX: u32 = 794;
/// Card bitmap height in pixels (A4 at 96 DPI).
pub const CARD_HEIGHT_PX: u32 = 1123;

const PADDING_PX: f32 = 64.0;
const GAP_PX: f32 = 12.0;
const BORDER_PX: f32 = 2.0;
const RADIUS_PX: f32 = 8.0;

/// Resolved pixel geometry for one grid size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    pub side: usize,
    /// Square cell edge, floored to a whole pixel.
    pub cell: f32,
    pub gap: f32,
    pub border: f32,
    pub radius: f32,
    /// Top-left corner of the grid, centered on the card bitmap.
    pub origin_x: f32,
    pub origin_y: f32,
    /// Number font size for this grid, in pixels.
    pub font_px: f32,
}

impl CardLayout {
    pub fn for_grid(grid: GridSize) -> Self {
        let side = grid.side();
        let content_w = CARD_WIDTH_PX as f32 - PADDING_PX * 2.0;
        let content_h = CARD_HEIGHT_PX as f32 - PADDING_PX * 2.0;
        let gaps = GAP_PX * (side as f32 - 1.0);
        let cell = ((content_w - gaps) / side as f32)
            .min((content_h - gaps) / side as f32)
            .floor();
        let grid_px = cell * side as f32 + gaps;

        // Denser grids get proportionally smaller digits so two-digit
        // numbers still fit inside the cell border.
        let font_ratio = match grid {
            GridSize::Four => 0.45,
            GridSize::Five => 0.40,
            GridSize::Six => 0.35,
        };

        Self {
            side,
            cell,
            gap: GAP_PX,
            border: BORDER_PX,
            radius: RADIUS_PX,
            origin_x: ((CARD_WIDTH_PX as f32 - grid_px) / 2.0).floor(),
            origin_y: ((CARD_HEIGHT_PX as f32 - grid_px) / 2.0).floor(),
            font_px: (cell * font_ratio).round(),
        }
    }

    /// Top-left corner and edge of the cell at `(row, col)`.
    pub fn cell_rect(&self, row: usize, col: usize) -> (f32, f32, f32) {
        let x = self.origin_x + col as f32 * (self.cell + self.gap);
        let y = self.origin_y + row as f32 * (self.cell + self.gap);
        (x, y, self.cell)
    }
}
