use crate::types::{Color, Pt, Size};

/// Recorded draw operations. Coordinates are top-left origin; the raster and
/// PDF backends flip into their native spaces themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    FillRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    CurveTo {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
        x: Pt,
        y: Pt,
    },
    ClosePath,
    Fill,
    Stroke,
    SetFontSize(Pt),
    /// Draw `text` with its baseline at `y`, left edge at `x`.
    DrawText {
        x: Pt,
        y: Pt,
        text: String,
    },
    /// Place an image resource (a `data:` URI or file path) into the given
    /// box. Used by the page assembly stage, one image per output page.
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

/// Records commands into pages. Redundant color/width/size changes are
/// dropped at record time so backends never see no-op state churn.
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::default(),
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_size: Pt::from_f32(12.0),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.fill_color == color {
            return;
        }
        self.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.stroke_color == color {
            return;
        }
        self.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.line_width == width {
            return;
        }
        self.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.font_size == size {
            return;
        }
        self.font_size = size;
        self.current.commands.push(Command::SetFontSize(size));
    }

    pub fn fill_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.commands.push(Command::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x: Pt, y: Pt) {
        self.current.commands.push(Command::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    pub fn close_path(&mut self) {
        self.current.commands.push(Command::ClosePath);
    }

    pub fn fill(&mut self) {
        self.current.commands.push(Command::Fill);
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    pub fn draw_text(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.current.commands.push(Command::DrawText {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_image(
        &mut self,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: impl Into<String>,
    ) {
        self.current.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.into(),
        });
    }

    /// Close the current page and start a fresh one with default state.
    pub fn show_page(&mut self) {
        let current = std::mem::take(&mut self.current);
        self.pages.push(current);
        self.fill_color = Color::BLACK;
        self.stroke_color = Color::BLACK;
        self.line_width = Pt::from_f32(1.0);
        self.font_size = Pt::from_f32(12.0);
    }

    /// Finish the document, flushing a trailing partial page if present.
    /// An untouched canvas still yields one (blank) page.
    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_flushes_pending_commands_into_a_page() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.fill_rect(Pt::ZERO, Pt::ZERO, Pt::from_f32(10.0), Pt::from_f32(10.0));
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].commands.len(), 1);
    }

    #[test]
    fn empty_canvas_finishes_with_one_blank_page() {
        let doc = Canvas::new(Size::a4()).finish();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].commands.is_empty());
    }

    #[test]
    fn show_page_keeps_page_order() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.draw_text(Pt::ZERO, Pt::ZERO, "first");
        canvas.show_page();
        canvas.draw_text(Pt::ZERO, Pt::ZERO, "second");
        canvas.show_page();
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 2);
        assert!(matches!(
            &doc.pages[0].commands[0],
            Command::DrawText { text, .. } if text == "first"
        ));
        assert!(matches!(
            &doc.pages[1].commands[0],
            Command::DrawText { text, .. } if text == "second"
        ));
    }

    #[test]
    fn redundant_state_changes_are_dropped() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Color::BLACK); // already the default
        canvas.set_fill_color(Color::WHITE);
        canvas.set_fill_color(Color::WHITE);
        let doc = canvas.finish();
        assert_eq!(doc.pages[0].commands.len(), 1);
    }

    #[test]
    fn state_resets_between_pages() {
        let mut canvas = Canvas::new(Size::a4());
        canvas.set_fill_color(Color::WHITE);
        canvas.show_page();
        canvas.set_fill_color(Color::WHITE);
        let doc = canvas.finish();
        // Second page must re-record the color after the reset.
        assert_eq!(doc.pages[1].commands.len(), 1);
    }
}
