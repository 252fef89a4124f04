//! Canvas-like API wrapper for pdf-writer
//!
//! Coordinates are PDF points measured from the top left corner of the page,
//! as documents are laid out. The canvas flips them onto the bottom-up PDF
//! coordinate system.

use pdf_writer::{Content, Name, Str};

use crate::types::Rgb;

/// Bezier control point distance for a quarter circle of radius 1
const KAPPA: f32 = 0.552_284_75;

/// Graphics state mirrored from the content stream. Starts at the PDF
/// defaults so unchanged operators are not repeated.
#[derive(Debug, Clone, Copy)]
pub struct CanvasState {
    pub fill_color: Rgb,
    pub stroke_color: Rgb,
    pub line_width: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            fill_color: Rgb::black(),
            stroke_color: Rgb::black(),
            line_width: 1.0,
        }
    }
}

/// How a closed path is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Stroke,
    FillAndStroke,
}

/// Content stream of one page
pub struct PdfCanvas {
    content: Content,
    state: CanvasState,
    page_height: f32,
}

impl PdfCanvas {
    pub fn new(page_height: f32) -> Self {
        Self {
            content: Content::new(),
            state: CanvasState::default(),
            page_height,
        }
    }

    /// Get content (for finalizing)
    pub fn finish(self) -> Vec<u8> {
        self.content.finish()
    }

    fn flip(&self, y: f32) -> f32 {
        self.page_height - y
    }

    // ===== Colors =====

    pub fn set_fill_color(&mut self, color: Rgb) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        let (r, g, b) = color.to_pdf_rgb();
        self.content.set_fill_rgb(r, g, b);
    }

    pub fn set_stroke_color(&mut self, color: Rgb) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        let (r, g, b) = color.to_pdf_rgb();
        self.content.set_stroke_rgb(r, g, b);
    }

    // ===== Line Styles =====

    pub fn set_line_width(&mut self, width: f32) {
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.content.set_line_width(width);
    }

    // ===== Drawing =====

    /// Rectangle with its upper left corner at `(x, y)`
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, mode: PaintMode) {
        self.content.rect(x, self.flip(y) - height, width, height);
        self.paint(mode);
    }

    /// Circle centered on `(cx, cy)`, built from four cubic curves
    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32, mode: PaintMode) {
        let cy = self.flip(cy);
        let c = radius * KAPPA;

        self.content.move_to(cx + radius, cy);
        self.content
            .cubic_to(cx + radius, cy + c, cx + c, cy + radius, cx, cy + radius);
        self.content
            .cubic_to(cx - c, cy + radius, cx - radius, cy + c, cx - radius, cy);
        self.content
            .cubic_to(cx - radius, cy - c, cx - c, cy - radius, cx, cy - radius);
        self.content
            .cubic_to(cx + c, cy - radius, cx + radius, cy - c, cx + radius, cy);
        self.content.close_path();
        self.paint(mode);
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.content.move_to(x1, self.flip(y1));
        self.content.line_to(x2, self.flip(y2));
        self.content.stroke();
    }

    fn paint(&mut self, mode: PaintMode) {
        match mode {
            PaintMode::Stroke => self.content.stroke(),
            PaintMode::FillAndStroke => self.content.fill_nonzero_and_stroke(),
        };
    }

    // ===== Text =====

    /// Show pre-encoded text with its baseline starting at `(x, y)`
    pub fn draw_text(&mut self, font: Name<'_>, size: f32, x: f32, y: f32, encoded: &[u8]) {
        self.content.begin_text();
        self.content.set_font(font, size);
        self.content.next_line(x, self.flip(y));
        self.content.show(Str(encoded));
        self.content.end_text();
    }
}
