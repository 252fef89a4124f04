//! Raster drawing surface backed by a tiny-skia pixmap
//!
//! Coordinates are pixels from the top left corner. Shapes are drawn without
//! antialiasing so fills and borders keep exact colors; glyphs are
//! antialiased.

use image::RgbImage;
use tiny_skia::{
    FillRule, LineCap, Paint, Path, PathBuilder, Pixmap, Stroke, Transform,
};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::error::{Error, Result};
use crate::types::Rgb;

pub struct RasterCanvas {
    pixmap: Pixmap,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32, background: Rgb) -> Result<Self> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::Render(format!("Invalid canvas dimensions {}x{}", width, height))
        })?;
        pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            255,
        ));
        Ok(Self { pixmap })
    }

    pub fn fill_polygon(&mut self, points: &[(f32, f32)], color: Rgb) {
        let mut builder = PathBuilder::new();
        let mut points = points.iter();
        let Some(&(x, y)) = points.next() else {
            return;
        };
        builder.move_to(x, y);
        for &(x, y) in points {
            builder.line_to(x, y);
        }
        builder.close();
        if let Some(path) = builder.finish() {
            self.fill(&path, color, false);
        }
    }

    /// Straight line with butt ends. A width of zero draws a one pixel
    /// hairline.
    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.0, from.1);
        builder.line_to(to.0, to.1);
        if let Some(path) = builder.finish() {
            self.stroke(&path, width, color);
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.fill(&path, color, false);
        }
    }

    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, width: f32, color: Rgb) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.stroke(&path, width, color);
        }
    }

    /// Draw `text` with its baseline starting at `(x, baseline)`. Characters
    /// missing from `face` use the notdef glyph.
    pub fn draw_text(
        &mut self,
        face: &Face<'_>,
        text: &str,
        x: f32,
        baseline: f32,
        size: f32,
        color: Rgb,
    ) {
        let scale = size / face.units_per_em() as f32;
        let mut builder = PathBuilder::new();
        let mut pen_x = x;
        for ch in text.chars() {
            let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
            let mut outline = GlyphOutline {
                builder: &mut builder,
                scale,
                x: pen_x,
                y: baseline,
            };
            face.outline_glyph(glyph, &mut outline);
            pen_x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
        }
        // Whitespace-only strings have no outline
        if let Some(path) = builder.finish() {
            self.fill(&path, color, true);
        }
    }

    fn fill(&mut self, path: &Path, color: Rgb, anti_alias: bool) {
        self.pixmap.fill_path(
            path,
            &paint(color, anti_alias),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    fn stroke(&mut self, path: &Path, width: f32, color: Rgb) {
        let stroke = Stroke {
            width,
            line_cap: LineCap::Butt,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            path,
            &paint(color, false),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    /// Drop the alpha channel. The background is opaque, so premultiplied
    /// and straight colors agree.
    pub fn into_image(self) -> Result<RgbImage> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let rgb: Vec<u8> = self
            .pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| Error::Render("Pixel buffer does not match canvas size".to_string()))
    }
}

fn paint(color: Rgb, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = anti_alias;
    paint
}

/// Feeds font units into a path, flipping y around the baseline
struct GlyphOutline<'a> {
    builder: &'a mut PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
}

impl GlyphOutline<'_> {
    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.y - y * self.scale)
    }
}

impl OutlineBuilder for GlyphOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x, y) = self.point(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x2, y2) = self.point(x2, y2);
        let (x, y) = self.point(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
