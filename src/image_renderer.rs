//! Raster backend: replays a document's commands onto tiny-skia canvases
//!
//! One canvas is produced per page when writing named files. A single sink
//! only ever receives one image: the selected page, or the first page.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat};
use log::{debug, trace, warn};
use ttf_parser::Face;

use crate::document::{Command, Document};
use crate::error::{Error, Result};
use crate::font_registry::{face_text_width, FontSource};
use crate::font_utils::{find_outline_font, load_font_file};
use crate::geometry::{plan_canvas, to_pixels, CanvasPlan};
use crate::raster_canvas::RasterCanvas;
use crate::types::{Alignment, ImageFormat, ImageOptions, Rgb};
use crate::validate::validate_page_number;

/// Render `document` to `<base>.<ext>`, `<base>_2.<ext>`, ... and return the
/// written paths in page order
pub fn save_images(
    document: &Document,
    base: &Path,
    format: ImageFormat,
    options: &ImageOptions,
) -> Result<Vec<PathBuf>> {
    let mut output = Output::Files {
        base,
        written: Vec::new(),
    };
    ImageRenderer::new(document, format, options)?.render(&mut output)?;
    match output {
        Output::Files { written, .. } => Ok(written),
        Output::Writer(_) => Ok(Vec::new()),
    }
}

/// Render one page of `document` into `sink`
pub fn write_image<W: Write>(
    document: &Document,
    sink: &mut W,
    format: ImageFormat,
    options: &ImageOptions,
) -> Result<()> {
    let mut output = Output::Writer(sink);
    ImageRenderer::new(document, format, options)?.render(&mut output)
}

/// Name of the `index`-th image (1-indexed) written for `base`
pub fn image_path(base: &Path, index: u32, format: ImageFormat) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    if index > 1 {
        name.push(format!("_{}", index));
    }
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

enum Output<'a> {
    Files {
        base: &'a Path,
        written: Vec<PathBuf>,
    },
    Writer(&'a mut dyn Write),
}

struct ImageRenderer<'a> {
    document: &'a Document,
    format: ImageFormat,
    options: &'a ImageOptions,
    selected_page: Option<u32>,
    plan: CanvasPlan,
    /// Outline font data per font name; `None` when no outlines were found
    outlines: HashMap<String, Option<Arc<Vec<u8>>>>,
}

impl<'a> ImageRenderer<'a> {
    fn new(document: &'a Document, format: ImageFormat, options: &'a ImageOptions) -> Result<Self> {
        let selected_page = options
            .page
            .map(|page| validate_page_number(page, document.pages()))
            .transpose()?;
        if let Some((width, height)) = options.size {
            if width == 0 || height == 0 {
                return Err(Error::Configuration(format!(
                    "Image size must be positive, got {}x{}",
                    width, height
                )));
            }
        }
        let native = (document.width() as u32, document.height() as u32);
        let plan = plan_canvas(native, options.size);
        debug!(
            "Rendering {} image: canvas {:?}, scale {:.4}, output {:?}, page {:?}",
            format, plan.canvas, plan.scale, plan.output, selected_page
        );
        Ok(Self {
            document,
            format,
            options,
            selected_page,
            plan,
            outlines: HashMap::new(),
        })
    }

    fn new_canvas(&self) -> Result<RasterCanvas> {
        let (width, height) = self.plan.canvas;
        RasterCanvas::new(width, height, self.options.background)
    }

    fn render(&mut self, output: &mut Output<'_>) -> Result<()> {
        let document = self.document;
        let single_sink = matches!(output, Output::Writer(_));
        let mut page = 1;
        let mut image_index = 1;
        let mut canvas = self.new_canvas()?;

        for command in document.commands() {
            if let Command::PageBreak = command {
                match self.selected_page {
                    Some(selected) if selected == page => break,
                    Some(_) => {}
                    None if single_sink => break,
                    None => {
                        let finished = std::mem::replace(&mut canvas, self.new_canvas()?);
                        self.persist(finished, image_index, output)?;
                        image_index += 1;
                    }
                }
                page += 1;
                continue;
            }
            if self.selected_page.map_or(true, |selected| selected == page) {
                trace!("Image command on page {}: {:?}", page, command);
                self.draw(&mut canvas, command)?;
            }
        }
        self.persist(canvas, image_index, output)
    }

    fn draw(&mut self, canvas: &mut RasterCanvas, command: &Command) -> Result<()> {
        let scale = self.plan.scale;
        let px = |units: i32| to_pixels(units, scale) as f32;
        match command {
            Command::Text {
                string,
                x,
                y,
                alignment,
                font,
                size,
                color,
            } => {
                let (x, y, size) = (px(*x), px(*y), px(*size));
                self.draw_text(canvas, string, x, y, *alignment, font, size, *color)?;
            }
            Command::Line {
                x,
                y,
                x1,
                y1,
                width,
                color,
            } => canvas.line((px(*x), px(*y)), (px(*x1), px(*y1)), px(*width), *color),
            Command::Rectangle {
                x,
                y,
                w,
                h,
                fill_color,
                border_color,
                border_width,
            } => {
                let (x, y) = (px(*x), px(*y));
                let (x1, y1) = (x + px(*w), y + px(*h));
                if let Some(fill) = fill_color {
                    canvas.fill_polygon(&[(x, y), (x1, y), (x1, y1), (x, y1)], *fill);
                }
                if let Some(border) = border_color {
                    // Vertical edges reach over the corners of the horizontal ones
                    let width = px(*border_width);
                    let half = width * 0.5;
                    canvas.line((x, y), (x1, y), width, *border);
                    canvas.line((x1, y - half), (x1, y1 + half), width, *border);
                    canvas.line((x1, y1), (x, y1), width, *border);
                    canvas.line((x, y1 + half), (x, y - half), width, *border);
                }
            }
            Command::Circle {
                x,
                y,
                radius,
                fill_color,
                border_color,
                border_width,
            } => {
                let (x, y, radius) = (px(*x), px(*y), px(*radius));
                if let Some(fill) = fill_color {
                    canvas.fill_circle(x, y, radius, *fill);
                }
                if let Some(border) = border_color {
                    canvas.stroke_circle(x, y, radius, px(*border_width), *border);
                }
            }
            Command::PageBreak => {}
        }
        Ok(())
    }

    /// `y` is the bottom of the text: the baseline sits one descent above it
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        canvas: &mut RasterCanvas,
        text: &str,
        x: f32,
        y: f32,
        alignment: Alignment,
        font: &str,
        size: f32,
        color: Rgb,
    ) -> Result<()> {
        let Some(data) = self.outline_data(font)? else {
            warn!("No outline font available for {}, skipping text {:?}", font, text);
            return Ok(());
        };
        let face = Face::parse(&data, 0)
            .map_err(|e| Error::Font(format!("Invalid font {}: {}", font, e)))?;
        let width = face_text_width(&face, text, size as f64) as f32;
        let descent = face.descender() as f32 * size / face.units_per_em() as f32;
        let x = x - alignment.offset(width as f64) as f32;
        canvas.draw_text(&face, text, x, y + descent, size, color);
        Ok(())
    }

    fn outline_data(&mut self, font: &str) -> Result<Option<Arc<Vec<u8>>>> {
        if let Some(cached) = self.outlines.get(font) {
            return Ok(cached.clone());
        }
        let data = match self.document.fonts().source(font) {
            Some(FontSource::TrueType(data)) => Some(Arc::clone(data)),
            Some(FontSource::Standard(standard)) => match find_outline_font(*standard) {
                Some(path) => {
                    debug!("Using {} for {} outlines", path.display(), font);
                    Some(Arc::new(load_font_file(&path)?))
                }
                None => None,
            },
            None => return Err(Error::Font(format!("Font {} is not registered", font))),
        };
        self.outlines.insert(font.to_string(), data.clone());
        Ok(data)
    }

    fn output_format(&self) -> ImageOutputFormat {
        match self.format {
            ImageFormat::Png => ImageOutputFormat::Png,
            ImageFormat::Gif => ImageOutputFormat::Gif,
            ImageFormat::Jpeg => ImageOutputFormat::Jpeg(self.options.jpeg_quality),
        }
    }

    /// Resize if the plan asks for it, encode and write one image
    fn persist(&self, canvas: RasterCanvas, index: u32, output: &mut Output<'_>) -> Result<()> {
        let mut image = DynamicImage::ImageRgb8(canvas.into_image()?);
        if let Some((width, height)) = self.plan.output {
            image = image.resize_exact(width, height, FilterType::Lanczos3);
        }
        let mut encoded = Cursor::new(Vec::new());
        image.write_to(&mut encoded, self.output_format())?;
        let bytes = encoded.into_inner();

        match output {
            Output::Files { base, written } => {
                let path = image_path(base, index, self.format);
                let mut file = BufWriter::new(File::create(&path)?);
                file.write_all(&bytes)?;
                file.flush()?;
                debug!(
                    "Saved {}x{} image to {}",
                    image.width(),
                    image.height(),
                    path.display()
                );
                written.push(path);
            }
            Output::Writer(sink) => {
                sink.write_all(&bytes)?;
                sink.flush()?;
                debug!("Wrote {}x{} image ({} bytes)", image.width(), image.height(), bytes.len());
            }
        }
        Ok(())
    }
}
