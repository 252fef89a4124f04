//! PDF backend: replays a document's commands onto pdf-writer pages
//!
//! Every page break closes the current page and opens a new one of the same
//! size. Fonts are embedded the first time a page uses them.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use pdf_writer::{Finish, Name, Pdf, Rect, Ref, TextStr};

use crate::canvas::{PaintMode, PdfCanvas};
use crate::document::{Command, Document};
use crate::error::{Error, Result};
use crate::font_registry::{FontRegistry, FontSource};
use crate::font_utils::{add_truetype_font, encode_cids, CidMap};
use crate::geometry::units_to_points;
use crate::types::{Alignment, Metadata, Rgb};
use crate::unicode_utils::unicode_to_winansi;

/// Render `document` and write it to `<base>.pdf`. Returns the written path.
pub fn save_pdf(document: &Document, metadata: &Metadata, base: &Path) -> Result<PathBuf> {
    let mut file_name = base.as_os_str().to_owned();
    file_name.push(".pdf");
    let path = PathBuf::from(file_name);

    let bytes = render_pdf(document, metadata)?;
    std::fs::write(&path, bytes)?;
    debug!("Saved PDF to {}", path.display());
    Ok(path)
}

/// Render `document` into `sink`
pub fn write_pdf<W: Write>(document: &Document, metadata: &Metadata, sink: &mut W) -> Result<()> {
    let bytes = render_pdf(document, metadata)?;
    sink.write_all(&bytes)?;
    sink.flush()?;
    Ok(())
}

/// Render `document` to PDF bytes. `metadata` goes to the document
/// information dictionary; it is omitted when every field is empty.
pub fn render_pdf(document: &Document, metadata: &Metadata) -> Result<Vec<u8>> {
    debug!(
        "Rendering PDF: {} command(s) on {} page(s)",
        document.commands().len(),
        document.pages()
    );
    let mut renderer = PdfRenderer::new(document, metadata);
    for command in document.commands() {
        trace!("PDF command: {:?}", command);
        renderer.draw(command)?;
    }
    let bytes = renderer.finish()?;
    debug!("PDF rendered: {} bytes", bytes.len());
    Ok(bytes)
}

/// A font object written to the PDF
struct EmbeddedFont {
    resource: String,
    id: Ref,
    /// Present for Type0 fonts, whose text is shown as glyph ids
    cids: Option<CidMap>,
}

struct PageState {
    id: Ref,
    content_id: Ref,
    canvas: PdfCanvas,
    /// Resource name -> font object used on this page
    fonts: BTreeMap<String, Ref>,
}

struct PdfRenderer<'a> {
    registry: &'a FontRegistry,
    pdf: Pdf,
    next_ref_id: i32,
    page_tree_id: Ref,
    page_size: (f32, f32),
    pages: Vec<Ref>,
    embedded: HashMap<String, EmbeddedFont>,
    current_page: Option<PageState>,
}

impl<'a> PdfRenderer<'a> {
    fn new(document: &'a Document, metadata: &Metadata) -> Self {
        let mut pdf = Pdf::new();
        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        pdf.catalog(catalog_id).pages(page_tree_id);

        let mut renderer = Self {
            registry: document.fonts(),
            pdf,
            next_ref_id: 3,
            page_tree_id,
            page_size: (
                units_to_points(document.width()),
                units_to_points(document.height()),
            ),
            pages: Vec::new(),
            embedded: HashMap::new(),
            current_page: None,
        };
        renderer.write_info(metadata);
        renderer.new_page();
        renderer
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_ref_id);
        self.next_ref_id += 1;
        id
    }

    fn write_info(&mut self, metadata: &Metadata) {
        if metadata.is_empty() {
            return;
        }
        let info_id = self.alloc();
        let mut info = self.pdf.document_info(info_id);
        if let Some(author) = &metadata.author {
            info.author(TextStr(author));
        }
        if let Some(title) = &metadata.title {
            info.title(TextStr(title));
        }
        if let Some(subject) = &metadata.subject {
            info.subject(TextStr(subject));
        }
    }

    /// Close the current page and open a new one
    fn new_page(&mut self) {
        self.finish_page();

        let id = self.alloc();
        let content_id = self.alloc();
        self.pages.push(id);
        self.current_page = Some(PageState {
            id,
            content_id,
            canvas: PdfCanvas::new(self.page_size.1),
            fonts: BTreeMap::new(),
        });
    }

    /// Write the content stream and page object of the current page
    fn finish_page(&mut self) {
        let Some(PageState {
            id,
            content_id,
            canvas,
            fonts,
        }) = self.current_page.take()
        else {
            return;
        };
        self.pdf.stream(content_id, &canvas.finish());

        let (width, height) = self.page_size;
        let mut page = self.pdf.page(id);
        page.media_box(Rect::new(0.0, 0.0, width, height))
            .parent(self.page_tree_id)
            .contents(content_id);
        if !fonts.is_empty() {
            let mut resources = page.resources();
            let mut font_dict = resources.fonts();
            for (name, font_id) in &fonts {
                font_dict.pair(Name(name.as_bytes()), *font_id);
            }
        }
        page.finish();
        debug!("Flushed PDF page {}", self.pages.len());
    }

    fn page_mut(&mut self) -> Result<&mut PageState> {
        self.current_page
            .as_mut()
            .ok_or_else(|| Error::Render("No open PDF page".to_string()))
    }

    fn draw(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Text {
                string,
                x,
                y,
                alignment,
                font,
                size,
                color,
            } => self.draw_text(string, *x, *y, *alignment, font, *size, *color),
            Command::Line {
                x,
                y,
                x1,
                y1,
                width,
                color,
            } => {
                let canvas = &mut self.page_mut()?.canvas;
                canvas.set_line_width(units_to_points(*width));
                canvas.set_stroke_color(*color);
                canvas.line(
                    units_to_points(*x),
                    units_to_points(*y),
                    units_to_points(*x1),
                    units_to_points(*y1),
                );
                Ok(())
            }
            Command::Rectangle {
                x,
                y,
                w,
                h,
                fill_color,
                border_color,
                border_width,
            } => {
                let (x, y) = (units_to_points(*x), units_to_points(*y));
                let (w, h) = (units_to_points(*w), units_to_points(*h));
                self.draw_shape(*fill_color, *border_color, *border_width, |canvas, mode| {
                    canvas.rect(x, y, w, h, mode)
                })
            }
            Command::Circle {
                x,
                y,
                radius,
                fill_color,
                border_color,
                border_width,
            } => {
                let (x, y) = (units_to_points(*x), units_to_points(*y));
                let radius = units_to_points(*radius);
                self.draw_shape(*fill_color, *border_color, *border_width, |canvas, mode| {
                    canvas.circle(x, y, radius, mode)
                })
            }
            Command::PageBreak => {
                self.new_page();
                Ok(())
            }
        }
    }

    /// Filled shapes are outlined in their fill color at zero width when
    /// they have no border.
    fn draw_shape(
        &mut self,
        fill: Option<Rgb>,
        border: Option<Rgb>,
        border_width: i32,
        path: impl FnOnce(&mut PdfCanvas, PaintMode),
    ) -> Result<()> {
        let canvas = &mut self.page_mut()?.canvas;
        let mode = match (fill, border) {
            (Some(fill), border) => {
                canvas.set_fill_color(fill);
                match border {
                    Some(border) if border_width > 0 => {
                        canvas.set_stroke_color(border);
                        canvas.set_line_width(units_to_points(border_width));
                    }
                    _ => {
                        canvas.set_stroke_color(fill);
                        canvas.set_line_width(0.0);
                    }
                }
                PaintMode::FillAndStroke
            }
            (None, Some(border)) => {
                canvas.set_stroke_color(border);
                canvas.set_line_width(units_to_points(border_width));
                PaintMode::Stroke
            }
            (None, None) => return Ok(()),
        };
        path(canvas, mode);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        alignment: Alignment,
        font: &str,
        size: i32,
        color: Rgb,
    ) -> Result<()> {
        let registry = self.registry;
        let source = registry
            .source(font)
            .ok_or_else(|| Error::Font(format!("Font {} is not registered", font)))?;
        let size_pt = units_to_points(size);
        let width = source.text_width(text, size_pt as f64);
        let x_pt = units_to_points(x) - alignment.offset(width) as f32;

        self.embed_font(font, source)?;
        let embedded = self
            .embedded
            .get(font)
            .ok_or_else(|| Error::Font(format!("Font {} was not embedded", font)))?;
        let encoded = match &embedded.cids {
            Some(cids) => encode_cids(text, cids),
            None => unicode_to_winansi(text),
        };
        let resource = embedded.resource.clone();
        let font_id = embedded.id;

        let page = self.page_mut()?;
        page.fonts.insert(resource.clone(), font_id);
        page.canvas.set_fill_color(color);
        page.canvas.draw_text(
            Name(resource.as_bytes()),
            size_pt,
            x_pt,
            units_to_points(y),
            &encoded,
        );
        Ok(())
    }

    fn embed_font(&mut self, font: &str, source: &FontSource) -> Result<()> {
        if self.embedded.contains_key(font) {
            return Ok(());
        }
        let id = self.alloc();
        let resource = format!("F{}", self.embedded.len() + 1);
        let cids = match source {
            FontSource::Standard(standard) => {
                self.pdf
                    .type1_font(id)
                    .base_font(Name(standard.base_font().as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                None
            }
            FontSource::TrueType(data) => {
                Some(add_truetype_font(&mut self.pdf, data, id, &mut self.next_ref_id)?)
            }
        };
        debug!("Embedded font {} as /{}", font, resource);
        self.embedded.insert(
            font.to_string(),
            EmbeddedFont { resource, id, cids },
        );
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        self.finish_page();
        if self.pages.is_empty() {
            return Err(Error::Render("PDF has no pages".to_string()));
        }
        self.pdf
            .pages(self.page_tree_id)
            .kids(self.pages.iter().copied())
            .count(self.pages.len() as i32);
        Ok(self.pdf.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ColorValue;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    #[test]
    fn test_empty_document_has_one_page() {
        init();
        let doc = Document::new("letter", "portrait").unwrap();
        let bytes = render_pdf(&doc, &Metadata::default()).unwrap();
        let pdf = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 1);
        assert!(contains(&bytes, "/MediaBox [0 0 612 792]"));
        assert!(!contains(&bytes, "/Author"));
    }

    #[test]
    fn test_page_breaks_start_pages() {
        init();
        let mut doc = Document::new("a4", "portrait").unwrap();
        doc.draw_line(0, 0, 100, 100, 10, (0, 0, 0)).unwrap();
        doc.insert_page_break();
        doc.insert_page_break();
        let bytes = render_pdf(&doc, &Metadata::default()).unwrap();
        let pdf = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 3);
    }

    #[test]
    fn test_every_page_linked_to_page_tree() {
        init();
        let mut doc = Document::new("letter", "portrait").unwrap();
        doc.draw_string("One", 100, 100, "left", "Helvetica", 100, (0, 0, 0))
            .unwrap();
        doc.insert_page_break();
        doc.draw_string("Two", 100, 100, "left", "Times-Roman", 100, (0, 0, 0))
            .unwrap();
        let bytes = render_pdf(&doc, &Metadata::default()).unwrap();
        let pdf = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = pdf.get_pages();
        assert_eq!(pages.len(), 2);
        for page_id in pages.values() {
            let page = pdf.get_dictionary(*page_id).unwrap();
            assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), (2, 0));
            assert!(page.has(b"Contents"));
            assert!(page.has(b"Resources"));
        }
    }

    #[test]
    fn test_landscape_media_box() {
        init();
        let doc = Document::new("letter", "landscape").unwrap();
        let bytes = render_pdf(&doc, &Metadata::default()).unwrap();
        assert!(contains(&bytes, "/MediaBox [0 0 792 612]"));
    }

    #[test]
    fn test_metadata_written() {
        init();
        let doc = Document::new("letter", "portrait").unwrap();
        let metadata = Metadata {
            author: Some("Person Name".to_string()),
            title: None,
            subject: Some("Testing".to_string()),
        };
        let bytes = render_pdf(&doc, &metadata).unwrap();
        assert!(contains(&bytes, "/Author (Person Name)"));
        assert!(contains(&bytes, "/Subject (Testing)"));
        assert!(!contains(&bytes, "/Title"));
    }

    #[test]
    fn test_standard_font_embedded_once() {
        init();
        let mut doc = Document::new("letter", "portrait").unwrap();
        doc.draw_string("Hello", 100, 100, "left", "Helvetica-Bold", 100, (0, 0, 0))
            .unwrap();
        doc.insert_page_break();
        doc.draw_string("World", 100, 100, "right", "helvetica-bold", 100, "#333")
            .unwrap();
        let bytes = render_pdf(&doc, &Metadata::default()).unwrap();
        assert_eq!(
            bytes
                .windows(b"/BaseFont /Helvetica-Bold".len())
                .filter(|w| *w == b"/BaseFont /Helvetica-Bold")
                .count(),
            1
        );
        assert!(contains(&bytes, "/Encoding /WinAnsiEncoding"));
        assert!(contains(&bytes, "(Hello) Tj"));
        assert!(contains(&bytes, "(World) Tj"));
    }

    #[test]
    fn test_unbordered_rectangle_outlined_in_fill() {
        init();
        let mut doc = Document::new("letter", "portrait").unwrap();
        doc.draw_rectangle(0, 0, 100, 100, (255, 0, 0), ColorValue::None, 0)
            .unwrap();
        let bytes = render_pdf(&doc, &Metadata::default()).unwrap();
        assert!(contains(&bytes, "1 0 0 rg"));
        assert!(contains(&bytes, "1 0 0 RG"));
        assert!(contains(&bytes, "0 w"));
    }

    #[test]
    fn test_save_pdf_appends_extension() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::new("a4", "landscape").unwrap();
        let path = save_pdf(&doc, &Metadata::default(), &dir.path().join("report")).unwrap();
        assert_eq!(path, dir.path().join("report.pdf"));
        assert!(path.exists());
    }
}
