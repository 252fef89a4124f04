//! Document model: page geometry, metadata and the ordered command list
//!
//! Drawing calls validate every argument before appending a [`Command`], so
//! a failed call leaves the document untouched. Rendering only reads the
//! command list, which lets one document be rendered any number of times.

use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::font_registry::FontRegistry;
use crate::types::{page_dimensions, Alignment, ImageOptions, Metadata, Orientation, PageSize, Rgb};
use crate::validate::{
    validate_alignment, validate_color, validate_coordinate, validate_extent,
    validate_non_negative, ColorValue, ToInteger,
};
use crate::{image_renderer, pdf_renderer};

/// One recorded drawing operation, in document units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// `y` is the bottom of the text
    Text {
        string: String,
        x: i32,
        y: i32,
        alignment: Alignment,
        font: String,
        size: i32,
        color: Rgb,
    },
    Line {
        x: i32,
        y: i32,
        x1: i32,
        y1: i32,
        width: i32,
        color: Rgb,
    },
    /// `(x, y)` is the upper left corner
    Rectangle {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        fill_color: Option<Rgb>,
        border_color: Option<Rgb>,
        border_width: i32,
    },
    /// `(x, y)` is the center
    Circle {
        x: i32,
        y: i32,
        radius: i32,
        fill_color: Option<Rgb>,
        border_color: Option<Rgb>,
        border_width: i32,
    },
    PageBreak,
}

/// A paginated drawing built from validated commands
#[derive(Debug, Clone)]
pub struct Document {
    size: PageSize,
    orientation: Orientation,
    width: i32,
    height: i32,
    metadata: Metadata,
    fonts: FontRegistry,
    commands: Vec<Command>,
    pages: u32,
}

impl Document {
    /// Create a document from case-insensitive size (`a4`, `letter`) and
    /// orientation (`portrait`, `landscape`) names, using the standard fonts
    pub fn new(size: &str, orientation: &str) -> Result<Self> {
        Ok(Self::with_fonts(size.parse()?, orientation.parse()?, FontRegistry::standard()))
    }

    pub fn with_fonts(size: PageSize, orientation: Orientation, fonts: FontRegistry) -> Self {
        let (width, height) = page_dimensions(size, orientation);
        Self {
            size,
            orientation,
            width,
            height,
            metadata: Metadata::default(),
            fonts,
            commands: Vec::new(),
            pages: 1,
        }
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Page width in hundredths of a centimeter
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Page height in hundredths of a centimeter
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of pages: one plus the number of page breaks
    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Registry used to validate font names of later drawing calls
    pub fn fonts_mut(&mut self) -> &mut FontRegistry {
        &mut self.fonts
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.metadata.author = Some(author.into());
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.title = Some(title.into());
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.metadata.subject = Some(subject.into());
    }

    /// Add a string whose bottom edge sits at `y`. `alignment` decides
    /// whether `x` is the left edge, the right edge or the middle.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_string(
        &mut self,
        string: impl Display,
        x: impl ToInteger,
        y: impl ToInteger,
        alignment: impl AsRef<str>,
        font: &str,
        size: impl ToInteger,
        color: impl Into<ColorValue>,
    ) -> std::result::Result<(), ValidationError> {
        let command = Command::Text {
            string: string.to_string(),
            x: validate_coordinate("x", x, self.width)?,
            y: validate_coordinate("y", y, self.height)?,
            alignment: validate_alignment(alignment)?,
            font: self.fonts.resolve(font)?.to_string(),
            size: validate_non_negative("size", size)?,
            color: required_color(color)?,
        };
        self.commands.push(command);
        Ok(())
    }

    /// Add a line from `(x, y)` to `(x1, y1)`
    pub fn draw_line(
        &mut self,
        x: impl ToInteger,
        y: impl ToInteger,
        x1: impl ToInteger,
        y1: impl ToInteger,
        width: impl ToInteger,
        color: impl Into<ColorValue>,
    ) -> std::result::Result<(), ValidationError> {
        let command = Command::Line {
            x: validate_coordinate("x", x, self.width)?,
            y: validate_coordinate("y", y, self.height)?,
            x1: validate_coordinate("x1", x1, self.width)?,
            y1: validate_coordinate("y1", y1, self.height)?,
            width: validate_non_negative("width", width)?,
            color: required_color(color)?,
        };
        self.commands.push(command);
        Ok(())
    }

    /// Add a rectangle with its upper left corner at `(x, y)`.
    ///
    /// A `border_width` of 0 means no border; a rectangle needs a fill or a
    /// border.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rectangle(
        &mut self,
        x: impl ToInteger,
        y: impl ToInteger,
        w: impl ToInteger,
        h: impl ToInteger,
        fill_color: impl Into<ColorValue>,
        border_color: impl Into<ColorValue>,
        border_width: impl ToInteger,
    ) -> std::result::Result<(), ValidationError> {
        let (fill_color, border_color, border_width) =
            shape_paint("Rectangle", fill_color, border_color, border_width)?;
        let x = validate_coordinate("x", x, self.width)?;
        let y = validate_coordinate("y", y, self.height)?;
        let command = Command::Rectangle {
            x,
            y,
            w: validate_extent("width", x, w, self.width)?,
            h: validate_extent("height", y, h, self.height)?,
            fill_color: validate_color(fill_color, false)?,
            border_color,
            border_width,
        };
        self.commands.push(command);
        Ok(())
    }

    /// Add a circle centered on `(x, y)`
    #[allow(clippy::too_many_arguments)]
    pub fn draw_circle(
        &mut self,
        x: impl ToInteger,
        y: impl ToInteger,
        radius: impl ToInteger,
        fill_color: impl Into<ColorValue>,
        border_color: impl Into<ColorValue>,
        border_width: impl ToInteger,
    ) -> std::result::Result<(), ValidationError> {
        let (fill_color, border_color, border_width) =
            shape_paint("Circle", fill_color, border_color, border_width)?;
        let command = Command::Circle {
            x: validate_coordinate("x", x, self.width)?,
            y: validate_coordinate("y", y, self.height)?,
            radius: validate_non_negative("radius", radius)?,
            fill_color: validate_color(fill_color, false)?,
            border_color,
            border_width,
        };
        self.commands.push(command);
        Ok(())
    }

    /// Start a new page. Each page becomes its own image when rendered as
    /// images.
    pub fn insert_page_break(&mut self) {
        self.pages += 1;
        self.commands.push(Command::PageBreak);
    }

    /// Pretty-printed JSON of the recorded commands
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.commands)?)
    }

    /// Write the document as `<file_name>.pdf`
    pub fn generate_pdf(&self, file_name: impl AsRef<Path>) -> Result<PathBuf> {
        pdf_renderer::save_pdf(self, self.metadata(), file_name.as_ref())
    }

    /// Write the document as PDF to `sink`
    pub fn write_pdf<W: Write>(&self, sink: &mut W) -> Result<()> {
        pdf_renderer::write_pdf(self, self.metadata(), sink)
    }

    /// Write the document as images named `<file_name>.<ext>`,
    /// `<file_name>_2.<ext>`, ... (one per page, or only the selected page).
    /// Returns the written paths.
    pub fn generate_image(
        &self,
        file_name: impl AsRef<Path>,
        format: &str,
        options: &ImageOptions,
    ) -> Result<Vec<PathBuf>> {
        image_renderer::save_images(self, file_name.as_ref(), format.parse()?, options)
    }

    /// Write a single image to `sink`: the selected page, or the first page
    pub fn write_image<W: Write>(
        &self,
        sink: &mut W,
        format: &str,
        options: &ImageOptions,
    ) -> Result<()> {
        image_renderer::write_image(self, sink, format.parse()?, options)
    }
}

fn required_color(color: impl Into<ColorValue>) -> std::result::Result<Rgb, ValidationError> {
    validate_color(color, true)?.ok_or_else(|| ValidationError::ColorShape("None".to_string()))
}

/// Validate the paint of a rectangle or circle. Rejects a shape with neither
/// fill nor border before any color is resolved. The border color is only
/// resolved when the border has a width.
fn shape_paint(
    shape: &'static str,
    fill_color: impl Into<ColorValue>,
    border_color: impl Into<ColorValue>,
    border_width: impl ToInteger,
) -> std::result::Result<(ColorValue, Option<Rgb>, i32), ValidationError> {
    let fill_color = fill_color.into();
    let border_color = border_color.into();
    let border_width = validate_non_negative("border width", border_width)?;
    if fill_color.is_absent() && (border_width == 0 || border_color.is_absent()) {
        return Err(ValidationError::InvisibleShape(shape));
    }
    let border_color = if border_width > 0 {
        validate_color(border_color, true)?
    } else {
        None
    };
    Ok((fill_color, border_color, border_width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn letter() -> Document {
        Document::new("letter", "portrait").unwrap()
    }

    #[test]
    fn test_document_dimensions() {
        let doc = Document::new("A4", "Landscape").unwrap();
        assert_eq!((doc.width(), doc.height()), (2970, 2100));
        assert_eq!(doc.size(), PageSize::A4);
        assert_eq!(doc.orientation(), Orientation::Landscape);
        assert_eq!(doc.pages(), 1);
        assert!(doc.commands().is_empty());
    }

    #[test]
    fn test_invalid_document_configuration() {
        assert!(matches!(Document::new("a3", "portrait"), Err(Error::Configuration(_))));
        assert!(matches!(Document::new("a4", "upright"), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_draw_string_normalizes_arguments() {
        let mut doc = letter();
        doc.draw_string(42, "100", 200.7, "MIDDLE", "helvetica-bold", 100, "#000")
            .unwrap();
        assert_eq!(
            doc.commands(),
            &[Command::Text {
                string: "42".to_string(),
                x: 100,
                y: 200,
                alignment: Alignment::Middle,
                font: "Helvetica-Bold".to_string(),
                size: 100,
                color: Rgb::black(),
            }]
        );
    }

    #[test]
    fn test_draw_string_rejects_unknown_font() {
        let mut doc = letter();
        let err = doc
            .draw_string("Hi", 0, 0, "left", "OpenSans-Bold", 100, (0, 0, 0))
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownFont("OpenSans-Bold".to_string()));
        assert!(doc.commands().is_empty());
    }

    #[test]
    fn test_failed_call_appends_nothing() {
        let mut doc = letter();
        // The color is validated after every coordinate
        assert!(doc.draw_line(0, 0, 100, 100, 10, (0, 0, 300)).is_err());
        assert!(doc.draw_line(0, 0, 3000, 100, 10, (0, 0, 0)).is_err());
        assert!(doc.commands().is_empty());
    }

    #[test]
    fn test_invisible_shapes_rejected() {
        let mut doc = letter();
        assert_eq!(
            doc.draw_rectangle(0, 0, 10, 10, ColorValue::None, (0, 0, 0), 0),
            Err(ValidationError::InvisibleShape("Rectangle"))
        );
        assert_eq!(
            doc.draw_rectangle(0, 0, 10, 10, ColorValue::None, ColorValue::None, 5),
            Err(ValidationError::InvisibleShape("Rectangle"))
        );
        // Rejected before the malformed border color is looked at
        assert_eq!(
            doc.draw_circle(10, 10, 5, ColorValue::None, "nothex", 0),
            Err(ValidationError::InvisibleShape("Circle"))
        );
        assert!(doc.commands().is_empty());
    }

    #[test]
    fn test_empty_color_components_count_as_no_color() {
        let mut doc = letter();
        assert_eq!(
            doc.draw_rectangle(0, 0, 100, 100, Vec::<i32>::new(), ColorValue::None, 0),
            Err(ValidationError::InvisibleShape("Rectangle"))
        );
        assert_eq!(
            doc.draw_circle(50, 50, 20, Vec::<i32>::new(), Vec::<i32>::new(), 4),
            Err(ValidationError::InvisibleShape("Circle"))
        );
        assert!(doc.commands().is_empty());
    }

    #[test]
    fn test_border_color_only_kept_with_width() {
        let mut doc = letter();
        doc.draw_rectangle(700, 100, 200, 400, "#181c1f", "not a color", 0)
            .unwrap();
        doc.draw_circle(160, 800, 150, ColorValue::None, (138, 41, 0), 20)
            .unwrap();
        assert_eq!(
            doc.commands()[0],
            Command::Rectangle {
                x: 700,
                y: 100,
                w: 200,
                h: 400,
                fill_color: Some(Rgb::new(24, 28, 31)),
                border_color: None,
                border_width: 0,
            }
        );
        assert_eq!(
            doc.commands()[1],
            Command::Circle {
                x: 160,
                y: 800,
                radius: 150,
                fill_color: None,
                border_color: Some(Rgb::new(138, 41, 0)),
                border_width: 20,
            }
        );
    }

    #[test]
    fn test_rectangle_far_edge_bounds() {
        let mut doc = letter();
        assert!(doc.draw_rectangle(2000, 0, 200, 10, (0, 0, 0), ColorValue::None, 0).is_err());
        assert!(doc.draw_rectangle(0, 2700, 10, 100, (0, 0, 0), ColorValue::None, 0).is_err());
        let (width, height) = (doc.width(), doc.height());
        doc.draw_rectangle(0, 0, width, height, (29, 179, 97), (0, 0, 0), 0)
            .unwrap();
        assert_eq!(doc.commands().len(), 1);
    }

    #[test]
    fn test_page_breaks_count_pages() {
        let mut doc = letter();
        for expected in 2..=5 {
            doc.insert_page_break();
            assert_eq!(doc.pages(), expected);
        }
        assert_eq!(doc.commands().len(), 4);
        assert!(doc.commands().iter().all(|c| *c == Command::PageBreak));
    }

    #[test]
    fn test_metadata_setters() {
        let mut doc = letter();
        assert!(doc.metadata().is_empty());
        doc.set_author("Person Name");
        doc.set_title("The Title");
        assert_eq!(doc.metadata().author.as_deref(), Some("Person Name"));
        assert_eq!(doc.metadata().subject, None);
    }

    #[test]
    fn test_to_json_tags_commands() {
        let mut doc = letter();
        doc.draw_line(0, 0, 10, 10, 1, "FFF").unwrap();
        doc.insert_page_break();
        let json = doc.to_json().unwrap();
        assert!(json.contains(r#""type": "line""#));
        assert!(json.contains(r#""type": "page_break""#));
    }
}
