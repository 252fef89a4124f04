//! Type definitions shared by the document model and both renderers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ValidationError};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Components scaled to 0.0-1.0 for the PDF color operators
    pub fn to_pdf_rgb(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(color: Rgb) -> Self {
        (color.r, color.g, color.b)
    }
}

/// Horizontal anchoring of a string relative to its x coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    Middle,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Right => "right",
            Alignment::Middle => "middle",
        }
    }

    /// Offset to subtract from the anchor x for a string of `width`
    pub fn offset(&self, width: f64) -> f64 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Right => width,
            Alignment::Middle => width / 2.0,
        }
    }
}

impl AsRef<str> for Alignment {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Alignment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "right" => Ok(Alignment::Right),
            "middle" => Ok(Alignment::Middle),
            _ => Err(ValidationError::Alignment(s.to_string())),
        }
    }
}

/// Standard paper size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    A4,
    Letter,
}

impl FromStr for PageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            _ => Err(Error::Configuration(format!("Invalid document size: '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            _ => Err(Error::Configuration(format!("Invalid document layout: '{}'", s))),
        }
    }
}

/// Page width and height in hundredths of a centimeter
pub fn page_dimensions(size: PageSize, orientation: Orientation) -> (i32, i32) {
    let (short, long) = match size {
        PageSize::A4 => (2100, 2970),
        PageSize::Letter => (2159, 2794),
    };
    match orientation {
        Orientation::Portrait => (short, long),
        Orientation::Landscape => (long, short),
    }
}

/// Document information written by the PDF backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub author: Option<String>,
    pub title: Option<String>,
    pub subject: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.title.is_none() && self.subject.is_none()
    }
}

/// Raster output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Gif,
    Jpeg,
}

impl ImageFormat {
    /// File extension, also the canonical lowercase name
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Jpeg => "jpeg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "gif" => Ok(ImageFormat::Gif),
            "jpeg" => Ok(ImageFormat::Jpeg),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Options for one raster render call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    /// Bounding box in pixels; the page is fitted inside it keeping its aspect ratio
    pub size: Option<(u32, u32)>,
    /// 1-indexed page to render; all pages when unset
    pub page: Option<i64>,
    pub jpeg_quality: u8,
    pub background: Rgb,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            size: None,
            page: None,
            jpeg_quality: 75,
            background: Rgb::white(),
        }
    }
}

impl ImageOptions {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_dimensions_table() {
        let cases = [
            ("a4", "portrait", (2100, 2970)),
            ("A4", "LANDSCAPE", (2970, 2100)),
            ("letter", "Portrait", (2159, 2794)),
            ("LeTtEr", "landscape", (2794, 2159)),
        ];
        for (size, orientation, expected) in cases {
            let size: PageSize = size.parse().unwrap();
            let orientation: Orientation = orientation.parse().unwrap();
            assert_eq!(page_dimensions(size, orientation), expected);
        }
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!("a5".parse::<PageSize>(), Err(Error::Configuration(_))));
        assert!(matches!("sideways".parse::<Orientation>(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_image_format_parse() {
        assert_eq!("PNG".parse::<ImageFormat>().unwrap(), ImageFormat::Png);
        assert_eq!("Jpeg".parse::<ImageFormat>().unwrap().extension(), "jpeg");
        assert!(matches!("tiff".parse::<ImageFormat>(), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_alignment_offset() {
        assert_eq!("MIDDLE".parse::<Alignment>().unwrap().offset(10.0), 5.0);
        assert_eq!(Alignment::Right.offset(10.0), 10.0);
        assert_eq!(Alignment::Left.offset(10.0), 0.0);
    }

    #[test]
    fn test_image_options_from_json() {
        let options: ImageOptions = serde_json::from_str(r#"{"size": [100, 200]}"#).unwrap();
        assert_eq!(options.size, Some((100, 200)));
        assert_eq!(options.jpeg_quality, 75);
        assert_eq!(options.background, Rgb::white());
    }
}
