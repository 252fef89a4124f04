//! Font registry: the set of font identifiers a document accepts
//!
//! Identifiers are matched case-insensitively and stored in their canonical
//! spelling. Each entry is either one of the standard PDF fonts or a
//! TrueType face supplied by the caller.
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ttf_parser::Face;

use crate::error::{Error, Result, ValidationError};
use crate::font_utils::load_font_file;

/// Fallback advance for characters outside the built-in tables, in 1/1000 em
const DEFAULT_CHAR_WIDTH: u16 = 600;

/// Helvetica advances for ASCII 32..=126, in 1/1000 em
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Times-Roman advances for ASCII 32..=126, in 1/1000 em
#[rustfmt::skip]
const TIMES_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

/// Helvetica-Bold advances for ASCII 32..=126, in 1/1000 em
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Times-Bold advances for ASCII 32..=126, in 1/1000 em
#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

/// Times-Italic advances for ASCII 32..=126, in 1/1000 em
#[rustfmt::skip]
const TIMES_ITALIC_WIDTHS: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

/// Times-BoldItalic advances for ASCII 32..=126, in 1/1000 em
#[rustfmt::skip]
const TIMES_BOLD_ITALIC_WIDTHS: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

/// The standard PDF fonts every viewer provides without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Courier,
    CourierBold,
    CourierBoldOblique,
    CourierOblique,
    Helvetica,
    HelveticaBold,
    HelveticaBoldOblique,
    HelveticaOblique,
    TimesBold,
    TimesBoldItalic,
    TimesItalic,
    TimesRoman,
}

impl StandardFont {
    pub const ALL: [StandardFont; 12] = [
        StandardFont::Courier,
        StandardFont::CourierBold,
        StandardFont::CourierBoldOblique,
        StandardFont::CourierOblique,
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::HelveticaBoldOblique,
        StandardFont::HelveticaOblique,
        StandardFont::TimesBold,
        StandardFont::TimesBoldItalic,
        StandardFont::TimesItalic,
        StandardFont::TimesRoman,
    ];

    /// PostScript name, used both as identifier and as PDF BaseFont
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
            StandardFont::CourierBoldOblique => "Courier-BoldOblique",
            StandardFont::CourierOblique => "Courier-Oblique",
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesRoman => "Times-Roman",
        }
    }

    /// Advance width of `ch` in 1/1000 em.
    ///
    /// Courier is monospaced. Oblique Helvetica shares the advances of its
    /// upright style.
    pub fn char_width(&self, ch: char) -> u16 {
        let table = match self {
            StandardFont::Courier
            | StandardFont::CourierBold
            | StandardFont::CourierBoldOblique
            | StandardFont::CourierOblique => return 600,
            StandardFont::Helvetica | StandardFont::HelveticaOblique => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique => {
                &HELVETICA_BOLD_WIDTHS
            }
            StandardFont::TimesRoman => &TIMES_WIDTHS,
            StandardFont::TimesBold => &TIMES_BOLD_WIDTHS,
            StandardFont::TimesItalic => &TIMES_ITALIC_WIDTHS,
            StandardFont::TimesBoldItalic => &TIMES_BOLD_ITALIC_WIDTHS,
        };
        match ch as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            _ => DEFAULT_CHAR_WIDTH,
        }
    }

    /// Metric-compatible TrueType files that can stand in for this font when
    /// glyph outlines are needed, most faithful first
    pub fn outline_candidates(&self) -> &'static [&'static str] {
        match self {
            StandardFont::Courier => &["LiberationMono-Regular.ttf", "DejaVuSansMono.ttf", "cour.ttf"],
            StandardFont::CourierBold => &["LiberationMono-Bold.ttf", "DejaVuSansMono-Bold.ttf", "courbd.ttf"],
            StandardFont::CourierBoldOblique => &[
                "LiberationMono-BoldItalic.ttf",
                "DejaVuSansMono-BoldOblique.ttf",
                "courbi.ttf",
            ],
            StandardFont::CourierOblique => &[
                "LiberationMono-Italic.ttf",
                "DejaVuSansMono-Oblique.ttf",
                "couri.ttf",
            ],
            StandardFont::Helvetica => &["LiberationSans-Regular.ttf", "DejaVuSans.ttf", "arial.ttf"],
            StandardFont::HelveticaBold => &["LiberationSans-Bold.ttf", "DejaVuSans-Bold.ttf", "arialbd.ttf"],
            StandardFont::HelveticaBoldOblique => &[
                "LiberationSans-BoldItalic.ttf",
                "DejaVuSans-BoldOblique.ttf",
                "arialbi.ttf",
            ],
            StandardFont::HelveticaOblique => &[
                "LiberationSans-Italic.ttf",
                "DejaVuSans-Oblique.ttf",
                "ariali.ttf",
            ],
            StandardFont::TimesBold => &["LiberationSerif-Bold.ttf", "DejaVuSerif-Bold.ttf", "timesbd.ttf"],
            StandardFont::TimesBoldItalic => &[
                "LiberationSerif-BoldItalic.ttf",
                "DejaVuSerif-BoldItalic.ttf",
                "timesbi.ttf",
            ],
            StandardFont::TimesItalic => &[
                "LiberationSerif-Italic.ttf",
                "DejaVuSerif-Italic.ttf",
                "timesi.ttf",
            ],
            StandardFont::TimesRoman => &["LiberationSerif-Regular.ttf", "DejaVuSerif.ttf", "times.ttf"],
        }
    }
}

/// Where the glyphs of a registered font come from
#[derive(Clone)]
pub enum FontSource {
    Standard(StandardFont),
    TrueType(Arc<Vec<u8>>),
}

impl fmt::Debug for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Standard(font) => f.debug_tuple("Standard").field(font).finish(),
            FontSource::TrueType(data) => write!(f, "TrueType({} bytes)", data.len()),
        }
    }
}

impl FontSource {
    /// Advance width of `text` set at `size`, in the same unit as `size`
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        match self {
            FontSource::Standard(font) => {
                let units: u32 = text.chars().map(|ch| font.char_width(ch) as u32).sum();
                units as f64 * size / 1000.0
            }
            FontSource::TrueType(data) => match Face::parse(data, 0) {
                Ok(face) => face_text_width(&face, text, size),
                Err(_) => text.chars().count() as f64 * size * DEFAULT_CHAR_WIDTH as f64 / 1000.0,
            },
        }
    }
}

/// Advance width of `text` using the horizontal metrics of `face`
pub fn face_text_width(face: &Face<'_>, text: &str, size: f64) -> f64 {
    let units_per_em = face.units_per_em() as f64;
    let units: f64 = text
        .chars()
        .map(|ch| {
            let glyph = face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0));
            face.glyph_hor_advance(glyph).unwrap_or(0) as f64
        })
        .sum();
    units * size / units_per_em
}

#[derive(Debug, Clone)]
struct FontEntry {
    display_name: String,
    source: FontSource,
}

/// Mapping from lowercase font identifier to its canonical name and source
#[derive(Debug, Clone)]
pub struct FontRegistry {
    fonts: BTreeMap<String, FontEntry>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FontRegistry {
    /// A registry without any font
    pub fn empty() -> Self {
        Self {
            fonts: BTreeMap::new(),
        }
    }

    /// A registry holding the twelve standard PDF fonts
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for font in StandardFont::ALL {
            registry.insert(font.base_font(), FontSource::Standard(font));
        }
        registry
    }

    fn insert(&mut self, name: &str, source: FontSource) {
        self.fonts.insert(
            name.to_lowercase(),
            FontEntry {
                display_name: name.to_string(),
                source,
            },
        );
    }

    /// Register TrueType font data under `name`, replacing any font with the
    /// same identifier
    pub fn register_font(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::Font("Font name must not be empty".to_string()));
        }
        Face::parse(&data, 0).map_err(|e| Error::Font(format!("Invalid font {}: {}", name, e)))?;
        log::debug!("Registered TrueType font {} ({} bytes)", name, data.len());
        self.insert(name, FontSource::TrueType(Arc::new(data)));
        Ok(())
    }

    /// Register a `.ttf` file under its file stem. Returns the identifier.
    pub fn register_font_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| Error::Font(format!("Font path has no file name: {}", path.display())))?
            .to_string();
        let data = load_font_file(path)?;
        self.register_font(&name, data)?;
        Ok(name)
    }

    /// Canonical spelling of `name`
    pub fn resolve(&self, name: &str) -> std::result::Result<&str, ValidationError> {
        self.fonts
            .get(&name.to_lowercase())
            .map(|entry| entry.display_name.as_str())
            .ok_or_else(|| ValidationError::UnknownFont(name.to_string()))
    }

    pub fn source(&self, name: &str) -> Option<&FontSource> {
        self.fonts.get(&name.to_lowercase()).map(|entry| &entry.source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fonts.contains_key(&name.to_lowercase())
    }

    /// Canonical names of all registered fonts
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fonts.values().map(|entry| entry.display_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let registry = FontRegistry::standard();
        assert_eq!(registry.len(), 12);
        assert_eq!(registry.resolve("helvetica-bold"), Ok("Helvetica-Bold"));
        assert_eq!(registry.resolve("TIMES-ROMAN"), Ok("Times-Roman"));
        assert_eq!(
            registry.resolve("OpenSans-Bold"),
            Err(ValidationError::UnknownFont("OpenSans-Bold".to_string()))
        );
    }

    #[test]
    fn test_register_invalid_font() {
        let mut registry = FontRegistry::empty();
        assert!(registry.register_font("Broken", vec![0, 1, 2, 3]).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_standard_widths() {
        let courier = FontSource::Standard(StandardFont::Courier);
        assert_eq!(courier.text_width("abcd", 10.0), 24.0);

        let helvetica = FontSource::Standard(StandardFont::Helvetica);
        // H = 722, i = 222
        assert!((helvetica.text_width("Hi", 100.0) - 94.4).abs() < 1e-9);
        assert_eq!(StandardFont::TimesRoman.char_width(' '), 250);
        assert_eq!(StandardFont::TimesRoman.char_width('é'), DEFAULT_CHAR_WIDTH);
    }

    #[test]
    fn test_styled_widths() {
        // b = 611, o = 611, l = 278, d = 611
        let bold = FontSource::Standard(StandardFont::HelveticaBold);
        assert_eq!(bold.text_width("bold", 1000.0), 2111.0);
        let bold_oblique = FontSource::Standard(StandardFont::HelveticaBoldOblique);
        assert_eq!(bold_oblique.text_width("bold", 1000.0), 2111.0);
        assert_eq!(StandardFont::HelveticaOblique.char_width('b'), 556);

        assert_eq!(StandardFont::TimesBold.char_width('W'), 1000);
        assert_eq!(StandardFont::TimesItalic.char_width('W'), 833);
        assert_eq!(StandardFont::TimesBoldItalic.char_width('W'), 889);
        assert_eq!(StandardFont::TimesRoman.char_width('W'), 944);
    }
}
