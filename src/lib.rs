//! Multiformat document rendering
//!
//! Build a paginated document from validated drawing commands, then render
//! the same command list to PDF with pdf-writer or to PNG, GIF and JPEG
//! images with tiny-skia and image.
//!
//! ```no_run
//! use multiformat::{Document, ImageOptions};
//!
//! let mut doc = Document::new("a4", "portrait")?;
//! let (w, h) = (doc.width(), doc.height());
//! doc.draw_rectangle(0, 0, w, h, (29, 179, 97), (0, 0, 0), 0)?;
//! doc.draw_string("Hello World", 100, h - 100, "left", "Helvetica-Bold", 100, (255, 255, 255))?;
//! doc.generate_pdf("hello")?;
//! doc.generate_image("hello", "png", &ImageOptions::default().with_size(1000, 1000))?;
//! # Ok::<(), multiformat::Error>(())
//! ```

mod canvas;
pub mod document;
pub mod error;
pub mod font_registry;
mod font_utils;
pub mod geometry;
pub mod image_renderer;
pub mod pdf_renderer;
mod raster_canvas;
pub mod types;
mod unicode_utils;
pub mod validate;

pub use document::{Command, Document};
pub use error::{Error, Result, ValidationError};
pub use font_registry::{FontRegistry, StandardFont};
pub use types::{Alignment, ImageFormat, ImageOptions, Metadata, Orientation, PageSize, Rgb};
pub use validate::{ColorValue, ToInteger};
