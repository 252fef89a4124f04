//! Geometry shared by the renderers: unit conversion and raster canvas sizing

use serde::{Deserialize, Serialize};

/// PDF points per centimeter
const POINTS_PER_CM: f64 = 72.0 / 2.54;

/// Convert document units (hundredths of a centimeter) to PDF points
pub fn units_to_points(units: i32) -> f32 {
    (units as f64 / 100.0 * POINTS_PER_CM) as f32
}

/// Scale a document unit to pixels, truncating toward zero
pub fn to_pixels(units: i32, scale: f64) -> i32 {
    (units as f64 * scale) as i32
}

/// How a page is laid out on a raster canvas for one render call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasPlan {
    /// Canvas size in pixels
    pub canvas: (u32, u32),
    /// Pixels per document unit while drawing
    pub scale: f64,
    /// Final size to resample the canvas to before encoding
    pub output: Option<(u32, u32)>,
}

/// Fit a `native` page into the `requested` pixel box.
///
/// The axis with the smaller ratio constrains the fit. Upscaling draws
/// directly at the larger scale. Downscaling (or an exact fit) draws at
/// native resolution and records the output size for a resize pass.
pub fn plan_canvas(native: (u32, u32), requested: Option<(u32, u32)>) -> CanvasPlan {
    let Some((req_w, req_h)) = requested else {
        return CanvasPlan {
            canvas: native,
            scale: 1.0,
            output: None,
        };
    };
    let (native_w, native_h) = native;
    let scale_w = req_w as f64 / native_w as f64;
    let scale_h = req_h as f64 / native_h as f64;

    let (scale, fitted) = if scale_w < scale_h {
        (scale_w, (req_w, scale_dimension(native_h, scale_w)))
    } else {
        (scale_h, (scale_dimension(native_w, scale_h), req_h))
    };

    if scale > 1.0 {
        CanvasPlan {
            canvas: fitted,
            scale,
            output: None,
        }
    } else {
        CanvasPlan {
            canvas: native,
            scale: 1.0,
            output: Some(fitted),
        }
    }
}

fn scale_dimension(length: u32, scale: f64) -> u32 {
    ((length as f64 * scale) as u32).max(1)
}
