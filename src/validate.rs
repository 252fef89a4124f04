//! Argument validation for drawing commands
//!
//! Every function here is pure: it either returns the normalized value to
//! store in a command or a [`ValidationError`] describing the rejected input.

use std::fmt;

use crate::error::ValidationError;
use crate::types::{Alignment, Rgb};

/// A value that may be coerced to an integer document unit.
///
/// Integers pass through, floats truncate toward zero, strings are parsed
/// after trimming surrounding whitespace. `None` never coerces.
pub trait ToInteger: fmt::Debug {
    fn to_integer(&self) -> Option<i64>;
}

macro_rules! impl_to_integer {
    ($($ty:ty),*) => {
        $(impl ToInteger for $ty {
            fn to_integer(&self) -> Option<i64> {
                i64::try_from(*self).ok()
            }
        })*
    };
}

impl_to_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToInteger for f64 {
    fn to_integer(&self) -> Option<i64> {
        if !self.is_finite() || self.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(self.trunc() as i64)
    }
}

impl ToInteger for f32 {
    fn to_integer(&self) -> Option<i64> {
        (*self as f64).to_integer()
    }
}

impl ToInteger for str {
    fn to_integer(&self) -> Option<i64> {
        self.trim().parse().ok()
    }
}

impl ToInteger for String {
    fn to_integer(&self) -> Option<i64> {
        self.as_str().to_integer()
    }
}

impl<T: ToInteger + ?Sized> ToInteger for &T {
    fn to_integer(&self) -> Option<i64> {
        (**self).to_integer()
    }
}

impl<T: ToInteger> ToInteger for Option<T> {
    fn to_integer(&self) -> Option<i64> {
        self.as_ref().and_then(|v| v.to_integer())
    }
}

fn coerce(field: &'static str, value: &impl ToInteger) -> Result<i64, ValidationError> {
    value.to_integer().ok_or_else(|| ValidationError::NotAnInteger {
        field,
        value: format!("{:?}", value),
    })
}

fn check_range(field: &'static str, value: i64, max: i32) -> Result<(), ValidationError> {
    if (0..=max as i64).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfBounds {
            field,
            value,
            max: max as i64,
        })
    }
}

/// Coordinate on an axis of length `axis_max`, inclusive on both ends.
pub fn validate_coordinate(
    field: &'static str,
    value: impl ToInteger,
    axis_max: i32,
) -> Result<i32, ValidationError> {
    let value = coerce(field, &value)?;
    check_range(field, value, axis_max)?;
    Ok(value as i32)
}

/// Extent measured from `origin`. Only the far edge `origin + extent` is
/// range checked, so a negative extent is accepted while the edge stays on
/// the page.
pub fn validate_extent(
    field: &'static str,
    origin: impl ToInteger,
    extent: impl ToInteger,
    axis_max: i32,
) -> Result<i32, ValidationError> {
    let extent = coerce(field, &extent)?;
    let origin = coerce(field, &origin)?;
    let far_edge = origin.saturating_add(extent);
    if !(0..=axis_max as i64).contains(&far_edge) {
        return Err(ValidationError::OutOfBounds {
            field,
            value: extent,
            max: axis_max as i64 - origin,
        });
    }
    Ok(extent as i32)
}

pub fn validate_non_negative(
    field: &'static str,
    value: impl ToInteger,
) -> Result<i32, ValidationError> {
    let value = coerce(field, &value)?;
    if value < 0 {
        return Err(ValidationError::Negative { field, value });
    }
    check_range(field, value, i32::MAX)?;
    Ok(value as i32)
}

/// 1-indexed page number within `[1, pages]`
pub fn validate_page_number(page: impl ToInteger, pages: u32) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::PageNumber {
        page: format!("{:?}", page),
        pages,
    };
    let number = page.to_integer().ok_or_else(invalid)?;
    if number < 1 || number > pages as i64 {
        return Err(invalid());
    }
    Ok(number as u32)
}

pub fn validate_alignment(alignment: impl AsRef<str>) -> Result<Alignment, ValidationError> {
    alignment.as_ref().parse()
}

/// Color argument as supplied by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorValue {
    /// No color: the layer is not drawn
    None,
    /// `#RGB`, `RGB`, `#RRGGBB` or `RRGGBB`
    Hex(String),
    /// Red, green and blue components, each expected in `[0, 255]`
    Components(Vec<i64>),
}

impl ColorValue {
    /// True for `None` and for an empty component list, the two ways of
    /// leaving a layer undrawn.
    pub fn is_absent(&self) -> bool {
        match self {
            ColorValue::None => true,
            ColorValue::Components(c) => c.is_empty(),
            ColorValue::Hex(_) => false,
        }
    }
}

impl From<&str> for ColorValue {
    fn from(value: &str) -> Self {
        ColorValue::Hex(value.to_string())
    }
}

impl From<String> for ColorValue {
    fn from(value: String) -> Self {
        ColorValue::Hex(value)
    }
}

impl From<(i32, i32, i32)> for ColorValue {
    fn from((r, g, b): (i32, i32, i32)) -> Self {
        ColorValue::Components(vec![r as i64, g as i64, b as i64])
    }
}

impl From<[i32; 3]> for ColorValue {
    fn from(value: [i32; 3]) -> Self {
        ColorValue::Components(value.iter().map(|&c| c as i64).collect())
    }
}

impl From<Vec<i32>> for ColorValue {
    fn from(value: Vec<i32>) -> Self {
        ColorValue::Components(value.into_iter().map(i64::from).collect())
    }
}

impl From<Rgb> for ColorValue {
    fn from(color: Rgb) -> Self {
        ColorValue::Components(vec![color.r as i64, color.g as i64, color.b as i64])
    }
}

impl<T: Into<ColorValue>> From<Option<T>> for ColorValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ColorValue::None, Into::into)
    }
}

/// Resolve a color argument.
///
/// Hex strings are always parsed. An absent or empty value yields `Ok(None)`
/// when the color is optional and an error otherwise.
pub fn validate_color(
    value: impl Into<ColorValue>,
    required: bool,
) -> Result<Option<Rgb>, ValidationError> {
    match value.into() {
        ColorValue::Hex(hex) => hex_to_rgb(&hex).map(Some),
        ColorValue::None if !required => Ok(None),
        ColorValue::Components(c) if c.is_empty() && !required => Ok(None),
        ColorValue::None => Err(ValidationError::ColorShape("None".to_string())),
        ColorValue::Components(c) => {
            if c.len() != 3 {
                return Err(ValidationError::ColorShape(format!("{:?}", c)));
            }
            let channel = |name: &'static str, value: i64| {
                u8::try_from(value)
                    .map_err(|_| ValidationError::ColorComponent { channel: name, value })
            };
            Ok(Some(Rgb::new(
                channel("red", c[0])?,
                channel("green", c[1])?,
                channel("blue", c[2])?,
            )))
        }
    }
}

/// Convert `#RGB`, `RGB`, `#RRGGBB` or `RRGGBB` to a color. In the short
/// form each digit is doubled, so `F` becomes `0xFF`.
pub fn hex_to_rgb(value: &str) -> Result<Rgb, ValidationError> {
    let digits = value.trim().trim_matches('#');
    let format_error = || ValidationError::ColorFormat(digits.to_string());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format_error());
    }
    let group = match digits.len() {
        3 => 1,
        6 => 2,
        _ => return Err(format_error()),
    };
    let mut channels = [0u8; 3];
    for (i, channel) in channels.iter_mut().enumerate() {
        let part = &digits[i * group..(i + 1) * group];
        let expanded = if group == 1 { part.repeat(2) } else { part.to_string() };
        *channel = u8::from_str_radix(&expanded, 16).map_err(|_| format_error())?;
    }
    Ok(Rgb::new(channels[0], channels[1], channels[2]))
}
