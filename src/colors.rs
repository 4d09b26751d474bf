//! Colour helpers.
//!
//! The driver works on 8-bit `Srgb<u8>` values. These helpers build them from
//! HSV or from `Srgb<f32>` (0.0-1.0), which is more convenient for animations
//! such as hue rotations.

use palette::{FromColor, Hsv, Srgb};

/// All channels off.
pub const OFF: Srgb<u8> = Srgb::new(0, 0, 0);

/// Full red.
pub const RED: Srgb<u8> = Srgb::new(255, 0, 0);

/// Full green.
pub const GREEN: Srgb<u8> = Srgb::new(0, 255, 0);

/// Full blue.
pub const BLUE: Srgb<u8> = Srgb::new(0, 0, 255);

/// All channels full.
pub const WHITE: Srgb<u8> = Srgb::new(255, 255, 255);

/// Creates a colour from HSV (Hue, Saturation, Value) components.
///
/// `hue` is in degrees, `saturation` and `value` in 0.0-1.0.
#[inline]
pub fn hsv(hue: f32, saturation: f32, value: f32) -> Srgb<u8> {
    let hsv = Hsv::new(hue, saturation, value);
    to_u8(Srgb::from_color(hsv))
}

/// Creates a colour from hue only (full saturation and value).
#[inline]
pub fn hue(hue: f32) -> Srgb<u8> {
    hsv(hue, 1.0, 1.0)
}

/// Converts a 0.0-1.0 colour to 8 bits per channel, clamping out-of-range
/// components.
#[inline]
pub fn to_u8(color: Srgb) -> Srgb<u8> {
    Srgb::new(
        color.red.clamp(0.0, 1.0),
        color.green.clamp(0.0, 1.0),
        color.blue.clamp(0.0, 1.0),
    )
    .into_format()
}
