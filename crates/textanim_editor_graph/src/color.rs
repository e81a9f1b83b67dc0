// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hex color parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb8 {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb8 {
    /// Fallback for anything that does not parse
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);

    /// Create a color from channel values
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to `0.0..=1.0`
    pub fn normalized(&self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Parse `#RRGGBB` (the `#` is optional).
///
/// Exactly six hex digits are required; `None` otherwise.
pub fn parse_hex_color(hex: &str) -> Option<Rgb8> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some(Rgb8::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Convert a hex color string, falling back to white for malformed input
pub fn hex_to_rgb(hex: &str) -> Rgb8 {
    parse_hex_color(hex).unwrap_or_else(|| {
        tracing::debug!(value = hex, "malformed color value, using white");
        Rgb8::WHITE
    })
}

/// Check that a string is a usable hex color
pub fn is_hex_color(hex: &str) -> bool {
    parse_hex_color(hex).is_some()
}
