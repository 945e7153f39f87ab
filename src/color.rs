//! Hex colour parsing.

use palette::Srgb;
use std::str::FromStr;

/// Neutral grey used whenever a colour reference cannot be resolved.
pub const FALLBACK_COLOR: Srgb<u8> = Srgb::new(0xd9, 0xd9, 0xd9);

/// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
pub fn parse_hex(hex: &str) -> Option<Srgb<u8>> {
    Srgb::<u8>::from_str(hex.trim()).ok()
}

/// Parses `hex`, or returns `fallback` if it is missing or malformed.
pub fn parse_or(hex: Option<&str>, fallback: Srgb<u8>) -> Srgb<u8> {
    hex.and_then(parse_hex).unwrap_or(fallback)
}

/// Formats a colour as lowercase `#rrggbb`.
pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}
