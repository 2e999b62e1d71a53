//! Crosshair color values
//!
//! - `Argb`: a packed 32-bit color, parsed from and formatted as 8 hex digits
//! - `ColorValue`: either a real color or `Original` (keep the style's own pixels)

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A color with alpha, red, green and blue channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Argb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Errors produced when parsing a hex color string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    #[error("color string is empty")]
    Empty,
    #[error("invalid hex digit '{0}' in color string")]
    InvalidDigit(char),
    #[error("color string has {0} hex digits (at most 8 allowed)")]
    TooLong(usize),
}

impl Argb {
    /// Fallback for unparsable command-line colors
    pub const GREEN: Argb = Argb::new(0xFF, 0x00, 0xFF, 0x00);
    /// Fully transparent white, used for empty swatches
    pub const TRANSPARENT: Argb = Argb::new(0x00, 0xFF, 0xFF, 0xFF);

    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Opaque color from red, green and blue
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(0xFF, r, g, b)
    }

    pub const fn from_u32(value: u32) -> Self {
        Self::new(
            (value >> 24) as u8,
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        )
    }

    pub const fn to_u32(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Format as `AARRGGBB`, uppercase
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }

    /// Channels in `image::Rgba` order
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Parses hex the way the color files and command line expect it:
/// surrounding whitespace is allowed, at most 8 significant digits, no sign
/// or `0x` prefix.
/// Short values are zero-extended on the left, so `FF` is transparent blue.
impl FromStr for Argb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.is_empty() {
            return Err(ParseColorError::Empty);
        }
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ParseColorError::InvalidDigit(bad));
        }
        // Leading zeros do not count towards the 8 digit limit
        let significant = digits.trim_start_matches('0');
        if significant.len() > 8 {
            return Err(ParseColorError::TooLong(digits.len()));
        }
        if significant.is_empty() {
            return Ok(Argb::from_u32(0));
        }

        let value = u32::from_str_radix(significant, 16).map_err(|_| ParseColorError::Empty)?;
        Ok(Argb::from_u32(value))
    }
}

/// Color selected for the crosshair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorValue {
    /// No recoloring - the style bitmap is drawn as-is
    #[default]
    Original,
    Argb(Argb),
}

impl ColorValue {
    pub fn argb(self) -> Option<Argb> {
        match self {
            ColorValue::Original => None,
            ColorValue::Argb(argb) => Some(argb),
        }
    }
}

impl From<Argb> for ColorValue {
    fn from(argb: Argb) -> Self {
        ColorValue::Argb(argb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex_is_argb_uppercase() {
        assert_eq!(Argb::new(0xFF, 0x00, 0xFF, 0x00).to_hex(), "FF00FF00");
        assert_eq!(Argb::new(0x0A, 0xB1, 0x02, 0xcd).to_hex(), "0AB102CD");
    }

    #[test]
    fn test_parse_full_value() {
        let color: Argb = "FF4B0082".parse().unwrap();
        assert_eq!(color, Argb::new(0xFF, 0x4B, 0x00, 0x82));
        assert_eq!(color.to_u32(), 0xFF4B0082);
    }

    #[test]
    fn test_parse_trims_and_accepts_lowercase() {
        let color: Argb = "  ff112233\r\n".parse().unwrap();
        assert_eq!(color, Argb::new(0xFF, 0x11, 0x22, 0x33));
    }

    #[test]
    fn test_parse_short_value_zero_extends() {
        let color: Argb = "FF".parse().unwrap();
        assert_eq!(color, Argb::new(0, 0, 0, 0xFF));
    }

    #[test]
    fn test_parse_ignores_leading_zeros_in_length() {
        assert_eq!("0FF00FF00".parse::<Argb>(), Ok(Argb::GREEN));
        assert_eq!("000000000000".parse::<Argb>(), Ok(Argb::new(0, 0, 0, 0)));
        assert_eq!("1FF00FF00".parse::<Argb>(), Err(ParseColorError::TooLong(9)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("zzz".parse::<Argb>(), Err(ParseColorError::InvalidDigit('z')));
        assert_eq!("".parse::<Argb>(), Err(ParseColorError::Empty));
        assert_eq!("+FF".parse::<Argb>(), Err(ParseColorError::InvalidDigit('+')));
        assert_eq!("0x12".parse::<Argb>(), Err(ParseColorError::InvalidDigit('x')));
        assert_eq!("123456789".parse::<Argb>(), Err(ParseColorError::TooLong(9)));
    }

    #[test]
    fn test_color_value_default_is_original() {
        assert_eq!(ColorValue::default(), ColorValue::Original);
        assert_eq!(ColorValue::Original.argb(), None);
        assert_eq!(ColorValue::from(Argb::GREEN).argb(), Some(Argb::GREEN));
    }
}
