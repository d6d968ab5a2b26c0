//! Packed 32-bit color handling (component B: color codec).
//!
//! ASS and VobSub both store color as a packed `AABBGGRR` 32-bit value
//! (alpha highest byte, red lowest). `a = 0` means fully opaque, the
//! inverse of the usual alpha convention — this is the ASS format's own
//! quirk, not an implementation choice.

use crate::error::SubxError;

/// A packed 32-bit color in `AABBGGRR` byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// White, fully opaque in ASS convention (`a = 0`).
    pub const WHITE: Color = Color::from_rgba(255, 255, 255, 0);
    /// Black, fully opaque.
    pub const BLACK: Color = Color::from_rgba(0, 0, 0, 0);
    /// Red, fully opaque.
    pub const RED: Color = Color::from_rgba(255, 0, 0, 0);
    /// Green, fully opaque.
    pub const GREEN: Color = Color::from_rgba(0, 255, 0, 0);
    /// Blue, fully opaque.
    pub const BLUE: Color = Color::from_rgba(0, 0, 255, 0);
    /// Yellow, fully opaque.
    pub const YELLOW: Color = Color::from_rgba(255, 255, 0, 0);
    /// Cyan, fully opaque.
    pub const CYAN: Color = Color::from_rgba(0, 255, 255, 0);
    /// Magenta, fully opaque.
    pub const MAGENTA: Color = Color::from_rgba(255, 0, 255, 0);
    /// Fully transparent black (`a = 255`).
    pub const TRANSPARENT: Color = Color::from_rgba(0, 0, 0, 255);

    /// Build a color from its `(r, g, b, a)` components.
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(((a as u32) << 24) | ((b as u32) << 16) | ((g as u32) << 8) | (r as u32))
    }

    /// Red component.
    pub const fn r(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Green component.
    pub const fn g(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    /// Blue component.
    pub const fn b(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    /// Alpha component (`0` = opaque in ASS convention).
    pub const fn a(self) -> u8 {
        ((self.0 >> 24) & 0xFF) as u8
    }

    /// The `(r, g, b, a)` components as a tuple.
    pub const fn to_rgba(self) -> (u8, u8, u8, u8) {
        (self.r(), self.g(), self.b(), self.a())
    }

    /// Return a copy of this color with the alpha byte replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Color::from_rgba(self.r(), self.g(), self.b(), a)
    }

    /// Linearly blend two colors component-wise, `t` in `[0, 1]`, rounded.
    ///
    /// `t = 0` returns `self`, `t = 1` returns `other`.
    pub fn blend(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| -> u8 {
            let value = a as f64 + (b as f64 - a as f64) * t;
            value.round().clamp(0.0, 255.0) as u8
        };
        Color::from_rgba(
            lerp(self.r(), other.r()),
            lerp(self.g(), other.g()),
            lerp(self.b(), other.b()),
            lerp(self.a(), other.a()),
        )
    }

    /// Parse an ASS hex color literal: `&HBBGGRR&` or `&HAABBGGRR&`.
    ///
    /// Case-insensitive, the trailing `&` is optional. Alpha defaults to
    /// `0` (opaque) when only 6 hex digits are present.
    pub fn parse_ass(input: &str) -> Result<Color, SubxError> {
        let hex = strip_ass_hex_wrapper(input)
            .ok_or_else(|| SubxError::invalid_format("ASS", "color missing &H prefix"))?;
        match hex.len() {
            6 => {
                let bgr = u32::from_str_radix(hex, 16)
                    .map_err(|e| SubxError::invalid_format("ASS", format!("bad color hex: {e}")))?;
                let b = ((bgr >> 16) & 0xFF) as u8;
                let g = ((bgr >> 8) & 0xFF) as u8;
                let r = (bgr & 0xFF) as u8;
                Ok(Color::from_rgba(r, g, b, 0))
            }
            8 => {
                let abgr = u32::from_str_radix(hex, 16)
                    .map_err(|e| SubxError::invalid_format("ASS", format!("bad color hex: {e}")))?;
                let a = ((abgr >> 24) & 0xFF) as u8;
                let b = ((abgr >> 16) & 0xFF) as u8;
                let g = ((abgr >> 8) & 0xFF) as u8;
                let r = (abgr & 0xFF) as u8;
                Ok(Color::from_rgba(r, g, b, a))
            }
            _ => Err(SubxError::invalid_format(
                "ASS",
                format!("color must have 6 or 8 hex digits, got {}", hex.len()),
            )),
        }
    }

    /// Parse an ASS alpha-only literal `&HAA&` into `0..255`.
    pub fn parse_ass_alpha(input: &str) -> Result<u8, SubxError> {
        let hex = strip_ass_hex_wrapper(input)
            .ok_or_else(|| SubxError::invalid_format("ASS", "alpha missing &H prefix"))?;
        if hex.len() != 2 {
            return Err(SubxError::invalid_format(
                "ASS",
                format!("alpha must have 2 hex digits, got {}", hex.len()),
            ));
        }
        u8::from_str_radix(hex, 16)
            .map_err(|e| SubxError::invalid_format("ASS", format!("bad alpha hex: {e}")))
    }

    /// Format this color as an ASS literal, zero-padded to 8 hex digits
    /// upper-case and bracketed with `&H...&`.
    pub fn format_ass(self) -> String {
        let abgr = ((self.a() as u32) << 24)
            | ((self.b() as u32) << 16)
            | ((self.g() as u32) << 8)
            | self.r() as u32;
        format!("&H{:08X}&", abgr)
    }

    /// Parse an HTML/SRT `#RRGGBB` literal, converting to the packed
    /// `AABBGGRR` layout by swapping the red/blue bytes. Accepts an
    /// optional leading `#` and is case-insensitive. Falls back to one of
    /// the eight canonical named colors when not a hex literal.
    pub fn parse_html(input: &str) -> Result<Color, SubxError> {
        let trimmed = input.trim();
        if let Some(rest) = trimmed.strip_prefix('#') {
            return parse_html_hex(rest);
        }
        if trimmed.len() == 6 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return parse_html_hex(trimmed);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "white" => Ok(Color::WHITE),
            "black" => Ok(Color::BLACK),
            "red" => Ok(Color::RED),
            "green" => Ok(Color::GREEN),
            "blue" => Ok(Color::BLUE),
            "yellow" => Ok(Color::YELLOW),
            "cyan" => Ok(Color::CYAN),
            "magenta" => Ok(Color::MAGENTA),
            _ => Err(SubxError::invalid_format(
                "HTML",
                format!("unrecognized color name: {trimmed}"),
            )),
        }
    }

    /// Format this color as an HTML `#RRGGBB` literal (lower-case).
    pub fn format_html(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r(), self.g(), self.b())
    }
}

fn strip_ass_hex_wrapper(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    let without_amp = trimmed.strip_prefix('&').unwrap_or(trimmed);
    let without_h = without_amp
        .strip_prefix('H')
        .or_else(|| without_amp.strip_prefix('h'))?;
    Some(without_h.strip_suffix('&').unwrap_or(without_h))
}

fn parse_html_hex(hex: &str) -> Result<Color, SubxError> {
    if hex.len() != 6 {
        return Err(SubxError::invalid_format(
            "HTML",
            format!("color must have 6 hex digits, got {}", hex.len()),
        ));
    }
    let rgb = u32::from_str_radix(hex, 16)
        .map_err(|e| SubxError::invalid_format("HTML", format!("bad color hex: {e}")))?;
    let r = ((rgb >> 16) & 0xFF) as u8;
    let g = ((rgb >> 8) & 0xFF) as u8;
    let b = (rgb & 0xFF) as u8;
    Ok(Color::from_rgba(r, g, b, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_roundtrip_all_bytes() {
        for r in [0u8, 1, 127, 255] {
            for a in [0u8, 16, 255] {
                let c = Color::from_rgba(r, 200, 10, a);
                assert_eq!(c.to_rgba(), (r, 200, 10, a));
            }
        }
    }

    #[test]
    fn parse_ass_six_digit_defaults_alpha_opaque() {
        let c = Color::parse_ass("&H0000FF&").unwrap();
        assert_eq!(c.to_rgba(), (0xFF, 0x00, 0x00, 0x00));
    }

    #[test]
    fn parse_ass_eight_digit_reads_alpha() {
        let c = Color::parse_ass("&H80FFFFFF&").unwrap();
        assert_eq!(c.to_rgba(), (0xFF, 0xFF, 0xFF, 0x80));
    }

    #[test]
    fn parse_ass_trailing_amp_optional() {
        let a = Color::parse_ass("&H0000FF&").unwrap();
        let b = Color::parse_ass("&H0000FF").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_ass_alpha_only() {
        assert_eq!(Color::parse_ass_alpha("&HFF&").unwrap(), 0xFF);
        assert_eq!(Color::parse_ass_alpha("&H00&").unwrap(), 0x00);
    }

    #[test]
    fn format_ass_always_eight_digits_uppercase() {
        let c = Color::from_rgba(0xab, 0xcd, 0xef, 0x12);
        assert_eq!(c.format_ass(), "&H12EFCDAB&");
    }

    #[test]
    fn html_swap_preserves_channels() {
        let c = Color::parse_html("#FF0080").unwrap();
        assert_eq!(c.to_rgba(), (0xFF, 0x00, 0x80, 0x00));
        assert_eq!(c.format_html(), "#ff0080");
    }

    #[test]
    fn html_named_colors_accepted() {
        assert_eq!(Color::parse_html("red").unwrap(), Color::RED);
        assert!(Color::parse_html("chartreuse").is_err());
    }

    #[test]
    fn blend_interpolates_and_clamps() {
        let a = Color::from_rgba(0, 0, 0, 0);
        let b = Color::from_rgba(100, 200, 255, 10);
        assert_eq!(a.blend(b, 0.0), a);
        assert_eq!(a.blend(b, 1.0), b);
        let mid = a.blend(b, 0.5);
        assert_eq!(mid.r(), 50);
    }
}
