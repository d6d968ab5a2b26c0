//! Timestamp parsing and formatting (component A: time codec).
//!
//! A `Time` is an opaque millisecond count since the start of the
//! timeline. Every text subtitle format spells this out differently:
//! ASS uses centisecond or millisecond precision behind a single `H`
//! digit of hours, SRT and VTT use a comma/dot millisecond separator,
//! and VobSub `.idx` uses a colon-delimited millisecond field. The
//! fractional-digit count is load-bearing for ASS: only 2 or 3 digits
//! are accepted, anything else is a parse error rather than a silent
//! truncation or zero-pad.

use crate::error::SubxError;
use std::fmt;

/// A point on the subtitle timeline, stored as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(pub u64);

impl Time {
    /// Zero.
    pub const ZERO: Time = Time(0);

    /// Build a `Time` from whole milliseconds.
    pub const fn from_millis(ms: u64) -> Self {
        Time(ms)
    }

    /// The timestamp in whole milliseconds.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Parse an ASS/SSA timestamp: `H:MM:SS.cc` (2 fractional digits) or
    /// `H:MM:SS.ccc` (3). Any other fraction width is `InvalidTimestamp`.
    pub fn parse_ass(input: &str) -> Result<Time, SubxError> {
        let (h, m, s, frac) = split_h_mm_ss_frac(input, ':', '.')?;
        match frac.len() {
            2 => {
                let cs = parse_digits(frac)?;
                Ok(Time(h * 3_600_000 + m * 60_000 + s * 1000 + cs * 10))
            }
            3 => {
                let ms = parse_digits(frac)?;
                Ok(Time(h * 3_600_000 + m * 60_000 + s * 1000 + ms))
            }
            n => Err(SubxError::invalid_timestamp(format!(
                "ASS timestamp fraction must be 2 or 3 digits, got {n} in '{input}'"
            ))),
        }
    }

    /// Format as ASS `H:MM:SS.cc` (centisecond precision, truncating).
    pub fn format_ass(self) -> String {
        let total_cs = self.0 / 10;
        let h = total_cs / 360_000;
        let m = (total_cs / 6_000) % 60;
        let s = (total_cs / 100) % 60;
        let cs = total_cs % 100;
        format!("{h}:{m:02}:{s:02}.{cs:02}")
    }

    /// Parse an SRT timestamp: `HH:MM:SS,mmm`.
    pub fn parse_srt(input: &str) -> Result<Time, SubxError> {
        let (h, m, s, frac) = split_h_mm_ss_frac(input, ':', ',')?;
        if frac.len() != 3 {
            return Err(SubxError::invalid_timestamp(format!(
                "SRT timestamp requires exactly 3 fractional digits, got {} in '{input}'",
                frac.len()
            )));
        }
        let ms = parse_digits(frac)?;
        Ok(Time(h * 3_600_000 + m * 60_000 + s * 1000 + ms))
    }

    /// Format as SRT `HH:MM:SS,mmm`.
    pub fn format_srt(self) -> String {
        let total_ms = self.0;
        let h = total_ms / 3_600_000;
        let m = (total_ms / 60_000) % 60;
        let s = (total_ms / 1000) % 60;
        let ms = total_ms % 1000;
        format!("{h:02}:{m:02}:{s:02},{ms:03}")
    }

    /// Parse a WebVTT timestamp: `HH:MM:SS.mmm` or the shorter `MM:SS.mmm`.
    pub fn parse_vtt(input: &str) -> Result<Time, SubxError> {
        let dot = input
            .rfind('.')
            .ok_or_else(|| SubxError::invalid_timestamp(format!("missing '.' in '{input}'")))?;
        let (head, frac) = (&input[..dot], &input[dot + 1..]);
        if frac.len() != 3 {
            return Err(SubxError::invalid_timestamp(format!(
                "VTT timestamp requires exactly 3 fractional digits, got {} in '{input}'",
                frac.len()
            )));
        }
        let ms = parse_digits(frac)?;
        let parts: Vec<&str> = head.split(':').collect();
        let (h, m, s) = match parts.as_slice() {
            [h, m, s] => (parse_digits(h)?, parse_digits(m)?, parse_digits(s)?),
            [m, s] => (0, parse_digits(m)?, parse_digits(s)?),
            _ => {
                return Err(SubxError::invalid_timestamp(format!(
                    "VTT timestamp must have 2 or 3 ':'-separated fields, got '{input}'"
                )));
            }
        };
        Ok(Time(h * 3_600_000 + m * 60_000 + s * 1000 + ms))
    }

    /// Format as WebVTT `HH:MM:SS.mmm`.
    pub fn format_vtt(self) -> String {
        let total_ms = self.0;
        let h = total_ms / 3_600_000;
        let m = (total_ms / 60_000) % 60;
        let s = (total_ms / 1000) % 60;
        let ms = total_ms % 1000;
        format!("{h:02}:{m:02}:{s:02}.{ms:03}")
    }

    /// Parse a VobSub `.idx` timestamp: `HH:MM:SS:mmm`.
    pub fn parse_vobsub(input: &str) -> Result<Time, SubxError> {
        let parts: Vec<&str> = input.trim().splitn(4, ':').collect();
        let [h, m, s, ms] = parts.as_slice() else {
            return Err(SubxError::invalid_timestamp(format!(
                "VobSub timestamp must have 4 ':'-separated fields, got '{input}'"
            )));
        };
        if ms.len() != 3 {
            return Err(SubxError::invalid_timestamp(format!(
                "VobSub timestamp requires exactly 3 fractional digits, got {} in '{input}'",
                ms.len()
            )));
        }
        Ok(Time(
            parse_digits(h)? * 3_600_000
                + parse_digits(m)? * 60_000
                + parse_digits(s)? * 1000
                + parse_digits(ms)?,
        ))
    }

    /// Format as VobSub `HH:MM:SS:mmm`.
    pub fn format_vobsub(self) -> String {
        let total_ms = self.0;
        let h = total_ms / 3_600_000;
        let m = (total_ms / 60_000) % 60;
        let s = (total_ms / 1000) % 60;
        let ms = total_ms % 1000;
        format!("{h:02}:{m:02}:{s:02}:{ms:03}")
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

fn parse_digits(s: &str) -> Result<u64, SubxError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SubxError::invalid_timestamp(format!(
            "expected digits, got '{s}'"
        )));
    }
    s.parse::<u64>()
        .map_err(|e| SubxError::invalid_timestamp(format!("digit overflow in '{s}': {e}")))
}

/// Split `H(:MM:SS)sepSS{sep}frac` style strings into `(h, m, s, frac)`,
/// shared by the ASS and SRT parsers which only differ in the fraction
/// separator character.
fn split_h_mm_ss_frac(
    input: &str,
    field_sep: char,
    frac_sep: char,
) -> Result<(u64, u64, u64, &str), SubxError> {
    let frac_pos = input.rfind(frac_sep).ok_or_else(|| {
        SubxError::invalid_timestamp(format!("missing '{frac_sep}' in '{input}'"))
    })?;
    let (head, frac) = (&input[..frac_pos], &input[frac_pos + 1..]);
    let parts: Vec<&str> = head.split(field_sep).collect();
    let [h, m, s] = parts.as_slice() else {
        return Err(SubxError::invalid_timestamp(format!(
            "expected 3 '{field_sep}'-separated fields in '{input}'"
        )));
    };
    Ok((parse_digits(h)?, parse_digits(m)?, parse_digits(s)?, frac))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ass_two_digit_fraction_is_centiseconds() {
        let t = Time::parse_ass("1:02:03.45").unwrap();
        assert_eq!(t.as_millis(), 3_723_450);
    }

    #[test]
    fn ass_three_digit_fraction_is_milliseconds() {
        let t = Time::parse_ass("1:02:03.456").unwrap();
        assert_eq!(t.as_millis(), 3_723_456);
    }

    #[test]
    fn ass_fraction_width_other_than_2_or_3_is_rejected() {
        assert!(Time::parse_ass("1:02:03.4").is_err());
        assert!(Time::parse_ass("1:02:03.4567").is_err());
    }

    #[test]
    fn ass_format_roundtrips_through_centiseconds() {
        let original = "1:02:03.45";
        let t = Time::parse_ass(original).unwrap();
        assert_eq!(t.format_ass(), original);
    }

    #[test]
    fn srt_requires_exactly_three_fraction_digits() {
        assert!(Time::parse_srt("00:00:01,000").is_ok());
        assert!(Time::parse_srt("00:00:01,00").is_err());
        assert!(Time::parse_srt("00:00:01,0000").is_err());
    }

    #[test]
    fn srt_roundtrip() {
        let t = Time::parse_srt("01:02:03,456").unwrap();
        assert_eq!(t.format_srt(), "01:02:03,456");
    }

    #[test]
    fn vtt_accepts_short_and_long_forms() {
        let short = Time::parse_vtt("02:03.456").unwrap();
        let long = Time::parse_vtt("00:02:03.456").unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn vtt_roundtrip_uses_long_form() {
        let t = Time::parse_vtt("01:02:03.456").unwrap();
        assert_eq!(t.format_vtt(), "01:02:03.456");
    }

    #[test]
    fn vobsub_roundtrip() {
        let t = Time::parse_vobsub("00:01:02:345").unwrap();
        assert_eq!(t.format_vobsub(), "00:01:02:345");
    }

    #[test]
    fn vobsub_requires_four_fields() {
        assert!(Time::parse_vobsub("00:01:02").is_err());
    }

    #[test]
    fn ordering_is_numeric() {
        let a = Time::from_millis(1000);
        let b = Time::from_millis(2000);
        assert!(a < b);
    }
}
