//! VobSub `.idx` text sidecar (component G): palette, track, and
//! timestamp/filepos table parsing and serialization.

use crate::error::SubxError;
use crate::model::color::Color;

/// One `timestamp:`/`filepos:` pair within a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdxTimestamp {
    /// Presentation time in milliseconds.
    pub time_ms: u32,
    /// Byte offset into the companion `.sub` file.
    pub filepos: u64,
}

/// A single subtitle track (one `id:` block) with its timestamp table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxTrack {
    /// Language code, e.g. `en`.
    pub lang: String,
    /// Track index as declared by `index:`.
    pub index: u32,
    /// Timestamp/filepos pairs in declaration order.
    pub timestamps: Vec<IdxTimestamp>,
}

impl IdxTrack {
    fn new(lang: impl Into<String>, index: u32) -> Self {
        IdxTrack {
            lang: lang.into(),
            index,
            timestamps: Vec::new(),
        }
    }
}

/// Fully parsed `.idx` sidecar: frame size, palette, and track list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxFile {
    /// Subpicture canvas width in pixels.
    pub width: u32,
    /// Subpicture canvas height in pixels.
    pub height: u32,
    /// 16-entry palette, packed `AABBGGRR`.
    pub palette: [Color; 16],
    /// Tracks in declaration order.
    pub tracks: Vec<IdxTrack>,
}

/// The 16-color palette substituted when a `.idx` file omits `palette:`.
pub const DEFAULT_PALETTE: [u32; 16] = [
    0x00000000, 0x00fefefe, 0x00a8a8a8, 0x00303030, 0x00c8c8c8, 0x00969696, 0x00646464,
    0x00fafafa, 0x00e1e1e1, 0x00888888, 0x00555555, 0x00222222, 0x00f0f0f0, 0x00b0b0b0,
    0x00707070, 0x00101010,
];

fn default_palette() -> [Color; 16] {
    let mut out = [Color(0); 16];
    for (i, rgb) in DEFAULT_PALETTE.iter().enumerate() {
        out[i] = Color(0xFF000000 | rgb);
    }
    out
}

impl Default for IdxFile {
    fn default() -> Self {
        IdxFile {
            width: 720,
            height: 480,
            palette: default_palette(),
            tracks: Vec::new(),
        }
    }
}

/// Parse a `.idx` file's text body.
pub fn parse(input: &str) -> Result<IdxFile, SubxError> {
    let input = crate::encoding::strip_bom(input);
    let mut idx = IdxFile::default();
    let mut palette_set = false;

    for raw_line in input.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("size:") {
            if let Some((w, h)) = rest.trim().split_once('x') {
                if let (Ok(w), Ok(h)) = (w.trim().parse(), h.trim().parse()) {
                    idx.width = w;
                    idx.height = h;
                }
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("palette:") {
            if let Some(colors) = parse_palette(rest) {
                idx.palette = colors;
                palette_set = true;
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("id:") {
            let (lang, index) = parse_id_line(rest);
            idx.tracks.push(IdxTrack::new(lang, index));
            continue;
        }
        if let Some(rest) = line.strip_prefix("timestamp:") {
            if let Some(ts) = parse_timestamp_line(rest) {
                if idx.tracks.is_empty() {
                    idx.tracks.push(IdxTrack::new("en", 0));
                }
                idx.tracks.last_mut().unwrap().timestamps.push(ts);
            }
            continue;
        }
    }

    let _ = palette_set;
    Ok(idx)
}

fn parse_palette(rest: &str) -> Option<[Color; 16]> {
    let mut colors = [Color(0xFF000000); 16];
    let entries: Vec<&str> = rest.split(',').map(|s| s.trim()).collect();
    if entries.len() != 16 {
        return None;
    }
    for (i, hex) in entries.iter().enumerate() {
        let hex = hex.trim_start_matches("0x").trim_start_matches("0X");
        let (rgb, alpha) = if hex.len() >= 8 {
            (&hex[0..6], u8::from_str_radix(&hex[6..8], 16).ok()?)
        } else {
            (hex, 0xFF)
        };
        let r = u8::from_str_radix(&rgb[0..2], 16).ok()?;
        let g = u8::from_str_radix(&rgb[2..4], 16).ok()?;
        let b = u8::from_str_radix(&rgb[4..6], 16).ok()?;
        colors[i] = Color::from_rgba(r, g, b, alpha);
    }
    Some(colors)
}

fn parse_id_line(rest: &str) -> (String, u32) {
    let mut lang = "en".to_string();
    let mut index = 0u32;
    for (i, part) in rest.split(',').enumerate() {
        let part = part.trim();
        if i == 0 {
            lang = part.to_string();
        } else if let Some(n) = part.strip_prefix("index:") {
            index = n.trim().parse().unwrap_or(0);
        }
    }
    (lang, index)
}

fn parse_timestamp_line(rest: &str) -> Option<IdxTimestamp> {
    let (time_part, filepos_part) = rest.split_once(',')?;
    let time_part = time_part.trim();
    let filepos_part = filepos_part.trim().strip_prefix("filepos:")?.trim();
    let time = crate::model::time::Time::parse_vobsub(time_part).ok()?;
    let filepos = u64::from_str_radix(filepos_part, 16).ok()?;
    Some(IdxTimestamp {
        time_ms: time.as_millis() as u32,
        filepos,
    })
}

/// Serialize an `.idx` file back to text.
pub fn serialize(idx: &IdxFile) -> String {
    let mut out = String::new();
    out.push_str("# VobSub index file, v7 (do not modify this line!)\n");
    out.push_str(&format!("size: {}x{}\n", idx.width, idx.height));
    let palette_line = idx
        .palette
        .iter()
        .map(|c| format!("{:02x}{:02x}{:02x}", c.r(), c.g(), c.b()))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!("palette: {palette_line}\n"));
    for track in &idx.tracks {
        out.push_str(&format!("id: {}, index: {}\n", track.lang, track.index));
        for ts in &track.timestamps {
            let time = crate::model::time::Time::from_millis(ts.time_ms as u64);
            out.push_str(&format!(
                "timestamp: {}, filepos: {:09x}\n",
                time.format_vobsub(),
                ts.filepos
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_idx_synthesizes_default_track() {
        let input = "size: 720x480\n\
                      id: en, index: 0\n\
                      timestamp: 00:00:01:000, filepos: 000000000\n";
        let idx = parse(input).unwrap();
        assert_eq!(idx.width, 720);
        assert_eq!(idx.height, 480);
        assert_eq!(idx.tracks.len(), 1);
        assert_eq!(idx.tracks[0].lang, "en");
        assert_eq!(idx.tracks[0].timestamps[0].time_ms, 1000);
        assert_eq!(idx.tracks[0].timestamps[0].filepos, 0);
    }

    #[test]
    fn missing_size_defaults_to_720x480() {
        let idx = parse("id: en, index: 0\n").unwrap();
        assert_eq!((idx.width, idx.height), (720, 480));
    }

    #[test]
    fn missing_track_before_timestamp_synthesizes_one() {
        let idx = parse("timestamp: 00:00:02:500, filepos: 0000000ff\n").unwrap();
        assert_eq!(idx.tracks.len(), 1);
        assert_eq!(idx.tracks[0].lang, "en");
        assert_eq!(idx.tracks[0].index, 0);
        assert_eq!(idx.tracks[0].timestamps[0].filepos, 0xff);
    }

    #[test]
    fn palette_with_alpha_channel_is_parsed() {
        let rest = (0..16).map(|_| "ff0000ff").collect::<Vec<_>>().join(", ");
        let idx = parse(&format!("palette: {rest}\n")).unwrap();
        assert_eq!(idx.palette[0].to_rgba(), (0xff, 0x00, 0x00, 0xff));
    }

    #[test]
    fn roundtrip_preserves_tracks_and_timestamps() {
        let input = "size: 720x480\n\
                      id: en, index: 0\n\
                      timestamp: 00:00:01:000, filepos: 000000000\n\
                      timestamp: 00:00:02:000, filepos: 0000003e8\n";
        let idx = parse(input).unwrap();
        let reparsed = parse(&serialize(&idx)).unwrap();
        assert_eq!(idx.tracks, reparsed.tracks);
    }
}
