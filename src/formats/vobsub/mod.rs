//! VobSub binary picture-caption pipeline: `.idx` metadata (component
//! G), `.sub` packet framing (component H), and the 2-bpp RLE codec
//! (component I), composed over the canonical document model.
//!
//! VobSub events carry a bitmap rather than text, so this does not
//! implement [`crate::formats::SubtitleFormat`]; callers work with
//! [`load_track`] and [`VobSubImage`] directly.

pub mod idx;
pub mod rle;
pub mod sub_packet;

use crate::error::SubxError;
use crate::model::color::Color;
use crate::model::document::{Effect, SubtitleDocument};
use crate::model::time::Time;
use idx::IdxFile;
use log::warn;
use sub_packet::SubtitlePacket;

/// A decoded VobSub subtitle image: position, size, palette-indexed
/// pixels, and the palette it indexes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VobSubImage {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    /// One byte per pixel, value `0..=3`.
    pub pixels: Vec<u8>,
    pub palette: [Color; 16],
    pub forced: bool,
}

/// Read a track's `.idx` timestamp table and `.sub` byte stream into a
/// [`SubtitleDocument`] whose events carry an [`Effect::Image`] (rle)
/// payload instead of text.
pub fn load_track(idx: &IdxFile, track_index: usize, sub_data: &[u8]) -> Result<SubtitleDocument, SubxError> {
    let track = idx
        .tracks
        .get(track_index)
        .ok_or_else(|| SubxError::invalid_format("VobSub", "track index out of range"))?;
    let mut doc = SubtitleDocument::new();

    for ts in &track.timestamps {
        let packet = match sub_packet::extract_packet(sub_data, ts.filepos as usize) {
            Ok(p) => p,
            Err(err) => {
                warn!("skipping unreadable VobSub packet at filepos {:#x}: {err}", ts.filepos);
                continue;
            }
        };
        let start = Time::from_millis(ts.time_ms as u64);
        let end = Time::from_millis(ts.time_ms as u64 + packet.duration as u64);
        let image = decode_packet(&packet, idx.palette);
        if doc.create_event(start, end, String::new()).is_ok() {
            if let Some(event) = doc.events.last_mut() {
                event.segments.push(crate::model::document::TextSegment {
                    text: String::new(),
                    style: None,
                    effects: vec![Effect::Image {
                        format: crate::model::document::ImageFormat::Rle,
                        width: image.width as u32,
                        height: image.height as u32,
                        x: image.x as i32,
                        y: image.y as i32,
                        data: image.pixels,
                        palette: image.palette.to_vec(),
                    }],
                });
                event.dirty = true;
            }
        }
    }
    Ok(doc)
}

fn decode_packet(packet: &SubtitlePacket, palette: [Color; 16]) -> VobSubImage {
    let pixels = rle::decode(&packet.rle_data, packet.width as usize, packet.height as usize);
    VobSubImage {
        x: packet.x,
        y: packet.y,
        width: packet.width,
        height: packet.height,
        pixels,
        palette,
        forced: packet.forced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_idx_track_with_no_matching_sub_data_yields_empty_document() {
        let idx = idx::parse(
            "size: 720x480\nid: en, index: 0\ntimestamp: 00:00:01:000, filepos: 000000000\n",
        )
        .unwrap();
        let doc = load_track(&idx, 0, &[]).unwrap();
        assert_eq!(doc.events.len(), 0);
    }

    #[test]
    fn load_track_rejects_out_of_range_index() {
        let idx = IdxFile::default();
        assert!(load_track(&idx, 0, &[]).is_err());
    }

    #[test]
    fn decoded_packet_carries_palette_and_bitmap() {
        let packet = SubtitlePacket {
            pts: 0,
            duration: 500,
            x: 0,
            y: 0,
            width: 4,
            height: 2,
            rle_data: rle::encode(&[1, 1, 1, 1, 2, 2, 2, 2], 4, 2),
            forced: false,
        };
        let image = decode_packet(&packet, idx::IdxFile::default().palette);
        assert_eq!(image.pixels, vec![1, 1, 1, 1, 2, 2, 2, 2]);
    }
}
