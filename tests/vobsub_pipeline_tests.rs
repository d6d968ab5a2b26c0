//! End-to-end VobSub pipeline coverage: a `.idx` sidecar plus a `.sub`
//! byte stream built entirely in-memory, run through the full
//! idx -> packet framer -> RLE decode chain that `load_track` composes.

use subx_core::formats::vobsub::sub_packet::{write_packets, SubtitlePacket};
use subx_core::formats::vobsub::{idx, load_track, rle};
use subx_core::model::document::Effect;

fn bitmap_packet(pixels: &[u8], width: u16, height: u16, pts: u32, duration: u32) -> SubtitlePacket {
    SubtitlePacket {
        pts,
        duration,
        x: 5,
        y: 7,
        width,
        height,
        rle_data: rle::encode(pixels, width as usize, height as usize),
        forced: false,
    }
}

#[test]
fn idx_and_sub_stream_round_trip_into_image_events() {
    let frame_a = vec![1, 1, 1, 1, 2, 2, 2, 2];
    let frame_b = vec![3, 3, 0, 0];
    let (sub_bytes, offsets) = write_packets(&[
        bitmap_packet(&frame_a, 4, 2, 1_000, 1_500),
        bitmap_packet(&frame_b, 2, 2, 5_000, 800),
    ]);

    let idx_text = format!(
        "# VobSub index file, v7 (do not modify this line!)\n\
         size: 720x480\n\
         id: en, index: 0\n\
         timestamp: 00:00:01:000, filepos: {:09x}\n\
         timestamp: 00:00:05:000, filepos: {:09x}\n",
        offsets[0], offsets[1],
    );
    let idx_file = idx::parse(&idx_text).unwrap();
    assert_eq!(idx_file.tracks.len(), 1);
    assert_eq!(idx_file.tracks[0].timestamps.len(), 2);

    let doc = load_track(&idx_file, 0, &sub_bytes).unwrap();
    assert_eq!(doc.events.len(), 2);

    assert_eq!(doc.events[0].start.as_millis(), 1000);
    let Effect::Image { width, height, data, .. } = &doc.events[0].segments[0].effects[0] else {
        panic!("expected an image effect on the first event");
    };
    assert_eq!((*width, *height), (4, 2));
    assert_eq!(data, &frame_a);

    assert_eq!(doc.events[1].start.as_millis(), 5000);
    let Effect::Image { data, .. } = &doc.events[1].segments[0].effects[0] else {
        panic!("expected an image effect on the second event");
    };
    assert_eq!(data, &frame_b);
}

#[test]
fn track_lookup_out_of_range_is_an_invalid_format_error() {
    let idx_file = idx::parse("size: 720x480\nid: en, index: 0\n").unwrap();
    let err = load_track(&idx_file, 3, &[]).unwrap_err();
    assert!(matches!(err, subx_core::error::SubxError::InvalidFormat { .. }));
}

#[test]
fn idx_serialize_then_reparse_preserves_the_filepos_table() {
    let (_sub_bytes, offsets) = write_packets(&[bitmap_packet(&[1, 1, 1, 1], 4, 1, 2_000, 500)]);
    let idx_text = format!(
        "size: 720x480\nid: en, index: 0\ntimestamp: 00:00:02:000, filepos: {:09x}\n",
        offsets[0],
    );
    let parsed = idx::parse(&idx_text).unwrap();
    let reparsed = idx::parse(&idx::serialize(&parsed)).unwrap();
    assert_eq!(parsed.tracks, reparsed.tracks);
}
