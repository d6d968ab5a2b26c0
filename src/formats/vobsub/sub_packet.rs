//! VobSub `.sub` packet framer (component H): locates a subtitle PES
//! packet at a byte offset from the `.idx` filepos table, reassembles
//! its SPU payload, and interprets the control sequence.

use crate::error::SubxError;

/// One framed subpicture unit extracted from a `.sub` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlePacket {
    /// Presentation time in milliseconds.
    pub pts: u32,
    /// On-screen duration in milliseconds, from the stop-display command.
    pub duration: u32,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    /// Raw RLE bitstream as stored in the SPU.
    pub rle_data: Vec<u8>,
    /// Whether the SPU carries a forced-display command.
    pub forced: bool,
}

const PACK_START: u8 = 0xBA;
const PRIVATE_STREAM_1: u8 = 0xBD;

/// Locate and frame the subtitle packet starting at `filepos`.
pub fn extract_packet(data: &[u8], filepos: usize) -> Result<SubtitlePacket, SubxError> {
    let mut offset = filepos;
    let data_len = data.len();
    let max_scan = (filepos + 262_144).min(data_len);

    let mut pts: u32 = 0;
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    let mut expected_size = 0usize;
    let mut collected = 0usize;

    while offset + 4 <= max_scan {
        if data[offset] != 0x00 || data[offset + 1] != 0x00 || data[offset + 2] != 0x01 {
            offset += 1;
            continue;
        }
        let stream_id = data[offset + 3];

        if stream_id == PACK_START {
            offset += 4;
            if offset < data_len && (data[offset] & 0xC0) == 0x40 {
                offset += 9;
                if offset < data_len {
                    let stuffing = (data[offset] & 0x07) as usize;
                    offset += 1 + stuffing;
                }
            } else {
                offset += 8;
            }
            continue;
        }

        if stream_id == PRIVATE_STREAM_1 {
            offset += 4;
            if offset + 2 > data_len {
                break;
            }
            let pes_len = ((data[offset] as usize) << 8) | data[offset + 1] as usize;
            offset += 2;
            let pes_end = offset + pes_len;
            if pes_end > data_len {
                return Err(SubxError::malformed_event(filepos, "truncated PES packet"));
            }

            if offset + 2 > pes_end {
                return Err(SubxError::malformed_event(filepos, "PES header too short"));
            }
            let pes_flags = data[offset + 1];
            let header_len = data[offset + 2] as usize;
            offset += 3;
            if (pes_flags & 0x80) != 0 && pts == 0 {
                pts = extract_pts(data, offset);
            }
            offset += header_len;
            offset += 1; // substream id byte

            let payload_len = pes_end.saturating_sub(offset);
            if offset + payload_len > data_len {
                return Err(SubxError::malformed_event(filepos, "PES payload overruns buffer"));
            }
            let payload = data[offset..offset + payload_len].to_vec();
            if expected_size == 0 && payload.len() >= 2 {
                expected_size = ((payload[0] as usize) << 8) | payload[1] as usize;
            }
            collected += payload.len();
            chunks.push(payload);
            offset = pes_end;
            if expected_size > 0 && collected >= expected_size {
                break;
            }
            continue;
        }

        // Any other stream type: skip its declared length.
        offset += 4;
        if offset + 2 > data_len {
            break;
        }
        let length = ((data[offset] as usize) << 8) | data[offset + 1] as usize;
        offset += 2 + length;
    }

    if chunks.is_empty() {
        return Err(SubxError::malformed_event(filepos, "no subtitle PES packet found"));
    }
    let spu: Vec<u8> = chunks.into_iter().flatten().collect();
    parse_spu(&spu, pts, filepos)
}

fn extract_pts(data: &[u8], offset: usize) -> u32 {
    if offset + 5 > data.len() {
        return 0;
    }
    let p32_30 = ((data[offset] >> 1) & 0x07) as u64;
    let p29_15 = ((data[offset + 1] as u64) << 7) | ((data[offset + 2] >> 1) as u64);
    let p14_0 = ((data[offset + 3] as u64) << 7) | ((data[offset + 4] >> 1) as u64);
    let pts90k = (p32_30 << 30) | (p29_15 << 15) | p14_0;
    (pts90k / 90) as u32
}

fn parse_spu(data: &[u8], pts: u32, filepos: usize) -> Result<SubtitlePacket, SubxError> {
    if data.len() < 4 {
        return Err(SubxError::malformed_event(filepos, "SPU shorter than its own header"));
    }
    let dcsq_offset = ((data[2] as usize) << 8) | data[3] as usize;
    if dcsq_offset >= data.len() {
        return Err(SubxError::malformed_event(filepos, "control sequence offset out of range"));
    }

    let mut x = 0u16;
    let mut y = 0u16;
    let mut width = 0u16;
    let mut height = 0u16;
    let mut duration = 0u32;
    let mut forced = false;
    let mut found_stop = false;
    let mut rle_start = 4usize;

    let mut ctrl_offset = dcsq_offset;
    let mut iterations = 0;
    while ctrl_offset < data.len() && iterations < 1000 && !found_stop {
        iterations += 1;
        let block_start = ctrl_offset;
        if ctrl_offset + 4 > data.len() {
            break;
        }
        let delay = ((data[ctrl_offset] as u32) << 8) | data[ctrl_offset + 1] as u32;
        ctrl_offset += 2;
        let next_ctrl_offset = ((data[ctrl_offset] as usize) << 8) | data[ctrl_offset + 1] as usize;
        ctrl_offset += 2;

        loop {
            if ctrl_offset >= data.len() {
                break;
            }
            let cmd = data[ctrl_offset];
            ctrl_offset += 1;
            match cmd {
                0x00 => forced = true,
                0x01 => {}
                0x02 => {
                    duration = (delay * 1024) / 90;
                    found_stop = true;
                }
                0x03 => ctrl_offset += 2,
                0x04 => ctrl_offset += 2,
                0x05 => {
                    if ctrl_offset + 6 <= data.len() {
                        let x1 = ((data[ctrl_offset] as u16) << 4) | ((data[ctrl_offset + 1] >> 4) as u16);
                        let x2 = (((data[ctrl_offset + 1] & 0x0F) as u16) << 8) | data[ctrl_offset + 2] as u16;
                        let y1 = ((data[ctrl_offset + 3] as u16) << 4) | ((data[ctrl_offset + 4] >> 4) as u16);
                        let y2 = (((data[ctrl_offset + 4] & 0x0F) as u16) << 8) | data[ctrl_offset + 5] as u16;
                        x = x1;
                        y = y1;
                        width = x2.saturating_sub(x1) + 1;
                        height = y2.saturating_sub(y1) + 1;
                        ctrl_offset += 6;
                    }
                }
                0x06 => {
                    if ctrl_offset + 4 <= data.len() {
                        rle_start = ((data[ctrl_offset] as usize) << 8) | data[ctrl_offset + 1] as usize;
                        ctrl_offset += 4;
                    }
                }
                0xFF => break,
                _ => {}
            }
            if cmd == 0xFF || cmd == 0x02 {
                break;
            }
        }

        let next_block_abs = next_ctrl_offset;
        if next_ctrl_offset < dcsq_offset || next_block_abs <= block_start {
            break;
        }
        ctrl_offset = next_block_abs;
    }

    let rle_end = dcsq_offset.min(data.len());
    let rle_data = if rle_start < rle_end {
        data[rle_start..rle_end].to_vec()
    } else {
        Vec::new()
    };

    Ok(SubtitlePacket {
        pts,
        duration,
        x,
        y,
        width,
        height,
        rle_data,
        forced,
    })
}

/// Frame a sequence of packets into a `.sub` byte stream, returning the
/// byte stream plus the starting offset written for each packet (for
/// retro-filling the companion `.idx` filepos table).
pub fn write_packets(packets: &[SubtitlePacket]) -> (Vec<u8>, Vec<u64>) {
    let mut out = Vec::new();
    let mut offsets = Vec::with_capacity(packets.len());

    for packet in packets {
        let start = out.len() as u64;
        offsets.push(start);
        write_pack_header(&mut out);
        write_pes_packet(&mut out, packet);
    }
    (out, offsets)
}

fn write_pack_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&[0x00, 0x00, 0x01, PACK_START]);
    // MPEG-2 pack header: 9 fixed bytes, then a stuffing-length byte
    // (zero here, so no stuffing bytes follow).
    out.extend_from_slice(&[0x44, 0, 0, 0, 0, 0, 0, 0, 0]);
    out.push(0x00);
}

fn write_pes_packet(out: &mut Vec<u8>, packet: &SubtitlePacket) {
    let spu = build_spu(packet);
    let pts90k = (packet.pts as u64) * 90;
    let mut header = vec![0x80, 0x80, 0x05];
    header.extend_from_slice(&encode_pts(pts90k));
    header.push(0x20); // substream id for subtitle stream 0

    let pes_payload_len = header.len() + spu.len();
    out.extend_from_slice(&[0x00, 0x00, 0x01, PRIVATE_STREAM_1]);
    out.extend_from_slice(&(pes_payload_len as u16).to_be_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&spu);
}

fn encode_pts(pts90k: u64) -> [u8; 5] {
    let p32_30 = ((pts90k >> 30) & 0x07) as u8;
    let p29_15 = ((pts90k >> 15) & 0x7FFF) as u16;
    let p14_0 = (pts90k & 0x7FFF) as u16;
    [
        0x21 | (p32_30 << 1),
        (p29_15 >> 7) as u8,
        ((p29_15 << 1) | 1) as u8,
        (p14_0 >> 7) as u8,
        ((p14_0 << 1) | 1) as u8,
    ]
}

fn build_spu(packet: &SubtitlePacket) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[0, 0]); // placeholder for total size
    body.extend_from_slice(&[0, 0]); // placeholder for dcsq offset
    let rle_start = body.len() as u16;
    body.extend_from_slice(&packet.rle_data);

    let dcsq_offset = body.len() as u16;
    let delay = ((packet.duration as u64) * 90 / 1024) as u16;
    body.extend_from_slice(&delay.to_be_bytes());
    body.extend_from_slice(&dcsq_offset.to_be_bytes()); // self-referencing: last block
    if packet.forced {
        body.push(0x00);
    }
    body.push(0x01); // start display
    body.push(0x05); // set display area
    let x2 = packet.x + packet.width.saturating_sub(1);
    let y2 = packet.y + packet.height.saturating_sub(1);
    body.push((packet.x >> 4) as u8);
    body.push((((packet.x & 0x0F) as u8) << 4) | ((x2 >> 8) as u8));
    body.push((x2 & 0xFF) as u8);
    body.push((packet.y >> 4) as u8);
    body.push((((packet.y & 0x0F) as u8) << 4) | ((y2 >> 8) as u8));
    body.push((y2 & 0xFF) as u8);
    body.push(0x06); // set field offsets
    body.extend_from_slice(&rle_start.to_be_bytes());
    body.extend_from_slice(&rle_start.to_be_bytes());
    body.push(0x02); // stop display

    let total_size = body.len() as u16;
    body[0..2].copy_from_slice(&total_size.to_be_bytes());
    body[2..4].copy_from_slice(&dcsq_offset.to_be_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet() -> SubtitlePacket {
        SubtitlePacket {
            pts: 1000,
            duration: 2000,
            x: 10,
            y: 20,
            width: 40,
            height: 30,
            rle_data: vec![0x00, 0x11, 0x00, 0x00],
            forced: false,
        }
    }

    #[test]
    fn writes_and_reframes_a_single_packet() {
        let packet = sample_packet();
        let (bytes, offsets) = write_packets(std::slice::from_ref(&packet));
        assert_eq!(offsets.len(), 1);
        let reparsed = extract_packet(&bytes, offsets[0] as usize).unwrap();
        assert_eq!(reparsed.x, packet.x);
        assert_eq!(reparsed.y, packet.y);
        assert_eq!(reparsed.width, packet.width);
        assert_eq!(reparsed.height, packet.height);
        assert_eq!(reparsed.rle_data, packet.rle_data);
        assert_eq!(reparsed.pts, packet.pts);
    }

    #[test]
    fn forced_flag_round_trips() {
        let mut packet = sample_packet();
        packet.forced = true;
        let (bytes, offsets) = write_packets(std::slice::from_ref(&packet));
        let reparsed = extract_packet(&bytes, offsets[0] as usize).unwrap();
        assert!(reparsed.forced);
    }

    #[test]
    fn multiple_packets_get_distinct_offsets() {
        let packets = vec![sample_packet(), sample_packet()];
        let (bytes, offsets) = write_packets(&packets);
        assert_eq!(offsets.len(), 2);
        assert!(offsets[1] > offsets[0]);
        let first = extract_packet(&bytes, offsets[0] as usize).unwrap();
        let second = extract_packet(&bytes, offsets[1] as usize).unwrap();
        assert_eq!(first.rle_data, second.rle_data);
    }

    #[test]
    fn truncated_buffer_is_a_recoverable_malformed_event() {
        let err = extract_packet(&[0x00, 0x00, 0x01, 0xBD, 0x00], 0).unwrap_err();
        assert!(matches!(err, SubxError::MalformedEvent { .. }));
    }
}
