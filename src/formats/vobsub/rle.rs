//! VobSub 2-bits-per-pixel run-length codec (component I): row-oriented
//! decode/encode with explicit end-of-line alignment.

/// Decode a VobSub RLE bitstream into a `width*height` buffer of 2-bpp
/// pixel indices (0..=3). Stops when the bitstream is exhausted or the
/// output buffer is full; a `0x00 0x00` end-of-line marker pads the
/// cursor forward to the next row boundary without writing pixels.
pub fn decode(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let total = width * height;
    let mut out = vec![0u8; total];
    let mut pos = 0usize;
    let mut i = 0usize;

    while i < data.len() && pos < total {
        let byte = data[i];
        i += 1;
        if byte != 0x00 {
            let pixels = [
                (byte >> 6) & 0x03,
                (byte >> 4) & 0x03,
                (byte >> 2) & 0x03,
                byte & 0x03,
            ];
            // A literal byte always packs 4 pixel slots, but a row whose
            // width isn't a multiple of 4 leaves the tail slots as
            // padding zeros that belong to no pixel; stop at the row
            // boundary rather than bleeding them into the next row.
            let row_end = if width > 0 { (pos / width + 1) * width } else { total };
            for p in pixels {
                if pos >= total || pos >= row_end {
                    break;
                }
                out[pos] = p;
                pos += 1;
            }
            continue;
        }

        // Saw 0x00: look at the next byte to disambiguate EOL vs a run.
        let Some(&next) = data.get(i) else { break };
        i += 1;
        if next == 0x00 {
            if width > 0 {
                let rem = pos % width;
                if rem != 0 {
                    pos += width - rem;
                }
            }
            continue;
        }

        let mode = next & 0xC0;
        let (count, color) = if mode == 0x40 {
            let Some(&extra) = data.get(i) else { break };
            i += 1;
            let count = (((next & 0x3F) as usize) << 2) | (((extra >> 6) & 0x03) as usize);
            (count, extra & 0x03)
        } else {
            (((next >> 2) & 0x3F) as usize, next & 0x03)
        };

        for _ in 0..count {
            if pos >= total {
                break;
            }
            out[pos] = color;
            pos += 1;
        }
    }
    out
}

/// Encode a `width*height` buffer of 2-bpp pixel indices into a VobSub
/// RLE bitstream, emitting an end-of-line marker after each row.
pub fn encode(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for row in 0..height {
        let row_start = row * width;
        let row_end = row_start + width;
        let row_data = &data[row_start..row_end];
        let mut col = 0usize;
        while col < row_data.len() {
            let run = run_length_at(row_data, col);
            let color = row_data[col];
            if run >= 4 {
                emit_run(&mut out, run, color);
                col += run;
            } else {
                // Pack exactly the next 4 columns (or whatever remains
                // in the row) as literal pixels, so column advancement
                // always matches what `decode` unpacks per byte.
                let take = (row_data.len() - col).min(4);
                let mut literal = [0u8; 4];
                literal[..take].copy_from_slice(&row_data[col..col + take]);
                let byte = (literal[0] << 6) | (literal[1] << 4) | (literal[2] << 2) | literal[3];
                out.push(byte);
                col += take;
            }
        }
        out.push(0x00);
        out.push(0x00);
    }
    out
}

fn run_length_at(row: &[u8], start: usize) -> usize {
    let color = row[start];
    let mut run = 1;
    while start + run < row.len() && row[start + run] == color && run < 255 {
        run += 1;
    }
    run
}

fn emit_run(out: &mut Vec<u8>, run: usize, color: u8) {
    out.push(0x00);
    if run <= 15 {
        out.push(((run as u8) << 2) | color);
    } else if run <= 63 {
        out.push(0xC0 | ((run as u8) << 2) | color);
    } else {
        out.push(0x40 | (((run >> 2) as u8) & 0x3F));
        out.push((((run & 3) as u8) << 6) | color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_full_row_runs_with_eol_markers() {
        let pixels = [1, 1, 1, 1, 2, 2, 2, 2];
        let encoded = encode(&pixels, 4, 2);
        // Each row is one run of 4 plus an EOL marker: 0x00,(4<<2)|color.
        assert_eq!(
            encoded,
            vec![0x00, 0x11, 0x00, 0x00, 0x00, 0x12, 0x00, 0x00]
        );
    }

    #[test]
    fn decodes_back_to_original() {
        let pixels = vec![1, 1, 1, 1, 2, 2, 2, 2];
        let encoded = encode(&pixels, 4, 2);
        let decoded = decode(&encoded, 4, 2);
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn row_exactly_filled_by_a_run_does_not_skip_the_next_row() {
        let pixels = vec![3, 3, 3, 3, 1, 2, 3, 0];
        let encoded = encode(&pixels, 4, 2);
        let decoded = decode(&encoded, 4, 2);
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn round_trips_mixed_literal_and_run_data() {
        let pixels = vec![0, 1, 2, 3, 1, 1, 1, 1, 1, 1, 1, 1, 3, 2, 1, 0];
        let encoded = encode(&pixels, 8, 2);
        let decoded = decode(&encoded, 8, 2);
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn long_run_uses_extra_byte() {
        let pixels = vec![3; 100];
        let encoded = encode(&pixels, 100, 1);
        let decoded = decode(&encoded, 100, 1);
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn truncated_bitstream_stops_without_panicking() {
        let decoded = decode(&[0x00], 4, 1);
        assert_eq!(decoded, vec![0, 0, 0, 0]);
    }

    #[test]
    fn row_width_not_a_multiple_of_four_round_trips() {
        // A literal group landing mid-row right before a run, on a row
        // whose width isn't 4-aligned, once desynced encode/decode.
        let pixels = vec![0, 1, 2, 3, 3, 3, 3];
        let encoded = encode(&pixels, 7, 1);
        let decoded = decode(&encoded, 7, 1);
        assert_eq!(decoded, pixels);
    }
}
