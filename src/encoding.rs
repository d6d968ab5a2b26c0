//! Byte-to-Unicode decoding, the external collaborator named in the
//! interface spec: "bytes → Unicode string with encoding hint". Charset
//! detection heuristics and file I/O live outside this crate; this
//! module only covers the thin seam parsers need before they can run a
//! line-oriented grammar over `&str`.

use crate::error::SubxError;
use encoding_rs::{Encoding, UTF_8};

/// Guess the encoding of a byte slice, trying UTF-8 first and falling
/// back to a short list of common non-Unicode encodings.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if UTF_8.decode_without_bom_handling(bytes).1 {
        return UTF_8;
    }
    let candidates = [
        encoding_rs::GBK,
        encoding_rs::BIG5,
        encoding_rs::SHIFT_JIS,
        encoding_rs::EUC_KR,
        encoding_rs::WINDOWS_1252,
    ];
    for &enc in &candidates {
        let (_decoded, _enc, had_errors) = enc.decode(bytes);
        if !had_errors {
            return enc;
        }
    }
    UTF_8
}

/// Decode a byte slice to UTF-8 using `detect_encoding`'s guess.
pub fn convert_to_utf8(bytes: &[u8]) -> Result<String, SubxError> {
    let encoding = detect_encoding(bytes);
    let (decoded, _enc, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(SubxError::Io(format!(
            "could not decode bytes as {}",
            encoding.name()
        )));
    }
    Ok(decoded.into_owned())
}

/// Strip a leading UTF-8 BOM, if present.
pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{feff}').unwrap_or(s)
}
