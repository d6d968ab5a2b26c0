//! MicroDVD (`.sub`) format: frame-based `{start}{end}text` lines with
//! `|` as the line-break marker, converted to/from millisecond timing
//! at a fixed frame rate.

use crate::error::{ParseError, SubxError};
use crate::formats::{record_or_throw, ParseOptions, ParseOutcome, SubtitleFormat};
use crate::model::document::SubtitleDocument;
use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_SUB_FPS: f64 = 25.0;

static LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{(\d+)\}\{(\d+)\}(.*)$").unwrap());

/// [`SubtitleFormat`] adapter for MicroDVD `.sub` files.
pub struct SubFormat;

impl SubtitleFormat for SubFormat {
    fn parse(&self, input: &str) -> Result<SubtitleDocument, SubxError> {
        Ok(parse(input, DEFAULT_SUB_FPS))
    }

    fn parse_with_options(&self, input: &str, options: ParseOptions) -> ParseOutcome {
        match parse_inner(input, DEFAULT_SUB_FPS, options) {
            Ok((document, errors)) => ParseOutcome { ok: true, document, errors, warnings: Vec::new() },
            Err(err) => ParseOutcome::empty_with_errors(vec![ParseError::from_error(&err)]),
        }
    }

    fn serialize(&self, document: &SubtitleDocument) -> Result<String, SubxError> {
        Ok(serialize(document, DEFAULT_SUB_FPS))
    }

    fn detect(&self, content: &str) -> bool {
        LINE_RE.is_match(content.trim_start())
    }

    fn format_name(&self) -> &'static str {
        "SUB"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["sub"]
    }
}

fn frame_to_ms(frame: u64, fps: f64) -> u64 {
    (frame as f64 * 1000.0 / fps).round() as u64
}

fn ms_to_frame(ms: u64, fps: f64) -> u64 {
    (ms as f64 * fps / 1000.0).round() as u64
}

/// Parse a MicroDVD document at the given frame rate.
pub fn parse(input: &str, fps: f64) -> SubtitleDocument {
    // Default (collect) options never abort, so this always succeeds.
    parse_inner(input, fps, ParseOptions::default()).expect("default options never throw").0
}

/// Parse under explicit `options`, returning the partial document plus
/// one [`ParseError`] per skipped line (§6/§7 collect mode).
fn parse_inner(
    input: &str,
    fps: f64,
    options: ParseOptions,
) -> Result<(SubtitleDocument, Vec<ParseError>), SubxError> {
    let input = crate::encoding::strip_bom(input);
    let mut doc = SubtitleDocument::new();
    let mut errors = Vec::new();
    for (lineno, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some(caps) = LINE_RE.captures(line) else {
            record_or_throw(
                options,
                SubxError::invalid_format("SUB", format!("line {} did not match the frame grammar", lineno + 1)),
                &mut errors,
            )?;
            continue;
        };
        let (Ok(start_frame), Ok(end_frame)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) else {
            record_or_throw(
                options,
                SubxError::invalid_timestamp_at(lineno + 1, "frame number out of range"),
                &mut errors,
            )?;
            continue;
        };
        let text = caps[3].replace('|', "\n");
        let start = crate::model::time::Time::from_millis(frame_to_ms(start_frame, fps));
        let end = crate::model::time::Time::from_millis(frame_to_ms(end_frame, fps));
        let _ = doc.create_event(start, end, text);
    }
    if !options.preserve_order {
        doc.sort_by_start();
    }
    Ok((doc, errors))
}

/// Serialize a document to MicroDVD text at the given frame rate.
pub fn serialize(doc: &SubtitleDocument, fps: f64) -> String {
    let mut out = String::new();
    for event in &doc.events {
        let start_frame = ms_to_frame(event.start.as_millis(), fps);
        let end_frame = ms_to_frame(event.end.as_millis(), fps);
        let text = event.effective_text().replace('\n', "|");
        out.push_str(&format!("{{{start_frame}}}{{{end_frame}}}{text}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "{10}{20}Hello|World\n";

    #[test]
    fn parse_converts_frames_to_milliseconds() {
        let doc = parse(SAMPLE, DEFAULT_SUB_FPS);
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events[0].start.as_millis(), 400);
        assert_eq!(doc.events[0].end.as_millis(), 800);
        assert_eq!(doc.events[0].text, "Hello\nWorld");
    }

    #[test]
    fn serialize_converts_back_to_frames() {
        let doc = parse(SAMPLE, DEFAULT_SUB_FPS);
        let out = serialize(&doc, DEFAULT_SUB_FPS);
        assert!(out.contains("{10}{20}Hello|World"));
    }

    #[test]
    fn custom_frame_rate_round_trips() {
        let out = serialize(&parse(SAMPLE, DEFAULT_SUB_FPS), 50.0);
        assert!(out.contains("{20}{40}Hello|World"));
    }

    #[test]
    fn detect_requires_frame_brace_pair() {
        let fmt = SubFormat;
        assert!(fmt.detect(SAMPLE));
        assert!(!fmt.detect("random text"));
    }

    #[test]
    fn blank_and_malformed_lines_are_skipped() {
        let doc = parse("\n{bad}{1}x\n{5}{10}ok\n", DEFAULT_SUB_FPS);
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events[0].text, "ok");
    }

    #[test]
    fn collect_mode_records_one_error_per_malformed_line() {
        let input = "{bad}{1}x\n{5}{10}ok\n";
        let outcome = SubFormat.parse_with_options(input, ParseOptions::default());
        assert!(outcome.ok);
        assert_eq!(outcome.document.events.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn strict_mode_aborts_on_the_first_malformed_line() {
        let input = "{bad}{1}x\n{5}{10}ok\n";
        let outcome = SubFormat.parse_with_options(input, ParseOptions { strict: true, ..ParseOptions::default() });
        assert!(!outcome.ok);
        assert_eq!(outcome.document.events.len(), 0);
    }
}
