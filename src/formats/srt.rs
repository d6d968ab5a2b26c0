//! SubRip (SRT) format: block grammar, `HH:MM:SS,mmm` timing, and the
//! shared HTML-like tag engine for inline styling.

use crate::error::{ParseError, SubxError};
use crate::formats::html_tags::{self, HtmlFlavor};
use crate::formats::{record_or_throw, ParseOptions, ParseOutcome, SubtitleFormat};
use crate::model::document::SubtitleDocument;
use crate::model::time::Time;

/// [`SubtitleFormat`] adapter for SubRip `.srt` files.
pub struct SrtFormat;

impl SubtitleFormat for SrtFormat {
    fn parse(&self, input: &str) -> Result<SubtitleDocument, SubxError> {
        parse(input)
    }

    fn parse_with_options(&self, input: &str, options: ParseOptions) -> ParseOutcome {
        match parse_inner(input, options) {
            Ok((document, errors)) => ParseOutcome { ok: true, document, errors, warnings: Vec::new() },
            Err(err) => ParseOutcome::empty_with_errors(vec![ParseError::from_error(&err)]),
        }
    }

    fn serialize(&self, document: &SubtitleDocument) -> Result<String, SubxError> {
        Ok(serialize(document))
    }

    fn detect(&self, content: &str) -> bool {
        content.lines().any(|line| is_time_line(line.trim()).is_some())
    }

    fn format_name(&self) -> &'static str {
        "SRT"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["srt"]
    }

    fn supports_styling(&self) -> bool {
        true
    }
}

fn is_time_line(line: &str) -> Option<(Time, Time)> {
    let (left, right) = line.split_once("-->")?;
    let start = Time::parse_srt(left.trim()).ok()?;
    let right = right.trim().split_whitespace().next()?;
    let end = Time::parse_srt(right).ok()?;
    Some((start, end))
}

/// Parse an SRT document into the canonical model.
pub fn parse(input: &str) -> Result<SubtitleDocument, SubxError> {
    parse_inner(input, ParseOptions::default()).map(|(doc, _errors)| doc)
}

/// Parse under explicit `options`, returning the partial document plus
/// one [`ParseError`] per skipped block (§6/§7 collect mode).
fn parse_inner(input: &str, options: ParseOptions) -> Result<(SubtitleDocument, Vec<ParseError>), SubxError> {
    let input = crate::encoding::strip_bom(input);
    let mut doc = SubtitleDocument::new();
    let mut errors = Vec::new();
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");

    for (block_index, block) in normalized.split("\n\n").enumerate() {
        let lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            continue;
        }
        // Either `<index>\n<time line>\n<text...>` or, tolerating a
        // missing index line, `<time line>\n<text...>`.
        let (time_idx, rest_start) = if let Some(times) = is_time_line(lines[0].trim()) {
            (times, 1)
        } else if let Some(times) = lines.get(1).and_then(|l| is_time_line(l.trim())) {
            (times, 2)
        } else {
            record_or_throw(
                options,
                SubxError::invalid_format("SRT", format!("block {} has no parsable time line", block_index + 1)),
                &mut errors,
            )?;
            continue;
        };
        let (start, end) = time_idx;
        let text = lines[rest_start..].join("\n");
        let segments = html_tags::parse_html_tags(&text, HtmlFlavor::Srt);
        let plain = html_tags::strip_tags(&text);
        if doc.create_event(start, end, plain).is_ok() {
            if let Some(event) = doc.events.last_mut() {
                event.segments = segments;
            }
        }
    }
    if !options.preserve_order {
        doc.sort_by_start();
    }
    Ok((doc, errors))
}

/// Serialize a document to SRT text, renumbering blocks from 1.
pub fn serialize(doc: &SubtitleDocument) -> String {
    let mut out = String::new();
    for (i, event) in doc.events.iter().enumerate() {
        let text = if !event.segments.is_empty() {
            html_tags::serialize_html_tags(&event.segments)
        } else {
            event.text.clone()
        };
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            event.start.format_srt(),
            event.end.format_srt(),
            text
        ));
    }
    out
}
