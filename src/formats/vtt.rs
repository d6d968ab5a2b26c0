//! WebVTT format: `WEBVTT` header, cue blocks, `NOTE`/`STYLE`/`REGION`
//! blocks, and the shared HTML-like tag engine for inline styling.

use crate::error::{ParseError, SubxError};
use crate::formats::html_tags::{self, HtmlFlavor};
use crate::formats::{record_or_throw, ParseOptions, ParseOutcome, SubtitleFormat};
use crate::model::document::{SubtitleDocument, VttRegion};
use crate::model::time::Time;

/// [`SubtitleFormat`] adapter for WebVTT `.vtt` files.
pub struct VttFormat;

impl SubtitleFormat for VttFormat {
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
        crate::encoding::strip_bom(content.trim_start()).starts_with("WEBVTT")
    }

    fn format_name(&self) -> &'static str {
        "VTT"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["vtt"]
    }

    fn supports_styling(&self) -> bool {
        true
    }
}

fn is_time_line(line: &str) -> Option<(Time, Time)> {
    let (left, right) = line.split_once("-->")?;
    let start = Time::parse_vtt(left.trim()).ok()?;
    let right = right.trim();
    let end_token = right.split_whitespace().next()?;
    let end = Time::parse_vtt(end_token).ok()?;
    Some((start, end))
}

/// Parse a WebVTT document into the canonical model.
pub fn parse(input: &str) -> Result<SubtitleDocument, SubxError> {
    parse_inner(input, ParseOptions::default()).map(|(doc, _errors)| doc)
}

/// Parse under explicit `options`, returning the partial document plus
/// one [`ParseError`] per skipped cue block (§6/§7 collect mode).
fn parse_inner(input: &str, options: ParseOptions) -> Result<(SubtitleDocument, Vec<ParseError>), SubxError> {
    let input = crate::encoding::strip_bom(input);
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = normalized.lines();

    let header = lines
        .next()
        .ok_or_else(|| SubxError::invalid_format("VTT", "empty input"))?;
    if !header.starts_with("WEBVTT") {
        return Err(SubxError::invalid_format("VTT", "missing WEBVTT header"));
    }

    let mut doc = SubtitleDocument::new();
    let mut errors = Vec::new();
    let rest: String = lines.collect::<Vec<_>>().join("\n");

    for (block_index, block) in rest.split("\n\n").enumerate() {
        let block_lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
        if block_lines.is_empty() {
            continue;
        }
        if block_lines[0].starts_with("NOTE") {
            continue;
        }
        if block_lines[0].trim() == "STYLE" {
            continue;
        }
        if block_lines[0].trim().starts_with("REGION") {
            doc.regions.push(parse_region(&block_lines));
            continue;
        }

        let (time_line_idx, times) = if let Some(times) = is_time_line(block_lines[0]) {
            (0, times)
        } else if let Some(times) = block_lines.get(1).and_then(|l| is_time_line(l)) {
            (1, times)
        } else {
            record_or_throw(
                options,
                SubxError::invalid_format("VTT", format!("cue block {} has no parsable time line", block_index + 1)),
                &mut errors,
            )?;
            continue;
        };
        let (start, end) = times;
        let text = block_lines[time_line_idx + 1..].join("\n");
        let segments = html_tags::parse_html_tags(&text, HtmlFlavor::Vtt);
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

fn parse_region(lines: &[&str]) -> VttRegion {
    let mut region = VttRegion::default();
    for line in &lines[1..] {
        let Some((key, value)) = line.split_once(':') else { continue };
        match key.trim() {
            "id" => region.id = value.trim().to_string(),
            "width" => region.width = value.trim().trim_end_matches('%').parse().ok(),
            "lines" => region.lines = value.trim().parse().ok(),
            "regionanchor" => region.region_anchor = parse_anchor(value.trim()),
            "viewportanchor" => region.viewport_anchor = parse_anchor(value.trim()),
            "scroll" => region.scroll = Some(value.trim().to_string()),
            _ => {}
        }
    }
    region
}

fn parse_anchor(value: &str) -> Option<(f64, f64)> {
    let (x, y) = value.split_once(',')?;
    Some((
        x.trim().trim_end_matches('%').parse().ok()?,
        y.trim().trim_end_matches('%').parse().ok()?,
    ))
}

/// Serialize a document to WebVTT text.
pub fn serialize(doc: &SubtitleDocument) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for region in &doc.regions {
        out.push_str("REGION\n");
        out.push_str(&format!("id:{}\n", region.id));
        if let Some(w) = region.width {
            out.push_str(&format!("width:{w}%\n"));
        }
        if let Some(l) = region.lines {
            out.push_str(&format!("lines:{l}\n"));
        }
        if let Some((x, y)) = region.region_anchor {
            out.push_str(&format!("regionanchor:{x}%,{y}%\n"));
        }
        if let Some((x, y)) = region.viewport_anchor {
            out.push_str(&format!("viewportanchor:{x}%,{y}%\n"));
        }
        if let Some(scroll) = &region.scroll {
            out.push_str(&format!("scroll:{scroll}\n"));
        }
        out.push('\n');
    }
    for event in &doc.events {
        let text = if !event.segments.is_empty() {
            html_tags::serialize_html_tags(&event.segments)
        } else {
            event.text.clone()
        };
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            event.start.format_vtt(),
            event.end.format_vtt(),
            text
        ));
    }
    out
}
