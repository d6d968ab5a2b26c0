//! The ASS/SSA event parser (component F) and its [`SubtitleFormat`] impl.

pub mod tags;

use crate::error::{ParseError, SubxError};
use crate::formats::{record_or_throw, ParseOptions, ParseOutcome, SubtitleFormat};
use crate::model::color::Color;
use crate::model::document::{EmbeddedBlob, ScriptInfo, Style, SubtitleDocument, WrapStyle};
use crate::model::time::Time;

const CANONICAL_EVENT_FIELDS: &[&str] = &[
    "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    ScriptInfo,
    Styles,
    Events,
    Fonts,
    Graphics,
}

fn section_from_header(trimmed: &str) -> Option<Section> {
    let inner = trimmed.strip_prefix('[')?.strip_suffix(']')?;
    match inner.to_ascii_lowercase().as_str() {
        "script info" => Some(Section::ScriptInfo),
        "v4+ styles" | "v4 styles" => Some(Section::Styles),
        "events" => Some(Section::Events),
        "fonts" => Some(Section::Fonts),
        "graphics" => Some(Section::Graphics),
        _ => None,
    }
}

/// Parse a complete ASS/SSA script into a [`SubtitleDocument`].
///
/// Dialogue text is stored verbatim in `event.text`; `event.segments`
/// stays empty and `event.dirty` stays `false` until a caller opts into
/// the override-tag engine explicitly (see [`tags::parse_tags`]).
pub fn parse(input: &str) -> Result<SubtitleDocument, SubxError> {
    parse_inner(input, ParseOptions::default()).map(|(doc, _errors)| doc)
}

/// Parse under explicit `options`, returning the partial document plus
/// one [`ParseError`] per skipped dialogue line (§6/§7 collect mode).
fn parse_inner(input: &str, options: ParseOptions) -> Result<(SubtitleDocument, Vec<ParseError>), SubxError> {
    let input = crate::encoding::strip_bom(input);
    let mut doc = SubtitleDocument::new();
    let mut section = Section::None;
    let mut style_format: Vec<String> = default_style_format();
    let mut event_format: Vec<String> = CANONICAL_EVENT_FIELDS.iter().map(|s| s.to_string()).collect();
    let mut current_blob: Option<(Section, EmbeddedBlob)> = None;
    let mut errors: Vec<ParseError> = Vec::new();

    let mut any_section_seen = false;

    for (lineno, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();

        if let Some(new_section) = section_from_header(trimmed) {
            flush_blob(&mut current_blob, &mut doc);
            section = new_section;
            any_section_seen = true;
            continue;
        }
        if trimmed.starts_with('[') {
            // Unknown section header: skip lines until the next header.
            flush_blob(&mut current_blob, &mut doc);
            section = Section::None;
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        match section {
            Section::ScriptInfo => parse_script_info_line(trimmed, &mut doc.info),
            Section::Styles => {
                if let Some(fmt) = trimmed.strip_prefix("Format:") {
                    style_format = parse_format_line(fmt);
                } else if let Some(body) = trimmed.strip_prefix("Style:") {
                    if let Some(style) = parse_style_line(body, &style_format) {
                        doc.styles.upsert(style);
                    }
                }
            }
            Section::Events => {
                if let Some(fmt) = trimmed.strip_prefix("Format:") {
                    event_format = parse_format_line(fmt);
                } else if let Some(body) = trimmed.strip_prefix("Dialogue:") {
                    match parse_event_line(body, &event_format, lineno + 1) {
                        Ok(event) => doc.events.push(event),
                        Err(err) => record_or_throw(options, err, &mut errors)?,
                    }
                } else if let Some(body) = trimmed.strip_prefix("Comment:") {
                    doc.add_comment(body.trim_start());
                }
            }
            Section::Fonts => handle_blob_line(trimmed, "fontname:", Section::Fonts, &mut current_blob, &mut doc),
            Section::Graphics => handle_blob_line(trimmed, "filename:", Section::Graphics, &mut current_blob, &mut doc),
            Section::None => {}
        }
    }
    flush_blob(&mut current_blob, &mut doc);

    if !any_section_seen {
        return Err(SubxError::invalid_format("ASS", "no recognizable [Section] header found"));
    }
    if !options.preserve_order {
        doc.sort_by_start();
    }
    Ok((doc, errors))
}

fn flush_blob(current: &mut Option<(Section, EmbeddedBlob)>, doc: &mut SubtitleDocument) {
    if let Some((section, blob)) = current.take() {
        match section {
            Section::Fonts => doc.fonts.push(blob),
            Section::Graphics => doc.graphics.push(blob),
            _ => {}
        }
    }
}

fn handle_blob_line(
    trimmed: &str,
    header_prefix: &str,
    section: Section,
    current: &mut Option<(Section, EmbeddedBlob)>,
    doc: &mut SubtitleDocument,
) {
    if let Some(name) = trimmed_ci_strip_prefix(trimmed, header_prefix) {
        flush_blob(current, doc);
        *current = Some((section, EmbeddedBlob { name: name.trim().to_string(), data: String::new() }));
    } else if let Some((_, blob)) = current {
        blob.data.push_str(trimmed);
    }
}

fn trimmed_ci_strip_prefix<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

fn default_style_format() -> Vec<String> {
    [
        "name", "fontname", "fontsize", "primarycolour", "secondarycolour", "outlinecolour",
        "backcolour", "bold", "italic", "underline", "strikeout", "scalex", "scaley", "spacing",
        "angle", "borderstyle", "outline", "shadow", "alignment", "marginl", "marginr", "marginv",
        "encoding",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn parse_format_line(fields: &str) -> Vec<String> {
    fields.split(',').map(|f| f.trim().to_ascii_lowercase()).collect()
}

fn parse_script_info_line(line: &str, info: &mut ScriptInfo) {
    let Some((key, value)) = line.split_once(':') else { return };
    let key = key.trim().to_ascii_lowercase();
    let value = value.trim();
    match key.as_str() {
        "title" => info.title = value.to_string(),
        "original author" | "original script" => info.author = value.to_string(),
        "playresx" => info.play_res_x = value.parse().unwrap_or(1920),
        "playresy" => info.play_res_y = value.parse().unwrap_or(1080),
        "scaledborderandshadow" => info.scale_border_and_shadow = value.eq_ignore_ascii_case("yes"),
        "wrapstyle" => {
            if let Ok(n) = value.parse::<u8>() {
                if n <= 3 {
                    info.wrap_style = WrapStyle::from_u8(n);
                }
            }
        }
        _ => {}
    }
}

/// Split into at most `max_fields` comma-separated fields, the last
/// field receiving any remaining trailing commas (§4.F general path).
fn split_fields(body: &str, max_fields: usize) -> Vec<String> {
    if max_fields == 0 {
        return Vec::new();
    }
    let mut parts: Vec<String> = Vec::with_capacity(max_fields);
    let mut rest = body;
    for _ in 0..max_fields.saturating_sub(1) {
        match rest.split_once(',') {
            Some((head, tail)) => {
                parts.push(head.to_string());
                rest = tail;
            }
            None => break,
        }
    }
    parts.push(rest.to_string());
    while parts.len() < max_fields {
        parts.push(String::new());
    }
    parts
}

fn parse_style_line(body: &str, format: &[String]) -> Option<Style> {
    let fields = split_fields(body, format.len());
    let mut style = Style::default();
    for (name, value) in format.iter().zip(fields.iter()) {
        let value = value.trim();
        match name.as_str() {
            "name" => style.name = value.to_string(),
            "fontname" => style.font_name = value.to_string(),
            "fontsize" => style.font_size = value.parse().unwrap_or(style.font_size),
            "primarycolour" | "primarycolor" => {
                if let Ok(c) = Color::parse_ass(value) {
                    style.primary_color = c;
                    style.primary_alpha = c.a();
                }
            }
            "secondarycolour" | "secondarycolor" => {
                if let Ok(c) = Color::parse_ass(value) {
                    style.secondary_color = c;
                    style.secondary_alpha = c.a();
                }
            }
            "outlinecolour" | "outlinecolor" => {
                if let Ok(c) = Color::parse_ass(value) {
                    style.outline_color = c;
                    style.outline_alpha = c.a();
                }
            }
            "backcolour" | "backcolor" => {
                if let Ok(c) = Color::parse_ass(value) {
                    style.back_color = c;
                    style.back_alpha = c.a();
                }
            }
            "bold" => style.bold = value == "-1" || value == "1",
            "italic" => style.italic = value == "-1" || value == "1",
            "underline" => style.underline = value == "-1" || value == "1",
            "strikeout" => style.strikeout = value == "-1" || value == "1",
            "scalex" => style.scale_x = value.parse().unwrap_or(style.scale_x),
            "scaley" => style.scale_y = value.parse().unwrap_or(style.scale_y),
            "spacing" => style.spacing = value.parse().unwrap_or(style.spacing),
            "angle" => style.angle = value.parse().unwrap_or(style.angle),
            "borderstyle" => style.border_style = if value.trim() == "3" { 3 } else { 1 },
            "outline" => style.outline = value.parse().unwrap_or(style.outline),
            "shadow" => style.shadow = value.parse().unwrap_or(style.shadow),
            "alignment" => style.alignment = value.parse().unwrap_or(style.alignment),
            "marginl" => style.margin_l = value.parse().unwrap_or(style.margin_l),
            "marginr" => style.margin_r = value.parse().unwrap_or(style.margin_r),
            "marginv" => style.margin_v = value.parse().unwrap_or(style.margin_v),
            "encoding" => style.encoding = value.parse().unwrap_or(style.encoding),
            _ => {}
        }
    }
    Some(style)
}

fn parse_event_line(
    body: &str,
    format: &[String],
    lineno: usize,
) -> Result<crate::model::document::SubtitleEvent, SubxError> {
    let is_canonical = format.len() == CANONICAL_EVENT_FIELDS.len()
        && format.iter().zip(CANONICAL_EVENT_FIELDS).all(|(a, b)| a == b);

    let fields = if is_canonical {
        split_fields(body, 10)
    } else {
        split_fields(body, format.len())
    };

    let mut layer = 0i32;
    let mut start = Time::ZERO;
    let mut end = Time::ZERO;
    let mut style = String::new();
    let mut name = String::new();
    let mut margin_l = 0i32;
    let mut margin_r = 0i32;
    let mut margin_v = 0i32;
    let mut effect = String::new();
    let mut text = String::new();

    let format = if is_canonical {
        CANONICAL_EVENT_FIELDS.iter().map(|s| s.to_string()).collect::<Vec<_>>()
    } else {
        format.to_vec()
    };

    for (key, value) in format.iter().zip(fields.iter()) {
        match key.as_str() {
            "layer" => layer = value.trim().parse().unwrap_or(0),
            "start" => start = Time::parse_ass(value.trim()).map_err(|e| with_line(e, lineno))?,
            "end" => end = Time::parse_ass(value.trim()).map_err(|e| with_line(e, lineno))?,
            "style" => style = value.trim().to_string(),
            "name" | "actor" => name = value.trim().to_string(),
            "marginl" => margin_l = value.trim().parse().unwrap_or(0),
            "marginr" => margin_r = value.trim().parse().unwrap_or(0),
            "marginv" => margin_v = value.trim().parse().unwrap_or(0),
            "effect" => effect = value.trim().to_string(),
            "text" => text = value.clone(),
            _ => {}
        }
    }

    if start > end {
        return Err(SubxError::invalid_timestamp_at(
            lineno,
            format!("event start {start} is after end {end}"),
        ));
    }

    Ok(crate::model::document::SubtitleEvent {
        id: crate::model::document::IdCounter::generate_id(),
        start,
        end,
        layer,
        style,
        actor: name,
        margin_l,
        margin_r,
        margin_v,
        effect,
        text,
        segments: Vec::new(),
        dirty: false,
    })
}

fn with_line(err: SubxError, lineno: usize) -> SubxError {
    match err {
        SubxError::InvalidTimestamp { message, .. } => SubxError::invalid_timestamp_at(lineno, message),
        other => other,
    }
}

/// Serialize a document to ASS/SSA text.
pub fn serialize(doc: &SubtitleDocument) -> Result<String, SubxError> {
    let mut out = String::new();
    out.push_str("[Script Info]\n");
    if !doc.info.title.is_empty() {
        out.push_str(&format!("Title: {}\n", doc.info.title));
    }
    if !doc.info.author.is_empty() {
        out.push_str(&format!("Original Script: {}\n", doc.info.author));
    }
    out.push_str(&format!("PlayResX: {}\n", doc.info.play_res_x));
    out.push_str(&format!("PlayResY: {}\n", doc.info.play_res_y));
    out.push_str(&format!(
        "ScaledBorderAndShadow: {}\n",
        if doc.info.scale_border_and_shadow { "yes" } else { "no" }
    ));
    out.push_str(&format!("WrapStyle: {}\n\n", doc.info.wrap_style as u8));

    out.push_str("[V4+ Styles]\n");
    out.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    for style in doc.styles.iter() {
        out.push_str(&format!(
            "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            style.name,
            style.font_name,
            style.font_size,
            style.primary_color.with_alpha(style.primary_alpha).format_ass(),
            style.secondary_color.with_alpha(style.secondary_alpha).format_ass(),
            style.outline_color.with_alpha(style.outline_alpha).format_ass(),
            style.back_color.with_alpha(style.back_alpha).format_ass(),
            bool_flag(style.bold),
            bool_flag(style.italic),
            bool_flag(style.underline),
            bool_flag(style.strikeout),
            style.scale_x,
            style.scale_y,
            style.spacing,
            style.angle,
            style.border_style,
            style.outline,
            style.shadow,
            style.alignment,
            style.margin_l,
            style.margin_r,
            style.margin_v,
            style.encoding,
        ));
    }
    out.push('\n');

    out.push_str("[Events]\n");
    out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
    let mut event_cursor = 0usize;
    let mut comment_cursor = 0usize;
    loop {
        while comment_cursor < doc.comments.len()
            && doc.comments[comment_cursor].before_event_index == event_cursor
        {
            out.push_str(&format!("Comment: {}\n", doc.comments[comment_cursor].text));
            comment_cursor += 1;
        }
        if event_cursor >= doc.events.len() {
            break;
        }
        let event = &doc.events[event_cursor];
        let text = event.effective_text();
        out.push_str(&format!(
            "Dialogue: {},{},{},{},{},{},{},{},{},{}\n",
            event.layer,
            event.start.format_ass(),
            event.end.format_ass(),
            event.style,
            event.actor,
            event.margin_l,
            event.margin_r,
            event.margin_v,
            event.effect,
            text,
        ));
        event_cursor += 1;
    }
    Ok(out)
}

fn bool_flag(b: bool) -> i32 {
    if b {
        -1
    } else {
        0
    }
}

/// [`SubtitleFormat`] adapter for ASS/SSA.
pub struct AssFormat;

impl SubtitleFormat for AssFormat {
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
        serialize(document)
    }

    fn detect(&self, content: &str) -> bool {
        content.contains("[Script Info]") || content.contains("Dialogue:")
    }

    fn format_name(&self) -> &'static str {
        "ASS"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["ass", "ssa"]
    }

    fn supports_styling(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "[Script Info]\nTitle: Test\nPlayResX: 1920\nPlayResY: 1080\n\n[V4+ Styles]\nFormat: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\nStyle: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1\n\n[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\nDialogue: 0,0:00:01.00,0:00:05.00,Default,,0,0,0,,Hello world\n";

    #[test]
    fn minimal_script_parses_info_styles_and_events() {
        let doc = parse(MINIMAL).unwrap();
        assert_eq!(doc.info.title, "Test");
        assert_eq!(doc.info.play_res_x, 1920);
        assert_eq!(doc.styles.get("Default").unwrap().font_size, 48.0);
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events[0].start.as_millis(), 1000);
        assert_eq!(doc.events[0].end.as_millis(), 5000);
        assert_eq!(doc.events[0].text, "Hello world");
        assert_eq!(doc.events[0].style, "Default");
    }

    #[test]
    fn text_with_commas_keeps_full_remainder_via_fast_path() {
        let body = "0,0:00:01.00,0:00:05.00,Default,,0,0,0,,Hello, world, how are you?";
        let fields: Vec<String> = CANONICAL_EVENT_FIELDS.iter().map(|s| s.to_string()).collect();
        let event = parse_event_line(body, &fields, 1).unwrap();
        assert_eq!(event.text, "Hello, world, how are you?");
    }

    #[test]
    fn detect_recognizes_script_info_or_dialogue() {
        let fmt = AssFormat;
        assert!(fmt.detect("[Script Info]\n"));
        assert!(fmt.detect("Dialogue: 0,0:00:01.00,0:00:02.00,,,0,0,0,,hi\n"));
        assert!(!fmt.detect("1\n00:00:01,000 --> 00:00:02,000\nhi\n"));
    }

    #[test]
    fn roundtrip_preserves_event_timing_and_text() {
        let doc = parse(MINIMAL).unwrap();
        let text = serialize(&doc).unwrap();
        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed.events.len(), doc.events.len());
        assert_eq!(reparsed.events[0].start, doc.events[0].start);
        assert_eq!(reparsed.events[0].text, doc.events[0].text);
    }

    #[test]
    fn parse_leaves_segments_empty_and_text_verbatim_until_caller_opts_in() {
        let input = format!(
            "{MINIMAL}Dialogue: 0,0:00:06.00,0:00:08.00,Default,,0,0,0,,{{\\b1}}bold{{\\b0}} plain\n"
        );
        let doc = parse(&input).unwrap();
        let event = &doc.events[1];
        assert!(event.segments.is_empty());
        assert!(!event.dirty);
        assert_eq!(event.text, "{\\b1}bold{\\b0} plain");

        // Without opting in, the literal override-tag text round-trips
        // byte for byte.
        let reserialized = serialize(&doc).unwrap();
        let reparsed = parse(&reserialized).unwrap();
        assert_eq!(reparsed.events[1].text, event.text);
    }

    #[test]
    fn caller_can_opt_into_the_tag_engine_and_mark_segments_dirty() {
        let input = format!(
            "{MINIMAL}Dialogue: 0,0:00:06.00,0:00:08.00,Default,,0,0,0,,{{\\b1}}bold{{\\b0}} plain\n"
        );
        let mut doc = parse(&input).unwrap();
        let segments = tags::parse_tags(&doc.events[1].text);
        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[0].style.as_ref().unwrap().bold,
            Some(crate::model::document::BoldValue::On)
        );
        doc.events[1].segments = segments;
        doc.events[1].dirty = true;

        assert_eq!(doc.events[1].effective_text(), "bold plain");
    }

    #[test]
    fn empty_override_block_round_trips_when_not_opted_in() {
        // A provable text-preservation check: `{}` carries no tags but
        // must still survive verbatim since segments were never touched.
        let input = format!("{MINIMAL}Dialogue: 0,0:00:06.00,0:00:08.00,Default,,0,0,0,,{{}}plain\n");
        let doc = parse(&input).unwrap();
        assert_eq!(doc.events[1].text, "{}plain");
        let reparsed = parse(&serialize(&doc).unwrap()).unwrap();
        assert_eq!(reparsed.events[1].text, "{}plain");
    }

    #[test]
    fn comment_line_records_before_event_index() {
        let input = format!("{MINIMAL}Comment: a note\n");
        let doc = parse(&input).unwrap();
        assert_eq!(doc.comments.len(), 1);
        assert_eq!(doc.comments[0].before_event_index, 1);
    }

    #[test]
    fn collect_mode_records_one_parse_error_per_bad_dialogue_line_and_keeps_the_rest() {
        let input = format!(
            "{MINIMAL}Dialogue: 0,bogus,0:00:09.00,Default,,0,0,0,,unparsable start\n"
        );
        let outcome = AssFormat.parse_with_options(&input, ParseOptions::default());
        assert!(outcome.ok);
        assert_eq!(outcome.document.events.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
    }

    #[test]
    fn strict_mode_aborts_on_the_first_bad_dialogue_line() {
        let input = format!(
            "{MINIMAL}Dialogue: 0,bogus,0:00:09.00,Default,,0,0,0,,unparsable start\n"
        );
        let outcome = AssFormat.parse_with_options(&input, ParseOptions { strict: true, ..ParseOptions::default() });
        assert!(!outcome.ok);
        assert_eq!(outcome.document.events.len(), 0);
    }
}
