//! The shared SRT/VTT HTML-like override-tag engine (component E):
//! a stack of boolean style states plus an optional SRT-only color,
//! with transparent frames for VTT's structural voice/class/lang tags.

use crate::model::color::Color;
use crate::model::document::{BoldValue, InlineStyle, TextSegment};

/// Which host format is driving the tag engine — controls the accepted
/// tag vocabulary (SRT allows `<font color>`, VTT allows voice/class/lang).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlFlavor {
    Srt,
    Vtt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TagState {
    bold: bool,
    italic: bool,
    underline: bool,
    strikeout: bool,
    color: Option<Color>,
}

fn state_to_style(state: TagState) -> Option<InlineStyle> {
    let mut style = InlineStyle::default();
    if state.bold {
        style.bold = Some(BoldValue::On);
    }
    if state.italic {
        style.italic = Some(true);
    }
    if state.underline {
        style.underline = Some(true);
    }
    if state.strikeout {
        style.strikeout = Some(true);
    }
    style.primary_color = state.color;
    if style.is_empty() {
        None
    } else {
        Some(style)
    }
}

/// Parse nested `<b>`/`<i>`/... tags into segments, honoring `flavor`'s
/// accepted tag set.
pub fn parse_html_tags(text: &str, flavor: HtmlFlavor) -> Vec<TextSegment> {
    let mut stack = vec![TagState::default()];
    let mut segments = Vec::new();
    let mut pending = String::new();

    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '<' {
            if let Some(end) = chars[i + 1..].iter().position(|&c| c == '>').map(|p| i + 1 + p) {
                let body: String = chars[i + 1..end].iter().collect();
                if is_timestamp_cue(&body) {
                    i = end + 1;
                    continue;
                }
                flush(&mut segments, &mut pending, *stack.last().unwrap());
                apply_tag(&body, flavor, &mut stack);
                i = end + 1;
                continue;
            } else {
                pending.push('<');
                i += 1;
                continue;
            }
        }
        pending.push(chars[i]);
        i += 1;
    }
    flush(&mut segments, &mut pending, *stack.last().unwrap());
    segments
}

fn flush(segments: &mut Vec<TextSegment>, pending: &mut String, state: TagState) {
    if pending.is_empty() {
        return;
    }
    segments.push(TextSegment {
        text: std::mem::take(pending),
        style: state_to_style(state),
        effects: Vec::new(),
    });
}

fn is_timestamp_cue(body: &str) -> bool {
    let digits_colons_dot = body.chars().all(|c| c.is_ascii_digit() || c == ':' || c == '.');
    digits_colons_dot && body.contains('.') && body.len() >= 9
}

fn apply_tag(body: &str, flavor: HtmlFlavor, stack: &mut Vec<TagState>) {
    if let Some(name) = body.strip_prefix('/') {
        let name = first_word(name).to_ascii_lowercase();
        if stack.len() > 1 {
            // Pop regardless of whether the closing tag name matches the
            // innermost open one; malformed nesting still nets out to a
            // single pop, which is what keeps the stack from underflowing.
            let _ = name;
            stack.pop();
        }
        return;
    }
    let mut top = *stack.last().unwrap();
    let name_raw = first_word(body);
    let name = strip_class_suffix(name_raw).to_ascii_lowercase();

    match name.as_str() {
        "b" => {
            top.bold = true;
            stack.push(top);
        }
        "i" => {
            top.italic = true;
            stack.push(top);
        }
        "u" => {
            top.underline = true;
            stack.push(top);
        }
        "s" if flavor == HtmlFlavor::Srt => {
            top.strikeout = true;
            stack.push(top);
        }
        "font" if flavor == HtmlFlavor::Srt => {
            if let Some(color) = parse_font_color(body) {
                top.color = Some(color);
            }
            stack.push(top);
        }
        "v" | "c" | "lang" if flavor == HtmlFlavor::Vtt => {
            // Structural tags: no style change, transparent frame so the
            // matching close still pops cleanly.
            stack.push(top);
        }
        _ => {
            // Unrecognized tag: push a transparent frame.
            stack.push(top);
        }
    }
}

fn first_word(s: &str) -> &str {
    s.split(|c: char| c.is_whitespace() || c == '.').next().unwrap_or(s)
}

fn strip_class_suffix(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn parse_font_color(tag_body: &str) -> Option<Color> {
    let idx = tag_body.to_ascii_lowercase().find("color")?;
    let rest = &tag_body[idx + "color".len()..];
    let eq = rest.find('=')?;
    let value = rest[eq + 1..].trim();
    let value = value.trim_matches(|c| c == '"' || c == '\'');
    let value = value.split_whitespace().next().unwrap_or(value);
    Color::parse_html(value).ok()
}

/// Serialize segments back into nested HTML-like tags.
/// Nesting order: bold outermost, then italic, underline, strikeout;
/// `<font color>` wraps everything when set.
pub fn serialize_html_tags(segments: &[TextSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let style = segment.style.clone().unwrap_or_default();
        let mut text = segment.text.clone();
        if style.strikeout == Some(true) {
            text = format!("<s>{text}</s>");
        }
        if style.underline == Some(true) {
            text = format!("<u>{text}</u>");
        }
        if style.italic == Some(true) {
            text = format!("<i>{text}</i>");
        }
        if matches!(style.bold, Some(BoldValue::On)) {
            text = format!("<b>{text}</b>");
        }
        if let Some(color) = style.primary_color {
            text = format!("<font color=\"{}\">{text}</font>", color.format_html());
        }
        out.push_str(&text);
    }
    out
}

/// Remove every `<...>` span, leaving plain text.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_bold_italic() {
        let segments = parse_html_tags("<b><i>bi</i></b>", HtmlFlavor::Srt);
        assert_eq!(segments.len(), 1);
        let style = segments[0].style.as_ref().unwrap();
        assert_eq!(style.bold, Some(BoldValue::On));
        assert_eq!(style.italic, Some(true));
        assert_eq!(style.underline, None);
    }

    #[test]
    fn srt_font_color_swaps_to_packed_bgr() {
        let segments = parse_html_tags("<font color=\"#FF0000\">red</font>", HtmlFlavor::Srt);
        let color = segments[0].style.as_ref().unwrap().primary_color.unwrap();
        assert_eq!(color.to_rgba(), (0xFF, 0x00, 0x00, 0x00));
    }

    #[test]
    fn malformed_open_without_close_is_literal() {
        let segments = parse_html_tags("a<b text", HtmlFlavor::Srt);
        assert_eq!(segments[0].text, "a<b text");
    }

    #[test]
    fn close_tag_never_underflows_stack() {
        let segments = parse_html_tags("</b></i>plain", HtmlFlavor::Srt);
        assert_eq!(segments[0].text, "plain");
        assert!(segments[0].style.is_none());
    }

    #[test]
    fn vtt_voice_tag_is_transparent() {
        let segments = parse_html_tags("<v Roger>Hello</v>", HtmlFlavor::Vtt);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Hello");
        assert!(segments[0].style.is_none());
    }

    #[test]
    fn vtt_timestamp_cue_is_invisible() {
        let segments = parse_html_tags("a<00:00:01.000>b", HtmlFlavor::Vtt);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "ab");
    }

    #[test]
    fn strip_tags_removes_all_spans() {
        assert_eq!(strip_tags("<b>bold</b> and <i>italic</i>"), "bold and italic");
    }

    #[test]
    fn roundtrip_bold_italic_through_serialize() {
        let original = parse_html_tags("<b><i>bi</i></b>", HtmlFlavor::Srt);
        let text = serialize_html_tags(&original);
        let reparsed = parse_html_tags(&text, HtmlFlavor::Srt);
        assert_eq!(reparsed[0].style, original[0].style);
    }
}
