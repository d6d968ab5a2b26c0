//! The ASS override-tag engine (component D): lexing `{...}` blocks,
//! dispatching tag handlers, and serializing the result back.
//!
//! This is the largest single piece of the codec core. The lexer is a
//! two-state machine (`OUTSIDE_BRACE`/`INSIDE_BRACE`); the dispatcher is
//! a fixed ordered table of prefix matchers rather than compiled regex
//! per tag, since the tag vocabulary is small and fixed.

use crate::model::color::Color;
use crate::model::document::{BoldValue, Effect, InlineStyle, KaraokeMode, TextSegment};

/// Parse dialogue text containing `{...}` override blocks into segments.
pub fn parse_tags(text: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut style_acc = InlineStyle::default();
    let mut effects_acc: Vec<Effect> = Vec::new();
    let mut last_style_was_some = false;
    let mut pending = String::new();

    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' => {
                if let Some(end) = find_closing_brace(&chars, i + 1) {
                    flush_segment(
                        &mut segments,
                        &mut pending,
                        &style_acc,
                        last_style_was_some,
                        &effects_acc,
                    );
                    let mut has_style_changes = last_style_was_some;
                    let block: String = chars[i + 1..end].iter().collect();
                    dispatch_block(&block, &mut style_acc, &mut has_style_changes, &mut effects_acc);
                    last_style_was_some = has_style_changes;
                    i = end + 1;
                } else {
                    // Unmatched '{': the rest is literal text.
                    pending.push('{');
                    i += 1;
                }
            }
            '\\' if i + 1 < chars.len() && matches!(chars[i + 1], 'N' | 'n') => {
                pending.push('\u{000A}');
                i += 2;
            }
            '\\' if i + 1 < chars.len() && chars[i + 1] == 'h' => {
                pending.push('\u{00A0}');
                i += 2;
            }
            c => {
                pending.push(c);
                i += 1;
            }
        }
    }
    flush_segment(
        &mut segments,
        &mut pending,
        &style_acc,
        last_style_was_some,
        &effects_acc,
    );
    segments
}

fn flush_segment(
    segments: &mut Vec<TextSegment>,
    pending: &mut String,
    style_acc: &InlineStyle,
    has_style_changes: bool,
    effects_acc: &[Effect],
) {
    if pending.is_empty() {
        return;
    }
    let style = if has_style_changes {
        Some(style_acc.clone())
    } else {
        None
    };
    segments.push(TextSegment {
        text: std::mem::take(pending),
        style,
        effects: effects_acc.to_vec(),
    });
}

fn find_closing_brace(chars: &[char], from: usize) -> Option<usize> {
    chars[from..].iter().position(|&c| c == '}').map(|p| from + p)
}

fn dispatch_block(
    block: &str,
    style: &mut InlineStyle,
    has_style_changes: &mut bool,
    effects: &mut Vec<Effect>,
) {
    for fragment in block.split('\\') {
        if fragment.is_empty() {
            continue;
        }
        dispatch_fragment(fragment, style, has_style_changes, effects);
    }
}

fn dispatch_fragment(
    frag: &str,
    style: &mut InlineStyle,
    changed: &mut bool,
    effects: &mut Vec<Effect>,
) {
    if let Some(rest) = frag.strip_prefix('b') {
        if let Ok(n) = rest.trim().parse::<i64>() {
            style.bold = Some(match n {
                0 => BoldValue::Off,
                1 => BoldValue::On,
                w => BoldValue::Weight(w.clamp(100, 900) as u16),
            });
            *changed = true;
            return;
        }
    }
    if frag.len() >= 2 {
        let (head, tail) = frag.split_at(1);
        if matches!(head, "i" | "u" | "s") && (tail == "0" || tail == "1") {
            let on = tail == "1";
            match head {
                "i" => style.italic = Some(on),
                "u" => style.underline = Some(on),
                "s" => style.strikeout = Some(on),
                _ => unreachable!(),
            }
            *changed = true;
            return;
        }
    }
    if let Some(name) = frag.strip_prefix("fn") {
        style.font_name = Some(name.to_string());
        *changed = true;
        return;
    }
    if let Some(n) = frag.strip_prefix("fs").and_then(parse_f64) {
        style.font_size = Some(n);
        *changed = true;
        return;
    }
    if let Some(n) = frag.strip_prefix("an").and_then(|s| s.parse::<u8>().ok()) {
        if (1..=9).contains(&n) {
            style.alignment = Some(n);
            *changed = true;
            return;
        }
    }
    if let Some(n) = frag.strip_prefix("fe").and_then(|s| s.parse::<i32>().ok()) {
        style.font_encoding = Some(n);
        *changed = true;
        return;
    }
    if let Some(n) = frag.strip_prefix('q').and_then(|s| s.parse::<u8>().ok()) {
        if n <= 3 {
            style.wrap_style = Some(crate::model::document::WrapStyle::from_u8(n));
            *changed = true;
            return;
        }
    }
    if let Some(args) = strip_call(frag, "iclip") {
        effect_replace(effects, "clip", Effect::Clip { path: args.to_string(), inverse: true });
        return;
    }
    if let Some(args) = strip_call(frag, "clip") {
        effect_replace(effects, "clip", Effect::Clip { path: args.to_string(), inverse: false });
        return;
    }
    if let Some(hex) = frag.strip_prefix("1c").or_else(|| frag.strip_prefix('c')) {
        if let Ok(c) = Color::parse_ass(hex) {
            style.primary_color = Some(c);
            *changed = true;
        }
        return;
    }
    if let Some(hex) = frag.strip_prefix("2c") {
        if let Ok(c) = Color::parse_ass(hex) {
            style.secondary_color = Some(c);
            *changed = true;
        }
        return;
    }
    if let Some(hex) = frag.strip_prefix("3c") {
        if let Ok(c) = Color::parse_ass(hex) {
            style.outline_color = Some(c);
            *changed = true;
        }
        return;
    }
    if let Some(hex) = frag.strip_prefix("4c") {
        if let Ok(c) = Color::parse_ass(hex) {
            style.back_color = Some(c);
            *changed = true;
        }
        return;
    }
    if let Some(hex) = frag.strip_prefix("alpha") {
        if let Ok(a) = Color::parse_ass_alpha(hex) {
            style.alpha = Some(a);
            *changed = true;
        }
        return;
    }
    if let Some(hex) = frag.strip_prefix("1a") {
        if let Ok(a) = Color::parse_ass_alpha(hex) {
            style.primary_alpha = Some(a);
            *changed = true;
        }
        return;
    }
    if let Some(hex) = frag.strip_prefix("2a") {
        if let Ok(a) = Color::parse_ass_alpha(hex) {
            style.secondary_alpha = Some(a);
            *changed = true;
        }
        return;
    }
    if let Some(hex) = frag.strip_prefix("3a") {
        if let Ok(a) = Color::parse_ass_alpha(hex) {
            style.outline_alpha = Some(a);
            *changed = true;
        }
        return;
    }
    if let Some(hex) = frag.strip_prefix("4a") {
        if let Ok(a) = Color::parse_ass_alpha(hex) {
            style.back_alpha = Some(a);
            *changed = true;
        }
        return;
    }
    if let Some(args) = strip_call(frag, "pos") {
        if let Some((x, y)) = parse_pair(args) {
            style.pos = Some((x, y));
            *changed = true;
        }
        return;
    }
    if let Some(args) = strip_call(frag, "org") {
        if let Some((x, y)) = parse_pair(args) {
            effect_replace(effects, "origin", Effect::Origin { x, y });
        }
        return;
    }
    if let Some(n) = frag.strip_prefix("kf").and_then(parse_f64) {
        effect_replace(
            effects,
            "karaoke",
            Effect::Karaoke { duration_ms: (n * 10.0) as u32, mode: KaraokeMode::Fade },
        );
        return;
    }
    if let Some(n) = frag.strip_prefix("ko").and_then(parse_f64) {
        effect_replace(
            effects,
            "karaoke",
            Effect::Karaoke { duration_ms: (n * 10.0) as u32, mode: KaraokeMode::Outline },
        );
        return;
    }
    if let Some(n) = frag.strip_prefix("kt").and_then(parse_f64) {
        effect_replace(effects, "karaokeAbsolute", Effect::KaraokeAbsolute { time_ms: (n * 10.0) as u32 });
        return;
    }
    if let Some(n) = frag.strip_prefix('K').and_then(parse_f64) {
        effect_replace(
            effects,
            "karaoke",
            Effect::Karaoke { duration_ms: (n * 10.0) as u32, mode: KaraokeMode::Fade },
        );
        return;
    }
    if let Some(n) = frag.strip_prefix('k').and_then(parse_f64) {
        effect_replace(
            effects,
            "karaoke",
            Effect::Karaoke { duration_ms: (n * 10.0) as u32, mode: KaraokeMode::Fill },
        );
        return;
    }
    if let Some(n) = frag.strip_prefix("blur").and_then(parse_f64) {
        effect_replace(effects, "blur", Effect::Blur { strength: n });
        return;
    }
    if let Some(n) = frag.strip_prefix("be").and_then(parse_f64) {
        effect_replace(effects, "blur", Effect::Blur { strength: n });
        return;
    }
    if let Some(n) = frag.strip_prefix("xbord").and_then(parse_f64) {
        augment_border(effects, |b| b.1 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("ybord").and_then(parse_f64) {
        augment_border(effects, |b| b.2 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("bord").and_then(parse_f64) {
        effect_replace(effects, "border", Effect::Border { size: n, x: None, y: None });
        return;
    }
    if let Some(n) = frag.strip_prefix("xshad").and_then(parse_f64) {
        augment_shadow(effects, |s| s.1 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("yshad").and_then(parse_f64) {
        augment_shadow(effects, |s| s.2 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("shad").and_then(parse_f64) {
        effect_replace(effects, "shadow", Effect::Shadow { depth: n, x: None, y: None });
        return;
    }
    if let Some(n) = frag.strip_prefix("fscx").and_then(parse_f64) {
        augment_scale(effects, |s| s.0 = n);
        return;
    }
    if let Some(n) = frag.strip_prefix("fscy").and_then(parse_f64) {
        augment_scale(effects, |s| s.1 = n);
        return;
    }
    if let Some(n) = frag.strip_prefix("frx").and_then(parse_f64) {
        augment_rotate(effects, |r| r.0 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("fry").and_then(parse_f64) {
        augment_rotate(effects, |r| r.1 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("frz").and_then(parse_f64) {
        augment_rotate(effects, |r| r.2 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("fr").and_then(parse_f64) {
        augment_rotate(effects, |r| r.2 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("fax").and_then(parse_f64) {
        augment_shear(effects, |s| s.0 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("fay").and_then(parse_f64) {
        augment_shear(effects, |s| s.1 = Some(n));
        return;
    }
    if let Some(n) = frag.strip_prefix("fsp").and_then(parse_f64) {
        effect_replace(effects, "spacing", Effect::Spacing { value: n });
        return;
    }
    if let Some(args) = strip_call(frag, "fade") {
        let parts = split_top_level_commas(args);
        if parts.len() == 7 {
            if let (Some(a1), Some(a2), Some(a3), Some(t1), Some(t2), Some(t3), Some(t4)) = (
                parts[0].trim().parse::<u8>().ok(),
                parts[1].trim().parse::<u8>().ok(),
                parts[2].trim().parse::<u8>().ok(),
                parts[3].trim().parse::<u32>().ok(),
                parts[4].trim().parse::<u32>().ok(),
                parts[5].trim().parse::<u32>().ok(),
                parts[6].trim().parse::<u32>().ok(),
            ) {
                effect_replace(
                    effects,
                    "fadeComplex",
                    Effect::FadeComplex { alphas: [a1, a2, a3], times: [t1, t2, t3, t4] },
                );
            }
        }
        return;
    }
    if let Some(args) = strip_call(frag, "fad") {
        let parts = split_top_level_commas(args);
        if parts.len() == 2 {
            if let (Some(fi), Some(fo)) = (
                parts[0].trim().parse::<u32>().ok(),
                parts[1].trim().parse::<u32>().ok(),
            ) {
                effect_replace(effects, "fade", Effect::Fade { fade_in: fi, fade_out: fo });
            }
        }
        return;
    }
    if let Some(args) = strip_call(frag, "move") {
        let parts = split_top_level_commas(args);
        if parts.len() == 4 || parts.len() == 6 {
            let nums: Option<Vec<f64>> = parts.iter().take(4).map(|p| p.trim().parse::<f64>().ok()).collect();
            if let Some(nums) = nums {
                let (t1, t2) = if parts.len() == 6 {
                    (
                        parts[4].trim().parse::<u32>().ok(),
                        parts[5].trim().parse::<u32>().ok(),
                    )
                } else {
                    (None, None)
                };
                effect_replace(
                    effects,
                    "move",
                    Effect::Move { from: (nums[0], nums[1]), to: (nums[2], nums[3]), t1, t2 },
                );
            }
        }
        return;
    }
    if let Some(n) = frag.strip_prefix("pbo").and_then(parse_f64) {
        effect_replace(effects, "drawingBaseline", Effect::DrawingBaseline { offset: n });
        return;
    }
    if let Some(n) = frag.strip_prefix('p').and_then(|s| s.trim().parse::<u32>().ok()) {
        if n > 0 {
            effect_replace(effects, "drawing", Effect::Drawing { scale: n, commands: String::new() });
        }
        return;
    }
    if frag == "r" {
        effect_replace(effects, "reset", Effect::Reset { style: None });
        *style = InlineStyle::default();
        *changed = false;
        return;
    }
    if let Some(name) = frag.strip_prefix('r') {
        if !name.is_empty() {
            effect_replace(effects, "reset", Effect::Reset { style: Some(name.to_string()) });
            *style = InlineStyle::default();
            *changed = false;
            return;
        }
    }
    if let Some(args) = strip_call(frag, "t") {
        effects.push(parse_animate(args));
        return;
    }
    // Legacy SSA alignment, checked last so `an[1-9]` always wins first.
    if let Some(n) = frag.strip_prefix('a').and_then(|s| s.parse::<i32>().ok()) {
        let mapped = match n {
            1..=3 => Some(n as u8),
            5..=7 => Some((n + 2) as u8),
            9..=11 => Some((n - 5) as u8),
            _ => None,
        };
        if let Some(a) = mapped {
            style.alignment = Some(a);
            *changed = true;
        }
        return;
    }
    effects.push(Effect::Unknown { format: "ASS".to_string(), raw: format!("\\{frag}") });
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn strip_call<'a>(frag: &'a str, name: &str) -> Option<&'a str> {
    let rest = frag.strip_prefix(name)?;
    let inner = rest.strip_prefix('(')?;
    inner.strip_suffix(')')
}

fn parse_pair(args: &str) -> Option<(f64, f64)> {
    let parts = split_top_level_commas(args);
    if parts.len() != 2 {
        return None;
    }
    Some((parts[0].trim().parse().ok()?, parts[1].trim().parse().ok()?))
}

fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_animate(args: &str) -> Effect {
    let parts = split_top_level_commas(args);
    let mut nums = Vec::new();
    let mut target_start = 0;
    for p in &parts {
        if p.trim().parse::<f64>().is_ok() && nums.len() < 3 {
            nums.push(p.trim().parse::<f64>().unwrap());
            target_start += 1;
        } else {
            break;
        }
    }
    let target = parts[target_start..].join(",");
    let (start, end, accel) = match nums.len() {
        3 => (Some(nums[0] as u32), Some(nums[1] as u32), Some(nums[2])),
        2 => (Some(nums[0] as u32), Some(nums[1] as u32), None),
        1 => (None, None, Some(nums[0])),
        _ => (None, None, None),
    };
    Effect::Animate { start, end, accel, target }
}

fn effect_replace(effects: &mut Vec<Effect>, kind: &str, new: Effect) {
    effects.retain(|e| e.kind() != kind);
    effects.push(new);
}

fn augment_border(effects: &mut Vec<Effect>, f: impl FnOnce(&mut (f64, Option<f64>, Option<f64>))) {
    let mut tuple = find_border(effects).unwrap_or((0.0, None, None));
    f(&mut tuple);
    effect_replace(effects, "border", Effect::Border { size: tuple.0, x: tuple.1, y: tuple.2 });
}

fn find_border(effects: &[Effect]) -> Option<(f64, Option<f64>, Option<f64>)> {
    effects.iter().find_map(|e| match e {
        Effect::Border { size, x, y } => Some((*size, *x, *y)),
        _ => None,
    })
}

fn augment_shadow(effects: &mut Vec<Effect>, f: impl FnOnce(&mut (f64, Option<f64>, Option<f64>))) {
    let mut tuple = effects
        .iter()
        .find_map(|e| match e {
            Effect::Shadow { depth, x, y } => Some((*depth, *x, *y)),
            _ => None,
        })
        .unwrap_or((0.0, None, None));
    f(&mut tuple);
    effect_replace(effects, "shadow", Effect::Shadow { depth: tuple.0, x: tuple.1, y: tuple.2 });
}

fn augment_scale(effects: &mut Vec<Effect>, f: impl FnOnce(&mut (f64, f64))) {
    let mut tuple = effects
        .iter()
        .find_map(|e| match e {
            Effect::Scale { x, y } => Some((*x, *y)),
            _ => None,
        })
        .unwrap_or((100.0, 100.0));
    f(&mut tuple);
    effect_replace(effects, "scale", Effect::Scale { x: tuple.0, y: tuple.1 });
}

fn augment_rotate(
    effects: &mut Vec<Effect>,
    f: impl FnOnce(&mut (Option<f64>, Option<f64>, Option<f64>)),
) {
    let mut tuple = effects
        .iter()
        .find_map(|e| match e {
            Effect::Rotate { x, y, z } => Some((*x, *y, *z)),
            _ => None,
        })
        .unwrap_or((None, None, None));
    f(&mut tuple);
    effect_replace(effects, "rotate", Effect::Rotate { x: tuple.0, y: tuple.1, z: tuple.2 });
}

fn augment_shear(effects: &mut Vec<Effect>, f: impl FnOnce(&mut (Option<f64>, Option<f64>))) {
    let mut tuple = effects
        .iter()
        .find_map(|e| match e {
            Effect::Shear { x, y } => Some((*x, *y)),
            _ => None,
        })
        .unwrap_or((None, None));
    f(&mut tuple);
    effect_replace(effects, "shear", Effect::Shear { x: tuple.0, y: tuple.1 });
}

/// Serialize parsed segments back into ASS dialogue text with `{...}`
/// override blocks, emitting a tag only where the attribute changed
/// from the previous segment or the segment carries an effect.
pub fn serialize_tags(segments: &[TextSegment]) -> String {
    let mut out = String::new();
    let mut prev_style = InlineStyle::default();
    for segment in segments {
        let style = segment.style.clone().unwrap_or_default();
        let mut block = String::new();
        push_style_diff(&mut block, &prev_style, &style);
        for effect in &segment.effects {
            push_effect(&mut block, effect);
        }
        if !block.is_empty() {
            out.push('{');
            out.push_str(&block);
            out.push('}');
        }
        out.push_str(&apply_escapes(&segment.text));
        prev_style = style;
    }
    out
}

fn apply_escapes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{000A}' => "\\N".to_string(),
            '\u{00A0}' => "\\h".to_string(),
            c => c.to_string(),
        })
        .collect()
}

fn push_style_diff(block: &mut String, prev: &InlineStyle, cur: &InlineStyle) {
    if cur.bold.is_some() && cur.bold != prev.bold {
        match cur.bold.unwrap() {
            BoldValue::Off => block.push_str("\\b0"),
            BoldValue::On => block.push_str("\\b1"),
            BoldValue::Weight(w) => block.push_str(&format!("\\b{w}")),
        }
    }
    if cur.italic.is_some() && cur.italic != prev.italic {
        block.push_str(&format!("\\i{}", cur.italic.unwrap() as u8));
    }
    if cur.underline.is_some() && cur.underline != prev.underline {
        block.push_str(&format!("\\u{}", cur.underline.unwrap() as u8));
    }
    if cur.strikeout.is_some() && cur.strikeout != prev.strikeout {
        block.push_str(&format!("\\s{}", cur.strikeout.unwrap() as u8));
    }
    if cur.font_name.is_some() && cur.font_name != prev.font_name {
        block.push_str(&format!("\\fn{}", cur.font_name.as_deref().unwrap()));
    }
    if cur.font_size.is_some() && cur.font_size != prev.font_size {
        block.push_str(&format!("\\fs{}", cur.font_size.unwrap()));
    }
    if cur.alignment.is_some() && cur.alignment != prev.alignment {
        block.push_str(&format!("\\an{}", cur.alignment.unwrap()));
    }
    if cur.font_encoding.is_some() && cur.font_encoding != prev.font_encoding {
        block.push_str(&format!("\\fe{}", cur.font_encoding.unwrap()));
    }
    if cur.wrap_style.is_some() && cur.wrap_style.map(|w| w as u8) != prev.wrap_style.map(|w| w as u8) {
        block.push_str(&format!("\\q{}", cur.wrap_style.unwrap() as u8));
    }
    if cur.primary_color.is_some() && cur.primary_color != prev.primary_color {
        block.push_str(&format!("\\c{}", cur.primary_color.unwrap().format_ass()));
    }
    if cur.secondary_color.is_some() && cur.secondary_color != prev.secondary_color {
        block.push_str(&format!("\\2c{}", cur.secondary_color.unwrap().format_ass()));
    }
    if cur.outline_color.is_some() && cur.outline_color != prev.outline_color {
        block.push_str(&format!("\\3c{}", cur.outline_color.unwrap().format_ass()));
    }
    if cur.back_color.is_some() && cur.back_color != prev.back_color {
        block.push_str(&format!("\\4c{}", cur.back_color.unwrap().format_ass()));
    }
    if cur.alpha.is_some() && cur.alpha != prev.alpha {
        block.push_str(&format!("\\alpha&H{:02X}&", cur.alpha.unwrap()));
    }
    if cur.pos.is_some() && cur.pos != prev.pos {
        let (x, y) = cur.pos.unwrap();
        block.push_str(&format!("\\pos({x},{y})"));
    }
}

fn push_effect(block: &mut String, effect: &Effect) {
    match effect {
        Effect::Karaoke { duration_ms, mode } => {
            let tag = match mode {
                KaraokeMode::Fill => "k",
                KaraokeMode::Fade => "kf",
                KaraokeMode::Outline => "ko",
            };
            block.push_str(&format!("\\{tag}{}", duration_ms / 10));
        }
        Effect::KaraokeAbsolute { time_ms } => block.push_str(&format!("\\kt{}", time_ms / 10)),
        Effect::Blur { strength } => block.push_str(&format!("\\blur{strength}")),
        Effect::Border { size, x, y } => {
            block.push_str(&format!("\\bord{size}"));
            if let Some(x) = x {
                block.push_str(&format!("\\xbord{x}"));
            }
            if let Some(y) = y {
                block.push_str(&format!("\\ybord{y}"));
            }
        }
        Effect::Shadow { depth, x, y } => {
            block.push_str(&format!("\\shad{depth}"));
            if let Some(x) = x {
                block.push_str(&format!("\\xshad{x}"));
            }
            if let Some(y) = y {
                block.push_str(&format!("\\yshad{y}"));
            }
        }
        Effect::Scale { x, y } => {
            if *x != 100.0 {
                block.push_str(&format!("\\fscx{x}"));
            }
            if *y != 100.0 {
                block.push_str(&format!("\\fscy{y}"));
            }
        }
        Effect::Rotate { x, y, z } => {
            if let Some(x) = x {
                block.push_str(&format!("\\frx{x}"));
            }
            if let Some(y) = y {
                block.push_str(&format!("\\fry{y}"));
            }
            if let Some(z) = z {
                block.push_str(&format!("\\frz{z}"));
            }
        }
        Effect::Shear { x, y } => {
            if let Some(x) = x {
                block.push_str(&format!("\\fax{x}"));
            }
            if let Some(y) = y {
                block.push_str(&format!("\\fay{y}"));
            }
        }
        Effect::Spacing { value } => block.push_str(&format!("\\fsp{value}")),
        Effect::Fade { fade_in, fade_out } => block.push_str(&format!("\\fad({fade_in},{fade_out})")),
        Effect::FadeComplex { alphas, times } => block.push_str(&format!(
            "\\fade({},{},{},{},{},{},{})",
            alphas[0], alphas[1], alphas[2], times[0], times[1], times[2], times[3]
        )),
        Effect::Move { from, to, t1, t2 } => {
            if let (Some(t1), Some(t2)) = (t1, t2) {
                block.push_str(&format!("\\move({},{},{},{},{t1},{t2})", from.0, from.1, to.0, to.1));
            } else {
                block.push_str(&format!("\\move({},{},{},{})", from.0, from.1, to.0, to.1));
            }
        }
        Effect::Clip { path, inverse } => {
            let name = if *inverse { "iclip" } else { "clip" };
            block.push_str(&format!("\\{name}({path})"));
        }
        Effect::Drawing { scale, .. } => block.push_str(&format!("\\p{scale}")),
        Effect::DrawingBaseline { offset } => block.push_str(&format!("\\pbo{offset}")),
        Effect::Origin { x, y } => block.push_str(&format!("\\org({x},{y})")),
        Effect::Reset { style } => match style {
            Some(name) => block.push_str(&format!("\\r{name}")),
            None => block.push_str("\\r"),
        },
        Effect::Animate { start, end, accel, target } => {
            let mut args = Vec::new();
            if let (Some(s), Some(e)) = (start, end) {
                args.push(s.to_string());
                args.push(e.to_string());
            }
            if let Some(a) = accel {
                args.push(a.to_string());
            }
            args.push(target.clone());
            block.push_str(&format!("\\t({})", args.join(",")));
        }
        Effect::Image { .. } | Effect::Vobsub { .. } => {
            // Not representable as an ASS override tag; these originate
            // from the VobSub pipeline, not from tag parsing.
        }
        Effect::Unknown { raw, .. } => block.push_str(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_italic_color_then_unbold() {
        let segments = parse_tags("{\\b1\\i1\\c&H0000FF&}hi{\\b0}world");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hi");
        let s0 = segments[0].style.as_ref().unwrap();
        assert_eq!(s0.bold, Some(BoldValue::On));
        assert_eq!(s0.italic, Some(true));
        assert_eq!(s0.primary_color, Some(Color::parse_ass("&H0000FF&").unwrap()));
        assert_eq!(segments[1].text, "world");
        let s1 = segments[1].style.as_ref().unwrap();
        assert_eq!(s1.bold, Some(BoldValue::Off));
        assert_eq!(s1.italic, Some(true));
    }

    #[test]
    fn karaoke_replace_keeps_last_duration() {
        let segments = parse_tags("{\\k50\\k30}x");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].effects.len(), 1);
        match &segments[0].effects[0] {
            Effect::Karaoke { duration_ms, mode } => {
                assert_eq!(*duration_ms, 300);
                assert_eq!(*mode, KaraokeMode::Fill);
            }
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn fscx_fscy_merge_into_one_scale_effect() {
        let segments = parse_tags("{\\fscx150\\fscy200}x");
        assert_eq!(segments[0].effects.len(), 1);
        assert_eq!(segments[0].effects[0], Effect::Scale { x: 150.0, y: 200.0 });
    }

    #[test]
    fn clip_and_iclip_produce_distinct_clip_effects() {
        let segments = parse_tags("{\\clip(10,10,200,200)}a{\\iclip(m 0 0 l 100 0)}b");
        assert_eq!(segments[0].effects.len(), 1);
        assert_eq!(
            segments[0].effects[0],
            Effect::Clip { path: "10,10,200,200".to_string(), inverse: false }
        );
        assert_eq!(
            segments[1].effects[0],
            Effect::Clip { path: "m 0 0 l 100 0".to_string(), inverse: true }
        );
    }

    #[test]
    fn c_prefixed_color_tag_is_unaffected_by_the_clip_reorder() {
        let segments = parse_tags("{\\c&H0000FF&}x");
        assert_eq!(
            segments[0].style.as_ref().unwrap().primary_color,
            Some(Color::parse_ass("&H0000FF&").unwrap())
        );
    }

    #[test]
    fn unmatched_brace_is_literal() {
        let segments = parse_tags("a{b");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "a{b");
    }

    #[test]
    fn escapes_convert_n_and_h() {
        let segments = parse_tags("line1\\Nline2\\hend");
        assert_eq!(segments[0].text, "line1\nline2\u{00A0}end");
    }

    #[test]
    fn reset_clears_style_but_keeps_as_effect() {
        let segments = parse_tags("{\\b1}bold{\\r}plain");
        assert!(segments[0].style.as_ref().unwrap().bold == Some(BoldValue::On));
        assert!(segments[1].style.is_none());
        assert!(segments[1].effects.iter().any(|e| e.kind() == "reset"));
    }

    #[test]
    fn unknown_tag_becomes_unknown_effect() {
        let segments = parse_tags("{\\zzz99}x");
        assert_eq!(segments[0].effects[0], Effect::Unknown {
            format: "ASS".to_string(),
            raw: "\\zzz99".to_string(),
        });
    }

    #[test]
    fn serialize_then_parse_roundtrips_bold_italic() {
        let original = parse_tags("{\\b1\\i1}hi{\\b0}world");
        let text = serialize_tags(&original);
        let reparsed = parse_tags(&text);
        assert_eq!(reparsed.len(), original.len());
        assert_eq!(reparsed[0].style, original[0].style);
        assert_eq!(reparsed[1].style, original[1].style);
    }

    #[test]
    fn legacy_alignment_a_maps_to_an_numpad() {
        let segments = parse_tags("{\\a6}x");
        assert_eq!(segments[0].style.as_ref().unwrap().alignment, Some(8));
    }
}
