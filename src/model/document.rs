//! The canonical subtitle document model (component C).
//!
//! Every format parser produces a `SubtitleDocument`; every serializer
//! consumes one. The model is intentionally richer than any single
//! on-the-wire format so that round-tripping through a different format
//! never silently drops information the source format didn't need.

use crate::error::SubxError;
use crate::model::color::Color;
use crate::model::time::Time;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide monotonic event id allocation (§3 Identity).
///
/// One counter per process, shared across every document — there is no
/// cross-document uniqueness guarantee beyond that.
pub struct IdCounter;

impl IdCounter {
    /// Atomically allocate and return the next id.
    pub fn generate_id() -> u64 {
        NEXT_ID.fetch_add(1, Ordering::Relaxed)
    }

    /// Atomically advance the counter by `n` and return the first id in
    /// the reserved block. Intended for callers that know an event count
    /// up front; no parser in this crate uses it to special-case a
    /// literal-template fast path.
    pub fn reserve_ids(n: u64) -> u64 {
        NEXT_ID.fetch_add(n, Ordering::Relaxed)
    }
}

/// Either a boolean bold toggle or a numeric font weight (100-900).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoldValue {
    /// `\b0`: not bold.
    Off,
    /// `\b1`: bold.
    On,
    /// `\b<weight>`: a specific font weight.
    Weight(u16),
}

/// Wrap style as declared by a style or script-info record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapStyle {
    /// Smart wrapping, wider bottom line.
    SmartWide = 0,
    /// No word wrapping.
    None = 1,
    /// Smart wrapping, wider top line.
    SmartNarrow = 2,
    /// Legacy alias of `SmartWide` used by some styles.
    SmartWideLegacy = 3,
}

impl WrapStyle {
    /// Coerce an integer into a `WrapStyle`, defaulting to `SmartWide`
    /// for anything outside `0..=3`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => WrapStyle::SmartWide,
            1 => WrapStyle::None,
            2 => WrapStyle::SmartNarrow,
            3 => WrapStyle::SmartWideLegacy,
            _ => WrapStyle::SmartWide,
        }
    }
}

/// A sparse set of optional inline style attributes (§3 InlineStyle).
///
/// Every field is `Option`; "absent" means inherit from the enclosing
/// style. A style is null (in the sense §4.D uses) iff every field here
/// is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    pub bold: Option<BoldValue>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikeout: Option<bool>,
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub font_encoding: Option<i32>,
    pub wrap_style: Option<WrapStyle>,
    pub primary_color: Option<Color>,
    pub secondary_color: Option<Color>,
    pub outline_color: Option<Color>,
    pub back_color: Option<Color>,
    pub alpha: Option<u8>,
    pub primary_alpha: Option<u8>,
    pub secondary_alpha: Option<u8>,
    pub outline_alpha: Option<u8>,
    pub back_alpha: Option<u8>,
    pub alignment: Option<u8>,
    pub pos: Option<(f64, f64)>,
}

impl InlineStyle {
    /// True iff no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == InlineStyle::default()
    }
}

/// Karaoke fill mode (§3 Effect `karaoke`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KaraokeMode {
    Fill,
    Fade,
    Outline,
}

/// Raster image payload encoding for an `image` effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Rle,
    Indexed,
}

/// A non-style behavior attached to a segment (§3 Effect).
///
/// Modeled as a tagged union (§9 design note): storage is a contiguous
/// `Vec<Effect>` per segment rather than per-field optionals, since
/// effects vary in payload shape and a segment may carry several.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Karaoke { duration_ms: u32, mode: KaraokeMode },
    KaraokeAbsolute { time_ms: u32 },
    Blur { strength: f64 },
    Border { size: f64, x: Option<f64>, y: Option<f64> },
    Shadow { depth: f64, x: Option<f64>, y: Option<f64> },
    Scale { x: f64, y: f64 },
    Rotate { x: Option<f64>, y: Option<f64>, z: Option<f64> },
    Shear { x: Option<f64>, y: Option<f64> },
    Spacing { value: f64 },
    Fade { fade_in: u32, fade_out: u32 },
    FadeComplex { alphas: [u8; 3], times: [u32; 4] },
    Move { from: (f64, f64), to: (f64, f64), t1: Option<u32>, t2: Option<u32> },
    Clip { path: String, inverse: bool },
    Drawing { scale: u32, commands: String },
    DrawingBaseline { offset: f64 },
    Origin { x: f64, y: f64 },
    Reset { style: Option<String> },
    Animate { start: Option<u32>, end: Option<u32>, accel: Option<f64>, target: String },
    Image {
        format: ImageFormat,
        width: u32,
        height: u32,
        x: i32,
        y: i32,
        data: Vec<u8>,
        palette: Vec<Color>,
    },
    Vobsub { forced: bool, original_index: Option<u32> },
    Unknown { format: String, raw: String },
}

impl Effect {
    /// The discriminant used to decide whether two effects are "the same
    /// variant" for the replace/augment-or-create persistence rules in
    /// §4.D — everything except the payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Karaoke { .. } => "karaoke",
            Effect::KaraokeAbsolute { .. } => "karaokeAbsolute",
            Effect::Blur { .. } => "blur",
            Effect::Border { .. } => "border",
            Effect::Shadow { .. } => "shadow",
            Effect::Scale { .. } => "scale",
            Effect::Rotate { .. } => "rotate",
            Effect::Shear { .. } => "shear",
            Effect::Spacing { .. } => "spacing",
            Effect::Fade { .. } => "fade",
            Effect::FadeComplex { .. } => "fadeComplex",
            Effect::Move { .. } => "move",
            Effect::Clip { .. } => "clip",
            Effect::Drawing { .. } => "drawing",
            Effect::DrawingBaseline { .. } => "drawingBaseline",
            Effect::Origin { .. } => "origin",
            Effect::Reset { .. } => "reset",
            Effect::Animate { .. } => "animate",
            Effect::Image { .. } => "image",
            Effect::Vobsub { .. } => "vobsub",
            Effect::Unknown { .. } => "unknown",
        }
    }
}

/// A maximal run of text sharing one inline style and effect set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSegment {
    pub text: String,
    pub style: Option<InlineStyle>,
    pub effects: Vec<Effect>,
}

impl TextSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        TextSegment {
            text: text.into(),
            style: None,
            effects: Vec::new(),
        }
    }
}

/// One dialogue line (§3 SubtitleEvent).
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEvent {
    pub id: u64,
    pub start: Time,
    pub end: Time,
    pub layer: i32,
    pub style: String,
    pub actor: String,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub effect: String,
    pub text: String,
    pub segments: Vec<TextSegment>,
    pub dirty: bool,
}

impl SubtitleEvent {
    /// Build a bare event with a fresh id, no style reference, no rich
    /// parse. Fails if `start > end`.
    pub fn new(start: Time, end: Time, text: impl Into<String>) -> Result<Self, SubxError> {
        if start > end {
            return Err(SubxError::invalid_format(
                "document",
                format!("event start {start} is after end {end}"),
            ));
        }
        Ok(SubtitleEvent {
            id: IdCounter::generate_id(),
            start,
            end,
            layer: 0,
            style: String::new(),
            actor: String::new(),
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
            effect: String::new(),
            text: text.into(),
            segments: Vec::new(),
            dirty: false,
        })
    }

    /// Plain text for this event: `segments` when dirty and non-empty,
    /// otherwise the authoritative `text` field (§3 SubtitleEvent
    /// invariant).
    pub fn effective_text(&self) -> String {
        if self.dirty && !self.segments.is_empty() {
            self.segments.iter().map(|s| s.text.as_str()).collect()
        } else {
            self.text.clone()
        }
    }
}

/// A `Comment:` line captured at its pre-event position (§3 Lifecycles).
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub before_event_index: usize,
}

/// A named, document-level collection of default typographic and
/// geometric attributes (§3 Style).
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub name: String,
    pub font_name: String,
    pub font_size: f64,
    pub primary_color: Color,
    pub secondary_color: Color,
    pub outline_color: Color,
    pub back_color: Color,
    pub primary_alpha: u8,
    pub secondary_alpha: u8,
    pub outline_alpha: u8,
    pub back_alpha: u8,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub scale_x: f64,
    pub scale_y: f64,
    pub spacing: f64,
    pub angle: f64,
    /// `1` = outline, `3` = opaque box.
    pub border_style: u8,
    pub outline: f64,
    pub shadow: f64,
    pub alignment: u8,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub encoding: i32,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            name: "Default".to_string(),
            font_name: "Arial".to_string(),
            font_size: 18.0,
            primary_color: Color::WHITE,
            secondary_color: Color::RED,
            outline_color: Color::BLACK,
            back_color: Color::BLACK,
            primary_alpha: 0,
            secondary_alpha: 0,
            outline_alpha: 0,
            back_alpha: 0,
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            scale_x: 100.0,
            scale_y: 100.0,
            spacing: 0.0,
            angle: 0.0,
            border_style: 1,
            outline: 2.0,
            shadow: 2.0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
            encoding: 1,
        }
    }
}

/// Document metadata (§3 ScriptInfo).
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptInfo {
    pub title: String,
    pub author: String,
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub scale_border_and_shadow: bool,
    pub wrap_style: WrapStyle,
}

impl Default for ScriptInfo {
    fn default() -> Self {
        ScriptInfo {
            title: String::new(),
            author: String::new(),
            play_res_x: 1920,
            play_res_y: 1080,
            scale_border_and_shadow: false,
            wrap_style: WrapStyle::SmartWide,
        }
    }
}

/// A WebVTT `REGION` block (§6).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VttRegion {
    pub id: String,
    pub width: Option<f64>,
    pub lines: Option<u32>,
    pub region_anchor: Option<(f64, f64)>,
    pub viewport_anchor: Option<(f64, f64)>,
    pub scroll: Option<String>,
}

/// A base64-encoded `[Fonts]`/`[Graphics]` attachment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedBlob {
    pub name: String,
    pub data: String,
}

/// An ordered, name-keyed collection of styles with last-writer-wins
/// semantics (§3 Lifecycles: "Styles are last-writer-wins by name").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleTable {
    entries: Vec<Style>,
}

impl StyleTable {
    pub fn new() -> Self {
        StyleTable::default()
    }

    /// Insert or replace the style with this name, keeping its original
    /// position when replacing.
    pub fn upsert(&mut self, style: Style) {
        if let Some(existing) = self.entries.iter_mut().find(|s| s.name == style.name) {
            *existing = style;
        } else {
            self.entries.push(style);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Style> {
        self.entries.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Style> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The canonical in-memory subtitle document (§3 SubtitleDocument).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleDocument {
    pub info: ScriptInfo,
    pub styles: StyleTable,
    pub events: Vec<SubtitleEvent>,
    pub comments: Vec<Comment>,
    pub regions: Vec<VttRegion>,
    pub fonts: Vec<EmbeddedBlob>,
    pub graphics: Vec<EmbeddedBlob>,
}

impl SubtitleDocument {
    /// An empty document with default `info` and no styles/events.
    pub fn new() -> Self {
        SubtitleDocument::default()
    }

    /// Build and append an event with a fresh id, no rich parse.
    ///
    /// `overrides` lets a caller set style/actor/margins/effect in one
    /// call without constructing the event by hand first.
    pub fn create_event(
        &mut self,
        start: Time,
        end: Time,
        text: impl Into<String>,
    ) -> Result<&SubtitleEvent, SubxError> {
        let event = SubtitleEvent::new(start, end, text)?;
        self.events.push(event);
        Ok(self.events.last().expect("just pushed"))
    }

    /// Append a comment anchored to the current event count.
    pub fn add_comment(&mut self, text: impl Into<String>) {
        self.comments.push(Comment {
            text: text.into(),
            before_event_index: self.events.len(),
        });
    }

    /// Stable-sort events by start time.
    ///
    /// Parsers never call this on their own (insertion order always
    /// equals source order); it exists for a caller that explicitly
    /// opts out of source-order preservation via `ParseOptions`.
    pub fn sort_by_start(&mut self) {
        self.events.sort_by_key(|e| e.start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_new_rejects_start_after_end() {
        let err = SubtitleEvent::new(Time::from_millis(10), Time::from_millis(5), "x");
        assert!(err.is_err());
    }

    #[test]
    fn event_new_allows_start_equal_end() {
        let ev = SubtitleEvent::new(Time::from_millis(10), Time::from_millis(10), "x").unwrap();
        assert_eq!(ev.start, ev.end);
    }

    #[test]
    fn ids_are_monotonic_and_unique() {
        let a = SubtitleEvent::new(Time::ZERO, Time::ZERO, "a").unwrap();
        let b = SubtitleEvent::new(Time::ZERO, Time::ZERO, "b").unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn reserve_ids_advances_by_n_and_returns_first() {
        let first = IdCounter::reserve_ids(5);
        let next = IdCounter::generate_id();
        assert_eq!(next, first + 5);
    }

    #[test]
    fn effective_text_prefers_text_when_not_dirty() {
        let mut ev = SubtitleEvent::new(Time::ZERO, Time::from_millis(1000), "raw").unwrap();
        ev.segments.push(TextSegment::plain("segmented"));
        assert_eq!(ev.effective_text(), "raw");
        ev.dirty = true;
        assert_eq!(ev.effective_text(), "segmented");
    }

    #[test]
    fn style_table_upsert_is_last_writer_wins_by_name() {
        let mut table = StyleTable::new();
        table.upsert(Style {
            name: "Default".into(),
            font_size: 18.0,
            ..Style::default()
        });
        table.upsert(Style {
            name: "Default".into(),
            font_size: 24.0,
            ..Style::default()
        });
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Default").unwrap().font_size, 24.0);
    }

    #[test]
    fn comment_captures_before_event_index() {
        let mut doc = SubtitleDocument::new();
        doc.create_event(Time::ZERO, Time::from_millis(1000), "one").unwrap();
        doc.add_comment("note");
        assert_eq!(doc.comments[0].before_event_index, 1);
    }

    #[test]
    fn inline_style_is_empty_by_default() {
        assert!(InlineStyle::default().is_empty());
    }
}
