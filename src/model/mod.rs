//! The canonical subtitle data model, shared by every format in this crate.

pub mod color;
pub mod document;
pub mod time;

pub use color::Color;
pub use document::{
    BoldValue, Comment, Effect, EmbeddedBlob, IdCounter, ImageFormat, InlineStyle, KaraokeMode,
    ScriptInfo, Style, StyleTable, SubtitleDocument, SubtitleEvent, TextSegment, VttRegion,
    WrapStyle,
};
pub use time::Time;
