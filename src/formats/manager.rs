//! Format detection and dispatch across all registered text-based
//! subtitle formats (ASS, VTT, SRT, MicroDVD).

use crate::error::SubxError;
use crate::formats::ass::AssFormat;
use crate::formats::srt::SrtFormat;
use crate::formats::sub::SubFormat;
use crate::formats::vtt::VttFormat;
use crate::formats::{ParseOptions, ParseOutcome, SubtitleFormat};
use crate::model::document::SubtitleDocument;
use log::{info, warn};

/// Detects a subtitle's format and routes parse/serialize calls to the
/// matching [`SubtitleFormat`] implementation.
pub struct FormatManager {
    formats: Vec<Box<dyn SubtitleFormat>>,
}

impl Default for FormatManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatManager {
    /// Build a manager with every built-in text format registered.
    pub fn new() -> Self {
        Self {
            formats: vec![
                Box::new(AssFormat),
                Box::new(VttFormat),
                Box::new(SrtFormat),
                Box::new(SubFormat),
            ],
        }
    }

    /// Detect the format of `content` and parse it, trying each
    /// registered format's [`SubtitleFormat::detect`] in registration
    /// order.
    pub fn parse_auto(&self, content: &str) -> Result<SubtitleDocument, SubxError> {
        for fmt in &self.formats {
            if fmt.detect(content) {
                info!("detected subtitle format: {}", fmt.format_name());
                return fmt.parse(content);
            }
        }
        warn!("no registered format recognized the input");
        Err(SubxError::invalid_format("Unknown", "unrecognized subtitle format"))
    }

    /// Detect the format of `content` and parse it under explicit
    /// `options`, surfacing per-element [`crate::error::ParseError`]s
    /// instead of dropping them (§6 collect mode).
    pub fn parse_auto_with_options(&self, content: &str, options: ParseOptions) -> Result<ParseOutcome, SubxError> {
        for fmt in &self.formats {
            if fmt.detect(content) {
                info!("detected subtitle format: {}", fmt.format_name());
                return Ok(fmt.parse_with_options(content, options));
            }
        }
        warn!("no registered format recognized the input");
        Err(SubxError::invalid_format("Unknown", "unrecognized subtitle format"))
    }

    /// Look up a format by its case-insensitive name (e.g. `"srt"`).
    pub fn get_format(&self, name: &str) -> Option<&dyn SubtitleFormat> {
        let lname = name.to_lowercase();
        self.formats
            .iter()
            .find(|f| f.format_name().to_lowercase() == lname)
            .map(|f| f.as_ref())
    }

    /// Look up a format by file extension (without the leading dot).
    pub fn get_format_by_extension(&self, ext: &str) -> Option<&dyn SubtitleFormat> {
        let ext_lc = ext.to_lowercase();
        self.formats
            .iter()
            .find(|f| f.file_extensions().contains(&ext_lc.as_str()))
            .map(|f| f.as_ref())
    }
}
