//! Format-specific parsers and serializers, all producing/consuming the
//! shared [`crate::model::SubtitleDocument`].

pub mod ass;
pub mod html_tags;
pub mod manager;
pub mod srt;
pub mod sub;
pub mod vobsub;
pub mod vtt;

use crate::error::{ParseError, SubxError};
use crate::model::SubtitleDocument;

/// How a parser should react to a recoverable, per-element failure
/// (§6 parse options, §7 error handling design).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    /// Abort the whole parse on the first failure.
    Throw,
    /// Skip the offending element, record an error, keep going.
    Collect,
    /// Skip the offending element, record nothing.
    Skip,
}

/// Per-call parse options (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub on_error: OnError,
    pub strict: bool,
    pub preserve_order: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            on_error: OnError::Collect,
            strict: false,
            preserve_order: true,
        }
    }
}

/// The outcome of a `parse` call: a document plus any recoverable
/// errors collected along the way (§6: `{ok, document, errors, warnings}`).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub ok: bool,
    pub document: SubtitleDocument,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<String>,
}

impl ParseOutcome {
    pub fn success(document: SubtitleDocument) -> Self {
        ParseOutcome {
            ok: true,
            document,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn empty_with_errors(errors: Vec<ParseError>) -> Self {
        ParseOutcome {
            ok: false,
            document: SubtitleDocument::new(),
            errors,
            warnings: Vec::new(),
        }
    }
}

/// A subtitle file format: parse text/bytes into the canonical document
/// model and serialize back, plus enough metadata for format detection
/// and dispatch by extension.
pub trait SubtitleFormat {
    /// Parse `input` under the default (collect) options.
    fn parse(&self, input: &str) -> Result<SubtitleDocument, SubxError>;

    /// Parse `input`, collecting recoverable errors per `options`.
    fn parse_with_options(&self, input: &str, options: ParseOptions) -> ParseOutcome {
        match self.parse(input) {
            Ok(document) => ParseOutcome::success(document),
            Err(err) => {
                if options.on_error == OnError::Skip {
                    ParseOutcome::empty_with_errors(Vec::new())
                } else {
                    ParseOutcome::empty_with_errors(vec![ParseError::from_error(&err)])
                }
            }
        }
    }

    /// Serialize a document back to this format's on-the-wire text.
    fn serialize(&self, document: &SubtitleDocument) -> Result<String, SubxError>;

    /// Heuristically detect whether `content` looks like this format.
    fn detect(&self, content: &str) -> bool;

    /// Human-readable format name, e.g. `"SRT"`.
    fn format_name(&self) -> &'static str;

    /// Lower-case file extensions this format is known by.
    fn file_extensions(&self) -> &'static [&'static str];

    /// Whether this format supports inline styling beyond plain text.
    fn supports_styling(&self) -> bool {
        false
    }
}

/// Shared per-element error policy for collect-mode parsers (§6/§7):
/// `strict` escalates any recoverable failure to a hard abort, `Throw`
/// aborts outright, `Collect` records a [`ParseError`] and continues,
/// `Skip` drops the element without recording anything.
pub(crate) fn record_or_throw(
    options: ParseOptions,
    err: SubxError,
    errors: &mut Vec<ParseError>,
) -> Result<(), SubxError> {
    if options.strict || options.on_error == OnError::Throw {
        return Err(err);
    }
    if options.on_error == OnError::Collect {
        errors.push(ParseError::from_error(&err));
    }
    Ok(())
}
