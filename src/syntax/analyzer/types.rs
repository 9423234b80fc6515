//! Types shared by the extraction analyzer.

use std::str::FromStr;

use thiserror::Error;

use crate::types::SourceRange;

/// Errors raised while analyzing a source file.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Grammar could not be loaded into the parser.
    #[error("failed to set up tree-sitter language: {0}")]
    LanguageSetup(#[from] tree_sitter::LanguageError),

    /// Tree-sitter returned no tree for the file.
    #[error("failed to parse source code")]
    ParseFailed,
}

/// How a translation site was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `translate("Context", "Source")` — translated at call time.
    Translate,
    /// `QT_TRANSLATE_NOOP("Context", "Source")` — marked for extraction only.
    TranslateNoop,
    /// `dtr("Context", "Source")` — deferred, translated on `str()`.
    Deferred,
}

impl CallKind {
    /// Maps a called function name to its kind.
    #[must_use]
    pub fn from_function_name(name: &str) -> Option<Self> {
        match name {
            "translate" => Some(Self::Translate),
            "QT_TRANSLATE_NOOP" => Some(Self::TranslateNoop),
            "dtr" => Some(Self::Deferred),
            _ => None,
        }
    }
}

/// Capture names used by the query files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureName {
    /// The whole call expression.
    Call,
    /// The called function name (or attribute tail).
    FnName,
    /// The argument list.
    Args,
}

impl FromStr for CaptureName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(Self::Call),
            "fn_name" => Ok(Self::FnName),
            "args" => Ok(Self::Args),
            _ => Err(()),
        }
    }
}

/// One translation call found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrCall {
    /// Context name, first argument.
    pub context: String,
    /// Source string, second argument.
    pub source: String,
    /// Disambiguation comment, third argument when a literal.
    pub comment: Option<String>,
    /// Whether the call passed a count argument.
    pub numerus: bool,
    /// Call flavor.
    pub kind: CallKind,
    /// Range of the source-string argument.
    pub source_range: SourceRange,
    /// 0-indexed line of the call itself, for location records.
    pub call_line: u32,
}
