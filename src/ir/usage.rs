//! Intermediate representation of translation-call sites.

use crate::interned::MessageKey;
use crate::syntax::analyzer::types::CallKind;
use crate::types::SourceRange;

/// One translation call site in a source file.
#[salsa::interned]
pub struct MessageUsage {
    /// Message identity (interned).
    pub key: MessageKey<'db>,

    /// Range of the source-string argument.
    pub range: SourceRange,

    /// Call flavor at this site.
    pub kind: CallKind,

    /// Whether the call passed a count argument.
    pub numerus: bool,

    /// Disambiguation comment, if the call supplied one.
    pub comment: Option<String>,

    /// 0-indexed line of the call, for catalog location records.
    pub call_line: u32,
}
