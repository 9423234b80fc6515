//! Source analysis: memoized extraction of translation calls.

pub mod analyzer;

use crate::db::TrDatabase;
use crate::input::source::SourceFile;
use crate::interned::MessageKey;
use crate::ir::usage::MessageUsage;
use crate::types::{SourcePosition, SourceRange};

/// Analyzes a source file and returns its translation call sites.
#[salsa::tracked]
pub fn analyze_source(db: &dyn TrDatabase, file: SourceFile) -> Vec<MessageUsage<'_>> {
    let text = file.text(db);
    let language = file.language(db);
    let tree_sitter_lang = language.tree_sitter_language();
    let queries = analyzer::query_loader::load_queries(language);

    let calls = analyzer::extractor::analyze_tr_calls(text, &tree_sitter_lang, queries)
        .map_err(|error| {
            tracing::warn!(uri = %file.uri(db), %error, "Failed to analyze source file");
        })
        .unwrap_or_default();

    calls
        .into_iter()
        .map(|call| {
            let key = MessageKey::new(db, call.context, call.source);
            MessageUsage::new(
                db,
                key,
                call.source_range,
                call.kind,
                call.numerus,
                call.comment,
                call.call_line,
            )
        })
        .collect()
}

/// Returns the call site under a cursor position, if any.
#[salsa::tracked]
pub fn usage_at_position(
    db: &dyn TrDatabase,
    file: SourceFile,
    position: SourcePosition,
) -> Option<MessageUsage<'_>> {
    let usages = analyze_source(db, file);

    for usage in usages {
        if position_in_range(position, usage.range(db)) {
            return Some(usage);
        }
    }

    None
}

/// Checks whether a position falls inside a range.
const fn position_in_range(position: SourcePosition, range: SourceRange) -> bool {
    range.contains(position)
}
