//! Completion implementation.
//!
//! Inside the context argument of a translation call the known context
//! names are offered; inside the source argument, the existing source
//! strings of that context.

use std::collections::{BTreeMap, BTreeSet};

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, MarkupContent,
    MarkupKind, Position, Range, TextEdit,
};

use crate::catalog::model::TranslationState;
use crate::db::TrDatabase;
use crate::ide::hover::locale_matches;
use crate::input::catalog::Catalog;

/// Function names whose arguments are completed.
const TRANSLATE_FNS: &[&str] = &["translate", "QT_TRANSLATE_NOOP", "dtr"];

/// What should be completed at the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionTarget {
    /// Cursor inside the context argument.
    Context {
        /// Text typed so far inside the quotes.
        partial: String,
        /// Column where the partial starts.
        replace_start: u32,
    },
    /// Cursor inside the source argument.
    Source {
        /// Context name from the first argument.
        context: String,
        /// Text typed so far inside the quotes.
        partial: String,
        /// Column where the partial starts.
        replace_start: u32,
    },
}

/// Analyzes a line of Python up to the cursor.
///
/// Only positions inside a string literal of a translation call's first
/// or second argument produce a target.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // column counts never exceed u32
pub fn completion_target(line: &str, character: u32) -> Option<CompletionTarget> {
    let chars: Vec<char> = line.chars().collect();
    let cursor = (character as usize).min(chars.len());

    let open_paren = find_call_open_paren(&chars, cursor)?;

    // walk the argument text, tracking string state
    let mut quote: Option<char> = None;
    let mut partial_start = 0usize;
    let mut commas = 0usize;
    let mut args: Vec<String> = vec![String::new()];

    let mut i = open_paren + 1;
    while i < cursor {
        let c = *chars.get(i)?;
        match quote {
            Some(q) => {
                if c == '\\' {
                    i += 1;
                } else if c == q {
                    quote = None;
                } else if let Some(arg) = args.last_mut() {
                    arg.push(c);
                }
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    partial_start = i + 1;
                }
                ',' => {
                    commas += 1;
                    args.push(String::new());
                }
                ')' => return None,
                _ => {}
            },
        }
        i += 1;
    }

    // completions only apply inside a string literal
    quote?;

    let partial: String = chars.get(partial_start..cursor)?.iter().collect();
    let replace_start = partial_start as u32;

    match commas {
        0 => Some(CompletionTarget::Context { partial, replace_start }),
        1 => {
            let context = args.first()?.clone();
            if context.is_empty() {
                return None;
            }
            Some(CompletionTarget::Source { context, partial, replace_start })
        }
        _ => None,
    }
}

/// Finds the opening paren of the nearest translation call before the
/// cursor. Returns a char index into the line.
fn find_call_open_paren(chars: &[char], cursor: usize) -> Option<usize> {
    let prefix: String = chars.get(..cursor)?.iter().collect();

    // byte offset of the best '(' so far
    let mut best: Option<usize> = None;
    for fn_name in TRANSLATE_FNS {
        let mut from = 0;
        while let Some(found) = prefix.get(from..).and_then(|rest| rest.find(fn_name)) {
            let at = from + found;
            from = at + fn_name.len();

            // word boundary on the left ('.' is fine: App.Qt.translate)
            let before = prefix.get(..at).and_then(|s| s.chars().next_back());
            if before.is_some_and(|c| c.is_alphanumeric() || c == '_') {
                continue;
            }

            let after = at + fn_name.len();
            if prefix.get(after..after + 1) == Some("(") {
                best = Some(best.map_or(after, |b: usize| b.max(after)));
            }
        }
    }

    best.map(|b| prefix.get(..b).map_or(b, |s| s.chars().count()))
}

/// Completion items for context names.
#[must_use]
pub fn context_completions(
    db: &dyn TrDatabase,
    catalogs: &[Catalog],
    partial: &str,
    line: u32,
    replace_start: u32,
    cursor: u32,
) -> Vec<CompletionItem> {
    let mut names = BTreeSet::new();
    for catalog in catalogs {
        for context in &catalog.doc(db).contexts {
            names.insert(context.name.clone());
        }
    }

    names
        .into_iter()
        .filter(|name| partial.is_empty() || name.contains(partial))
        .map(|name| CompletionItem {
            label: name.clone(),
            kind: Some(CompletionItemKind::MODULE),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range: replace_range(line, replace_start, cursor),
                new_text: name,
            })),
            ..CompletionItem::default()
        })
        .collect()
}

/// Completion items for source strings of one context.
#[must_use]
pub fn source_completions(
    db: &dyn TrDatabase,
    catalogs: &[Catalog],
    context: &str,
    partial: &str,
    line: u32,
    replace_start: u32,
    cursor: u32,
    current_language: Option<&str>,
) -> Vec<CompletionItem> {
    // source -> (locale, translation) pairs across catalogs
    let mut by_source: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();

    for catalog in catalogs {
        let locale = catalog.locale(db);
        let Some(ctx) = catalog.doc(db).context(context) else {
            continue;
        };
        for message in &ctx.messages {
            if !partial.is_empty() && !message.source.contains(partial) {
                continue;
            }
            let value = if message.state == TranslationState::Finished {
                message.translation.clone()
            } else {
                format!("{} (pending)", message.translation)
            };
            by_source.entry(message.source.clone()).or_default().push((locale.clone(), value));
        }
    }

    by_source
        .into_iter()
        .map(|(source, lang_values)| {
            let detail = current_language.and_then(|wanted| {
                lang_values
                    .iter()
                    .find(|(locale, _)| locale_matches(locale, wanted))
                    .map(|(_, value)| value.clone())
            });

            let doc_lines: Vec<String> =
                lang_values.iter().map(|(locale, value)| format!("- **{locale}**: {value}")).collect();

            CompletionItem {
                label: source.clone(),
                kind: Some(CompletionItemKind::TEXT),
                detail,
                documentation: Some(Documentation::MarkupContent(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: doc_lines.join("\n"),
                })),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range: replace_range(line, replace_start, cursor),
                    new_text: source,
                })),
                ..CompletionItem::default()
            }
        })
        .collect()
}

/// The range replaced by a completion: the partial text before the cursor.
const fn replace_range(line: u32, replace_start: u32, cursor: u32) -> Range {
    Range {
        start: Position { line, character: replace_start },
        end: Position { line, character: cursor },
    }
}
