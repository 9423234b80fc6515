//! Extracts Qt translation calls from Python source using tree-sitter.

use std::string::ToString;

use tree_sitter::{Language, Node, Parser, QueryCursor, StreamingIteratorMut};

use crate::syntax::analyzer::query_loader::LoadedQuery;
use crate::syntax::analyzer::types::{AnalyzerError, CallKind, CaptureName, TrCall};
use crate::types::SourceRange;

/// Extracts text content from a tree-sitter node.
fn extract_node_text(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    node.utf8_text(source_bytes).ok().map(ToString::to_string)
}

/// Resolves a string-literal expression to its text.
///
/// Handles plain strings, implicit concatenation (`"a" "b"`), and
/// parenthesized literals. F-strings and non-literal expressions return
/// `None` — they cannot be extracted.
fn literal_text(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => string_literal_text(node, source_bytes),
        "concatenated_string" => {
            let mut text = String::new();
            for i in 0..node.named_child_count() {
                let child = node.named_child(i)?;
                text.push_str(&literal_text(child, source_bytes)?);
            }
            Some(text)
        }
        "parenthesized_expression" => literal_text(node.named_child(0)?, source_bytes),
        _ => None,
    }
}

/// Text of a single `string` node, rejecting f-strings.
fn string_literal_text(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    let mut text = String::new();
    for i in 0..node.named_child_count() {
        let child = node.named_child(i)?;
        match child.kind() {
            "string_content" => text.push_str(&extract_node_text(child, source_bytes)?),
            "escape_sequence" => text.push_str(&unescape(&extract_node_text(child, source_bytes)?)),
            "interpolation" => return None,
            _ => {}
        }
    }
    Some(text)
}

/// Resolves the common Python escape sequences.
fn unescape(sequence: &str) -> String {
    match sequence {
        "\\n" => "\n".to_string(),
        "\\t" => "\t".to_string(),
        "\\r" => "\r".to_string(),
        "\\\"" => "\"".to_string(),
        "\\'" => "'".to_string(),
        "\\\\" => "\\".to_string(),
        other => other.to_string(),
    }
}

/// Positional and relevant keyword arguments of a call.
#[derive(Debug, Default)]
struct CallArguments<'tree> {
    /// Positional argument nodes, in order.
    positional: Vec<Node<'tree>>,
    /// Whether a `num=` keyword argument is present.
    has_num_keyword: bool,
}

/// Splits an `argument_list` node into positional/keyword parts.
fn split_arguments<'tree>(args_node: Node<'tree>, source_bytes: &[u8]) -> CallArguments<'tree> {
    let mut arguments = CallArguments::default();
    for i in 0..args_node.named_child_count() {
        let Some(child) = args_node.named_child(i) else {
            continue;
        };
        if child.kind() == "keyword_argument" {
            let keyword = child
                .child_by_field_name("name")
                .and_then(|n| extract_node_text(n, source_bytes));
            if keyword.as_deref() == Some("num") {
                arguments.has_num_keyword = true;
            }
        } else if child.kind() != "comment" {
            arguments.positional.push(child);
        }
    }
    arguments
}

/// Extracts translation calls from a source file.
///
/// # Errors
/// Returns [`AnalyzerError`] if the grammar cannot be loaded or the file
/// does not parse at all. Individual calls that are not extractable
/// (variable context, f-string source) are silently skipped.
pub fn analyze_tr_calls(
    source: &str,
    language: &Language,
    queries: &[LoadedQuery],
) -> Result<Vec<TrCall>, AnalyzerError> {
    let mut parser = Parser::new();
    parser.set_language(language)?;
    let tree = parser.parse(source, None).ok_or(AnalyzerError::ParseFailed)?;

    let source_bytes = source.as_bytes();
    let root_node = tree.root_node();

    let mut calls: Vec<(usize, TrCall)> = Vec::new();

    for loaded in queries {
        let cap_names = loaded.query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&loaded.query, root_node, source_bytes);

        while let Some(match_) = matches.next_mut() {
            let mut call_node: Option<Node<'_>> = None;
            let mut fn_name: Option<String> = None;
            let mut args_node: Option<Node<'_>> = None;

            for capture in match_.captures {
                let Some(cap_name) = cap_names.get(capture.index as usize) else {
                    continue;
                };
                let Ok(capture_name) = cap_name.parse::<CaptureName>() else {
                    continue;
                };
                match capture_name {
                    CaptureName::Call => call_node = Some(capture.node),
                    CaptureName::FnName => {
                        fn_name = extract_node_text(capture.node, source_bytes);
                    }
                    CaptureName::Args => args_node = Some(capture.node),
                }
            }

            let (Some(call_node), Some(fn_name), Some(args_node)) = (call_node, fn_name, args_node)
            else {
                continue;
            };

            // Each query file owns a fixed set of function names.
            if !loaded.functions.contains(&fn_name.as_str()) {
                continue;
            }
            let Some(kind) = CallKind::from_function_name(&fn_name) else {
                continue;
            };

            if let Some(call) = build_call(kind, call_node, args_node, source_bytes) {
                calls.push((call_node.start_byte(), call));
            }
        }
    }

    calls.sort_by_key(|(start, _)| *start);
    Ok(calls.into_iter().map(|(_, call)| call).collect())
}

/// Builds a [`TrCall`] from a matched call, or `None` if not extractable.
fn build_call(
    kind: CallKind,
    call_node: Node<'_>,
    args_node: Node<'_>,
    source_bytes: &[u8],
) -> Option<TrCall> {
    let arguments = split_arguments(args_node, source_bytes);

    let context_node = arguments.positional.first()?;
    let source_node = arguments.positional.get(1)?;

    let context = literal_text(*context_node, source_bytes)?;
    let source = literal_text(*source_node, source_bytes)?;

    let comment = arguments
        .positional
        .get(2)
        .and_then(|node| literal_text(*node, source_bytes))
        .filter(|text| !text.is_empty());

    let numerus = arguments.has_num_keyword || arguments.positional.len() > 3;

    #[allow(clippy::cast_possible_truncation)] // line counts never exceed u32
    let call_line = call_node.start_position().row as u32;

    Some(TrCall {
        context,
        source,
        comment,
        numerus,
        kind,
        source_range: SourceRange::from_node(source_node),
        call_line,
    })
}
