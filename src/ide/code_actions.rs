//! Code action generation for missing messages.

use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Command, Diagnostic, NumberOrString,
};

use crate::ide::diagnostics::MISSING_MESSAGE;

/// Command identifier for the add-message quick fix.
pub const ADD_MESSAGE_COMMAND: &str = "qtI18n.addMessage";

/// Command identifier for the full catalog sync.
pub const SYNC_CATALOGS_COMMAND: &str = "qtI18n.syncCatalogs";

/// A message a diagnostic reported as missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMessage {
    /// Context name.
    pub context: String,
    /// Source string.
    pub source: String,
    /// Whether the call site passed a count argument.
    pub numerus: bool,
}

/// Reads the missing-message payload out of a diagnostic.
#[must_use]
pub fn extract_missing_message(diagnostic: &Diagnostic) -> Option<MissingMessage> {
    if !matches!(
        &diagnostic.code,
        Some(NumberOrString::String(code)) if code == MISSING_MESSAGE
    ) {
        return None;
    }

    let data = diagnostic.data.as_ref()?;
    Some(MissingMessage {
        context: data.get("context")?.as_str()?.to_string(),
        source: data.get("source")?.as_str()?.to_string(),
        numerus: data.get("numerus").and_then(serde_json::Value::as_bool).unwrap_or(false),
    })
}

/// Builds quick-fix actions for the missing-message diagnostics in scope.
#[must_use]
pub fn build_actions(diagnostics: &[Diagnostic]) -> Vec<CodeActionOrCommand> {
    let mut actions = Vec::new();

    for diagnostic in diagnostics {
        let Some(missing) = extract_missing_message(diagnostic) else {
            continue;
        };

        actions.push(CodeActionOrCommand::CodeAction(CodeAction {
            title: format!("Add '{}' to translation catalogs", missing.source),
            kind: Some(CodeActionKind::QUICKFIX),
            diagnostics: Some(vec![diagnostic.clone()]),
            command: Some(Command {
                title: "Add message to catalogs".to_string(),
                command: ADD_MESSAGE_COMMAND.to_string(),
                arguments: Some(vec![
                    serde_json::Value::String(missing.context),
                    serde_json::Value::String(missing.source),
                    serde_json::Value::Bool(missing.numerus),
                ]),
            }),
            ..CodeAction::default()
        }));
    }

    actions
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use tower_lsp::lsp_types::DiagnosticSeverity;

    use super::*;

    fn missing_diagnostic() -> Diagnostic {
        Diagnostic {
            severity: Some(DiagnosticSeverity::WARNING),
            code: Some(NumberOrString::String(MISSING_MESSAGE.to_string())),
            message: "Message 'Export Svg' (SvgWB) is missing from catalogs: de_DE".to_string(),
            data: Some(serde_json::json!({
                "context": "SvgWB",
                "source": "Export Svg",
                "numerus": false,
                "missing_locales": ["de_DE"],
            })),
            ..Diagnostic::default()
        }
    }

    #[googletest::test]
    fn extracts_payload_from_diagnostic() {
        let missing = extract_missing_message(&missing_diagnostic()).unwrap();

        expect_that!(missing.context, eq("SvgWB"));
        expect_that!(missing.source, eq("Export Svg"));
        expect_that!(missing.numerus, eq(false));
    }

    #[googletest::test]
    fn ignores_other_diagnostics() {
        let other = Diagnostic {
            code: Some(NumberOrString::String("unfinished-translation".to_string())),
            ..Diagnostic::default()
        };

        expect_that!(extract_missing_message(&other), none());
    }

    #[googletest::test]
    fn builds_quick_fix_with_command() {
        let actions = build_actions(&[missing_diagnostic()]);

        assert_that!(actions.len(), eq(1));
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };
        expect_that!(action.title, contains_substring("Export Svg"));
        expect_that!(action.kind, some(eq(&CodeActionKind::QUICKFIX)));

        let command = action.command.as_ref().unwrap();
        expect_that!(command.command, eq(ADD_MESSAGE_COMMAND));
        let args = command.arguments.as_ref().unwrap();
        expect_that!(args[0].as_str(), some(eq("SvgWB")));
        expect_that!(args[1].as_str(), some(eq("Export Svg")));
    }
}
