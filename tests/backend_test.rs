//! End-to-end tests for the LSP backend.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

use qt_i18n_language_server::Backend;
use tower_lsp::lsp_types::*;
use tower_lsp::{LanguageServer, LspService};

fn create_test_backend() -> Backend {
    let (service, _socket) = LspService::new(Backend::new);
    service.inner().clone()
}

fn init_params() -> InitializeParams {
    InitializeParams::default()
}

#[tokio::test]
async fn test_capabilities() {
    let backend = create_test_backend();

    let result = backend.initialize(init_params()).await.unwrap();
    let capabilities = result.capabilities;

    match capabilities.hover_provider.unwrap() {
        HoverProviderCapability::Simple(enabled) => assert!(enabled),
        other => panic!("Expected simple hover capability, got {other:?}"),
    }

    let completion = capabilities.completion_provider.unwrap();
    assert_eq!(
        completion.trigger_characters,
        Some(vec!["\"".to_string(), "'".to_string()])
    );

    assert!(matches!(capabilities.definition_provider, Some(OneOf::Left(true))));
    assert!(matches!(capabilities.references_provider, Some(OneOf::Left(true))));
    assert!(capabilities.code_action_provider.is_some());

    let commands = capabilities.execute_command_provider.unwrap().commands;
    assert!(commands.contains(&"qtI18n.syncCatalogs".to_string()));
    assert!(commands.contains(&"qtI18n.addMessage".to_string()));
}

#[tokio::test]
async fn test_hover_on_unknown_file_returns_none() {
    let backend = create_test_backend();
    let _ = backend.initialize(init_params()).await.unwrap();

    let hover_params = HoverParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: Url::parse("file:///nowhere/import_svg.py").unwrap(),
            },
            position: Position { line: 0, character: 0 },
        },
        work_done_progress_params: WorkDoneProgressParams { work_done_token: None },
    };

    let result = backend.hover(hover_params).await;

    assert!(result.is_ok());
    assert!(result.unwrap().is_none());
}

#[tokio::test]
async fn test_did_open_then_hover_without_catalogs() {
    let backend = create_test_backend();
    let _ = backend.initialize(init_params()).await.unwrap();

    let uri = Url::parse("file:///ws/import_svg.py").unwrap();
    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "python".to_string(),
                version: 1,
                text: "title = translate(\"SvgWB\", \"Import Svg\")\n".to_string(),
            },
        })
        .await;

    // the usage resolves, but with no catalogs loaded there is nothing to show
    let hover_params = HoverParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri },
            position: Position { line: 0, character: 30 },
        },
        work_done_progress_params: WorkDoneProgressParams { work_done_token: None },
    };

    let result = backend.hover(hover_params).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_code_action_for_missing_message_diagnostic() {
    let backend = create_test_backend();
    let _ = backend.initialize(init_params()).await.unwrap();

    let diagnostic = Diagnostic {
        range: Range::default(),
        severity: Some(DiagnosticSeverity::WARNING),
        code: Some(NumberOrString::String("missing-message".to_string())),
        source: Some("qt-i18n".to_string()),
        message: "Message 'Export Svg' (SvgWB) is missing from catalogs: de_DE".to_string(),
        data: Some(serde_json::json!({
            "context": "SvgWB",
            "source": "Export Svg",
            "numerus": false,
            "missing_locales": ["de_DE"],
        })),
        ..Diagnostic::default()
    };

    let params = CodeActionParams {
        text_document: TextDocumentIdentifier {
            uri: Url::parse("file:///ws/import_svg.py").unwrap(),
        },
        range: Range::default(),
        context: CodeActionContext {
            diagnostics: vec![diagnostic],
            only: None,
            trigger_kind: None,
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
    };

    let actions = backend.code_action(params).await.unwrap().unwrap();

    assert_eq!(actions.len(), 1);
    match &actions[0] {
        CodeActionOrCommand::CodeAction(action) => {
            assert!(action.title.contains("Export Svg"));
            let command = action.command.as_ref().unwrap();
            assert_eq!(command.command, "qtI18n.addMessage");
        }
        other => panic!("Expected a code action, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shutdown() {
    let backend = create_test_backend();

    assert!(backend.shutdown().await.is_ok());
}
