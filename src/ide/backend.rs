//! LSP backend implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionParams, CodeActionProviderCapability, CodeActionResponse, CompletionOptions,
    CompletionParams, CompletionResponse, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidChangeWorkspaceFoldersParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams,
    ExecuteCommandOptions, ExecuteCommandParams, GotoDefinitionParams, GotoDefinitionResponse,
    Hover, HoverContents, HoverParams, HoverProviderCapability, InitializeParams,
    InitializeResult, InitializedParams, Location, MarkupContent, MarkupKind, MessageType, OneOf,
    ReferenceParams, ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
    WorkDoneProgressOptions, WorkspaceFolder, WorkspaceFoldersServerCapabilities,
    WorkspaceServerCapabilities,
};
use tower_lsp::{Client, LanguageServer};

use crate::catalog::edit::insert_message;
use crate::catalog::model::TsMessage;
use crate::config::ConfigManager;
use crate::db::TrDatabaseImpl;
use crate::ide::code_actions::{ADD_MESSAGE_COMMAND, SYNC_CATALOGS_COMMAND, build_actions};
use crate::ide::catalog_sync::sync_catalogs;
use crate::ide::completion::{CompletionTarget, completion_target};
use crate::ide::diagnostics::generate_diagnostics;
use crate::ide::goto_definition::find_definitions;
use crate::ide::hover::generate_hover_content;
use crate::ide::references::find_references;
use crate::indexer::WorkspaceIndexer;
use crate::input::catalog::Catalog;
use crate::input::source::{ProgrammingLanguage, SourceFile};
use crate::syntax::usage_at_position;
use crate::types::SourcePosition;

/// LSP backend.
///
/// # Lock order
/// When several locks are held at once, acquire them as:
/// `config_manager` → `db` → `source_files` → `catalogs`.
#[derive(Clone)]
pub struct Backend {
    /// LSP client handle.
    pub client: Client,
    /// Settings management.
    pub config_manager: Arc<Mutex<ConfigManager>>,
    /// Workspace indexer.
    pub workspace_indexer: Arc<WorkspaceIndexer>,
    /// Salsa database.
    pub db: Arc<Mutex<TrDatabaseImpl>>,
    /// Source file inputs by path.
    pub source_files: Arc<Mutex<HashMap<PathBuf, SourceFile>>>,
    /// Loaded catalogs.
    pub catalogs: Arc<Mutex<Vec<Catalog>>>,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("workspace_indexer", &"<WorkspaceIndexer>")
            .field("db", &"<TrDatabaseImpl>")
            .field("source_files", &"<HashMap<PathBuf, SourceFile>>")
            .field("catalogs", &"<Vec<Catalog>>")
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// Creates a backend for a client connection.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            workspace_indexer: Arc::new(WorkspaceIndexer::new()),
            db: Arc::new(Mutex::new(TrDatabaseImpl::default())),
            source_files: Arc::new(Mutex::new(HashMap::new())),
            catalogs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Workspace folders reported by the client, empty when unset.
    async fn get_workspace_folders(&self) -> Result<Vec<WorkspaceFolder>> {
        self.client.workspace_folders().await.map(Option::unwrap_or_default)
    }

    /// Indexes every workspace folder and stores the loaded catalogs.
    async fn index_all_folders(&self) {
        if let Ok(workspace_folders) = self.get_workspace_folders().await {
            for folder in workspace_folders {
                if let Ok(workspace_path) = folder.uri.to_file_path() {
                    let config_manager = self.config_manager.lock().await;
                    let db = self.db.lock().await.clone();
                    let source_files = self.source_files.clone();

                    match self
                        .workspace_indexer
                        .index_workspace(db, &workspace_path, &config_manager, source_files)
                        .await
                    {
                        Ok(catalogs) => {
                            *self.catalogs.lock().await = catalogs;
                            self.client
                                .log_message(MessageType::INFO, "Workspace indexing complete")
                                .await;
                        }
                        Err(error) => {
                            self.client
                                .log_message(
                                    MessageType::ERROR,
                                    format!("error indexing workspace: {error}"),
                                )
                                .await;
                        }
                    }
                }
            }
        }
    }

    /// Rebuilds the database and re-indexes everything.
    ///
    /// Used after configuration changes and catalog writes so stale
    /// inputs cannot survive.
    async fn reindex_workspace(&self) {
        self.client.log_message(MessageType::INFO, "Reindexing workspace...").await;

        *self.db.lock().await = TrDatabaseImpl::default();
        self.source_files.lock().await.clear();
        self.catalogs.lock().await.clear();

        self.index_all_folders().await;
    }

    /// Updates (or creates) the input for a changed source file and
    /// pushes fresh diagnostics.
    async fn apply_source_change(&self, uri: Url, new_content: String) {
        use salsa::Setter;

        let Ok(file_path) = uri.to_file_path() else {
            tracing::warn!("Failed to convert URI to file path: {}", uri);
            return;
        };
        let Some(language) = ProgrammingLanguage::from_uri(uri.as_str()) else {
            return;
        };

        let diagnostics = {
            let config_manager = self.config_manager.lock().await;
            let settings = config_manager.get_settings().clone();
            drop(config_manager);

            let mut db = self.db.lock().await;
            let mut source_files = self.source_files.lock().await;

            let source_file = if let Some(existing) = source_files.get(&file_path) {
                // salsa invalidates dependent queries on set
                existing.set_text(&mut *db).to(new_content);
                *existing
            } else {
                let source_file =
                    SourceFile::new(&*db, uri.to_string(), new_content, language);
                source_files.insert(file_path.clone(), source_file);
                source_file
            };
            drop(source_files);

            let catalogs = self.catalogs.lock().await;
            let diagnostics = generate_diagnostics(&*db, source_file, &catalogs, &settings);
            drop(catalogs);
            drop(db);

            diagnostics
        };

        self.client.publish_diagnostics(uri.clone(), diagnostics, None).await;

        tracing::debug!(uri = %uri, "File changed and diagnostics sent");
    }

    /// Adds a message to every catalog that does not define it yet.
    async fn add_message_to_catalogs(&self, context: &str, source: &str, numerus: bool) {
        let message = TsMessage::new_unfinished(source, numerus);
        let mut written = 0usize;

        {
            let db = self.db.lock().await;
            let catalogs = self.catalogs.lock().await;

            for catalog in catalogs.iter() {
                if catalog.doc(&*db).message(context, source).is_some() {
                    continue;
                }
                let path = catalog.file_path(&*db).clone();
                let Some(new_xml) = insert_message(catalog.xml_text(&*db), context, &message)
                else {
                    tracing::warn!(path, "Catalog has no insertion anchor");
                    continue;
                };
                if let Err(error) = tokio::fs::write(&path, new_xml).await {
                    tracing::error!(path, %error, "Failed to write catalog");
                    continue;
                }
                written += 1;
            }
        }

        self.client
            .show_message(
                MessageType::INFO,
                format!("Added '{source}' ({context}) to {written} catalog(s)"),
            )
            .await;

        // reload so diagnostics reflect the new entries
        self.reindex_workspace().await;
    }

    /// Runs the extraction/merge pass over the whole workspace.
    async fn run_catalog_sync(&self) {
        let report = {
            let config_manager = self.config_manager.lock().await;
            let settings = config_manager.get_settings().clone();
            drop(config_manager);

            let db = self.db.lock().await;
            let source_files = self.source_files.lock().await;
            let catalogs = self.catalogs.lock().await;

            sync_catalogs(&*db, &source_files, &catalogs, &settings).await
        };

        match report {
            Ok(report) => {
                self.client
                    .show_message(
                        MessageType::INFO,
                        format!(
                            "Synchronized {} catalog(s): {} added, {} updated, {} vanished, {} removed",
                            report.catalogs_written,
                            report.added,
                            report.updated,
                            report.vanished,
                            report.removed
                        ),
                    )
                    .await;
                self.reindex_workspace().await;
            }
            Err(error) => {
                self.client
                    .show_message(MessageType::ERROR, format!("Catalog sync failed: {error}"))
                    .await;
            }
        }
    }

    /// Resolves the message under a cursor in a Python file.
    ///
    /// Returns the owned `(context, source)` pair so no database borrow
    /// escapes the lock.
    async fn message_id_at(&self, uri: &Url, position: SourcePosition) -> Option<(String, String)> {
        let file_path = uri.to_file_path().ok()?;
        let source_file = { self.source_files.lock().await.get(&file_path).copied() };

        let db = self.db.lock().await;
        if let Some(source_file) = source_file {
            let usage = usage_at_position(&*db, source_file, position)?;
            let key = usage.key(&*db);
            return Some((key.context(&*db).clone(), key.source(&*db).clone()));
        }

        // maybe the cursor is inside a catalog file
        let path_str = file_path.to_string_lossy().to_string();
        let catalogs = self.catalogs.lock().await;
        let catalog = catalogs.iter().find(|c| c.file_path(&*db) == &path_str)?;
        let key = catalog.message_at_position(&*db, position)?;
        Some((key.context(&*db).clone(), key.source(&*db).clone()))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace_root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|folder| folder.uri.to_file_path().ok());

        let mut config_manager = self.config_manager.lock().await;
        if let Err(error) = config_manager.load_settings(workspace_root) {
            self.client
                .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                .await;
            tracing::error!("Configuration error during initialize: {}", error);
        }
        drop(config_manager);

        Ok(InitializeResult {
            server_info: None,
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec!["\"".to_string(), "'".to_string()]),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        SYNC_CATALOGS_COMMAND.to_string(),
                        ADD_MESSAGE_COMMAND.to_string(),
                    ],
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..ServerCapabilities::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client.log_message(MessageType::INFO, "initialized!").await;
        self.index_all_folders().await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_change_workspace_folders(&self, _: DidChangeWorkspaceFoldersParams) {
        self.client.log_message(MessageType::INFO, "workspace folders changed!").await;
        self.reindex_workspace().await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.client.log_message(MessageType::INFO, "configuration changed!").await;

        if let Ok(new_settings) =
            serde_json::from_value::<crate::config::TrSettings>(params.settings)
        {
            let mut config_manager = self.config_manager.lock().await;
            match config_manager.update_settings(new_settings) {
                Ok(()) => {
                    drop(config_manager);
                    self.client
                        .log_message(MessageType::INFO, "Configuration updated successfully")
                        .await;

                    self.reindex_workspace().await;
                }
                Err(error) => {
                    self.client
                        .log_message(
                            MessageType::ERROR,
                            format!("Configuration validation error: {error}"),
                        )
                        .await;
                }
            }
        }
    }

    async fn did_change_watched_files(&self, _: DidChangeWatchedFilesParams) {
        self.client.log_message(MessageType::INFO, "watched files have changed!").await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.apply_source_change(params.text_document.uri, params.text_document.text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;

        // FULL sync: the last change carries the whole document
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        self.apply_source_change(uri, change.text).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        // catalogs edited by hand (or by Linguist) are picked up on save
        if params.text_document.uri.as_str().ends_with(".ts") {
            self.reindex_workspace().await;
        }
    }

    async fn did_close(&self, _: DidCloseTextDocumentParams) {
        self.client.log_message(MessageType::INFO, "file closed!").await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        tracing::debug!(uri = %uri, line = position.line, character = position.character, "Hover request");

        let Some((context, source)) = self.message_id_at(&uri, position.into()).await else {
            return Ok(None);
        };

        let config_manager = self.config_manager.lock().await;
        let settings = config_manager.get_settings().clone();
        drop(config_manager);

        let db = self.db.lock().await;
        let catalogs = self.catalogs.lock().await;
        let key = crate::interned::MessageKey::new(&*db, context, source);
        let Some(hover_text) = generate_hover_content(
            &*db,
            key,
            &catalogs,
            settings.current_language.as_deref(),
            settings.primary_languages.as_deref(),
        ) else {
            return Ok(None);
        };

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: hover_text,
            }),
            range: None,
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some((context, source)) = self.message_id_at(&uri, position.into()).await else {
            return Ok(None);
        };

        let db = self.db.lock().await;
        let catalogs = self.catalogs.lock().await;
        let key = crate::interned::MessageKey::new(&*db, context, source);
        let locations = find_definitions(&*db, key, &catalogs);

        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(GotoDefinitionResponse::Array(locations)))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some((context, source)) = self.message_id_at(&uri, position.into()).await else {
            return Ok(None);
        };

        let db = self.db.lock().await;
        let source_files = self.source_files.lock().await;
        let key = crate::interned::MessageKey::new(&*db, context, source);
        let locations = find_references(&*db, key, &source_files);

        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(locations))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Ok(file_path) = uri.to_file_path() else {
            return Ok(None);
        };
        let source_file = { self.source_files.lock().await.get(&file_path).copied() };
        let Some(source_file) = source_file else {
            return Ok(None);
        };

        let config_manager = self.config_manager.lock().await;
        let current_language = config_manager.get_settings().current_language.clone();
        drop(config_manager);

        let db = self.db.lock().await;
        let line_text = source_file
            .text(&*db)
            .lines()
            .nth(position.line as usize)
            .map(ToString::to_string);
        let Some(line_text) = line_text else {
            return Ok(None);
        };

        let Some(target) = completion_target(&line_text, position.character) else {
            return Ok(None);
        };

        let catalogs = self.catalogs.lock().await;
        let items = match target {
            CompletionTarget::Context { partial, replace_start } => {
                crate::ide::completion::context_completions(
                    &*db,
                    &catalogs,
                    &partial,
                    position.line,
                    replace_start,
                    position.character,
                )
            }
            CompletionTarget::Source { context, partial, replace_start } => {
                crate::ide::completion::source_completions(
                    &*db,
                    &catalogs,
                    &context,
                    &partial,
                    position.line,
                    replace_start,
                    position.character,
                    current_language.as_deref(),
                )
            }
        };

        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let actions = build_actions(&params.context.diagnostics);

        if actions.is_empty() {
            return Ok(None);
        }
        Ok(Some(actions))
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        match params.command.as_str() {
            SYNC_CATALOGS_COMMAND => {
                self.run_catalog_sync().await;
            }
            ADD_MESSAGE_COMMAND => {
                let mut args = params.arguments.into_iter();
                let context = args.next().and_then(|v| v.as_str().map(ToString::to_string));
                let source = args.next().and_then(|v| v.as_str().map(ToString::to_string));
                let numerus =
                    args.next().and_then(|v| v.as_bool()).unwrap_or(false);

                if let (Some(context), Some(source)) = (context, source) {
                    self.add_message_to_catalogs(&context, &source, numerus).await;
                } else {
                    self.client
                        .show_message(MessageType::ERROR, "addMessage: missing arguments")
                        .await;
                }
            }
            other => {
                tracing::warn!(command = other, "Unknown command");
            }
        }

        Ok(None)
    }
}
