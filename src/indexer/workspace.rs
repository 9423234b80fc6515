//! Workspace traversal and input loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt as _;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tokio::sync::Mutex;

use crate::config::ConfigManager;
use crate::db::TrDatabaseImpl;
use crate::indexer::types::IndexerError;
use crate::input::catalog::{Catalog, catalog_from_text};
use crate::input::source::{ProgrammingLanguage, SourceFile};

/// Files a traversal pass found, split by role.
#[derive(Debug, Default)]
struct FoundFiles {
    /// Python sources matching the include patterns.
    sources: Vec<PathBuf>,
    /// Catalog files matching the catalog pattern.
    catalogs: Vec<PathBuf>,
}

/// Indexes a workspace into salsa inputs.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceIndexer;

impl WorkspaceIndexer {
    /// Creates a new indexer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Indexes a workspace: loads every matching source file and catalog.
    ///
    /// File contents are read concurrently; unreadable files are logged
    /// and skipped. Returns the loaded catalogs.
    ///
    /// # Errors
    /// Returns [`IndexerError`] when the configured patterns cannot be
    /// compiled.
    pub async fn index_workspace(
        &self,
        db: TrDatabaseImpl,
        workspace_path: &Path,
        config_manager: &ConfigManager,
        source_files: Arc<Mutex<HashMap<PathBuf, SourceFile>>>,
    ) -> Result<Vec<Catalog>, IndexerError> {
        tracing::debug!(workspace_path = %workspace_path.display(), "Indexing workspace");
        let settings = config_manager.get_settings();

        let found = Self::find_files(
            workspace_path,
            &settings.include_patterns,
            &settings.exclude_patterns,
            &settings.catalog_files.file_pattern,
        )?;
        tracing::debug!(
            sources = found.sources.len(),
            catalogs = found.catalogs.len(),
            "Workspace traversal complete"
        );

        let concurrency = settings.indexing.effective_threads();

        let source_contents = read_files(found.sources, concurrency).await;
        {
            let mut source_files = source_files.lock().await;
            for (path, content) in source_contents {
                let uri = path.to_string_lossy().to_string();
                let Some(language) = ProgrammingLanguage::from_uri(&uri) else {
                    continue;
                };
                let file = SourceFile::new(&db, uri, content, language);
                source_files.insert(path, file);
            }
        }

        let catalog_contents = read_files(found.catalogs, concurrency).await;
        let mut catalogs = Vec::new();
        for (path, content) in catalog_contents {
            match catalog_from_text(&db, &path, content) {
                Ok(catalog) => catalogs.push(catalog),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Failed to parse catalog");
                }
            }
        }

        Ok(catalogs)
    }

    /// Walks the workspace and classifies matching files.
    fn find_files(
        workspace_path: &Path,
        include_patterns: &[String],
        exclude_patterns: &[String],
        catalog_pattern: &str,
    ) -> Result<FoundFiles, IndexerError> {
        let include_set = build_globset(include_patterns, "include")?;
        let exclude_set = build_globset(exclude_patterns, "exclude")?;
        let catalog_patterns = vec![catalog_pattern.to_string()];
        let catalog_set = build_globset(&catalog_patterns, "catalog")?;

        let mut found = FoundFiles::default();

        for result in WalkBuilder::new(workspace_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();

            let Ok(relative_path) = path.strip_prefix(workspace_path) else {
                continue;
            };

            if catalog_set.is_match(relative_path) {
                found.catalogs.push(path.to_path_buf());
            } else if include_set.is_match(relative_path) && !exclude_set.is_match(relative_path) {
                found.sources.push(path.to_path_buf());
            }
        }

        Ok(found)
    }
}

/// Compiles a pattern list into a glob set.
fn build_globset(patterns: &[String], role: &str) -> Result<GlobSet, IndexerError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            IndexerError::Error(format!("Invalid {role} pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| IndexerError::Error(format!("Failed to build {role} patterns: {e}")))
}

/// Reads files concurrently, skipping unreadable ones with a warning.
async fn read_files(paths: Vec<PathBuf>, concurrency: usize) -> Vec<(PathBuf, String)> {
    futures::stream::iter(paths)
        .map(|path| async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => Some((path, content)),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Failed to read file");
                    None
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|loaded| async move { loaded })
        .collect()
        .await
}
