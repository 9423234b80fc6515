//! Settings types and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single settings problem, addressed by JSON field path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "includePatterns[0]").
    pub field_path: String,
    /// Human-readable problem description.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for a field path.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Settings load/parse/validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more fields failed validation.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// File system failure while loading.
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON syntax or shape problem.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list formatting for validation errors.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Workspace settings for the server, read from `.qt-i18n.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrSettings {
    /// Where the `.ts` catalogs live.
    pub catalog_files: CatalogFilesConfig,

    /// Source files to analyze.
    pub include_patterns: Vec<String>,
    /// Source files to skip.
    pub exclude_patterns: Vec<String>,

    /// Language of the source strings, stamped into new catalogs.
    pub source_language: Option<String>,

    /// Locale shown first in hover/completion documentation.
    pub current_language: Option<String>,

    /// Fallback locale priority when `currentLanguage` is unset.
    pub primary_languages: Option<Vec<String>>,

    /// Locales that must have finished translations.
    ///
    /// - `None`: all detected locales are required (default)
    /// - `Some([...])`: only the listed locales are required
    ///
    /// Mutually exclusive with `optional_languages`.
    pub required_languages: Option<Vec<String>>,

    /// Locales where pending translations are not reported.
    ///
    /// Mutually exclusive with `required_languages`.
    pub optional_languages: Option<Vec<String>>,

    /// Diagnostic toggles.
    pub diagnostics: DiagnosticsConfig,

    /// Catalog synchronization behavior.
    pub sync: SyncConfig,

    /// Indexing parallelism.
    pub indexing: IndexingConfig,
}

/// Indexing parallelism knobs.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Concurrent file loads while indexing.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,
}

impl IndexingConfig {
    /// Effective concurrency, defaulting to 80% of the CPU count.
    #[must_use]
    pub fn effective_threads(self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1))
    }
}

/// Diagnostic toggles.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticsConfig {
    /// Warn when a message is missing from one or more catalogs.
    pub missing_messages: bool,
    /// Report messages whose translation is still pending.
    pub unfinished: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { missing_messages: true, unfinished: true }
    }
}

/// Catalog synchronization behavior.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Drop disappeared messages instead of marking them vanished.
    pub purge_obsolete: bool,
    /// Write location references without line numbers.
    pub drop_location_lines: bool,
}

/// Where catalogs are found.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFilesConfig {
    /// Glob matching catalog files, relative to the workspace root.
    pub file_pattern: String,
}

impl Default for CatalogFilesConfig {
    fn default() -> Self {
        Self { file_pattern: "**/translations/**/*.ts".to_string() }
    }
}

impl TrSettings {
    /// # Errors
    /// - Required pattern list is empty
    /// - Invalid glob pattern
    /// - Mutually exclusive language lists both set
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                "includePatterns",
                "At least one pattern is required. Example: [\"**/*.py\"]",
            ));
        }

        for (index, pattern) in self.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.catalog_files.file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "catalogFiles.filePattern",
                "The pattern cannot be empty. Example: \"**/translations/**/*.ts\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.catalog_files.file_pattern) {
            errors.push(ValidationError::new(
                "catalogFiles.filePattern",
                format!("Invalid glob pattern '{}': {e}", self.catalog_files.file_pattern),
            ));
        }

        if self.required_languages.is_some() && self.optional_languages.is_some() {
            errors.push(ValidationError::new(
                "requiredLanguages/optionalLanguages",
                "Cannot specify both 'requiredLanguages' and 'optionalLanguages'. Please use only one",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Whether pending translations in `locale` should be reported.
    #[must_use]
    pub fn locale_is_required(&self, locale: &str) -> bool {
        if let Some(required) = &self.required_languages {
            return required.iter().any(|l| l == locale);
        }
        if let Some(optional) = &self.optional_languages {
            return !optional.iter().any(|l| l == locale);
        }
        true
    }
}

impl Default for TrSettings {
    fn default() -> Self {
        Self {
            catalog_files: CatalogFilesConfig::default(),
            include_patterns: vec!["**/*.py".to_string()],
            exclude_patterns: vec!["**/__pycache__/**".to_string(), ".git/**".to_string()],
            source_language: None,
            current_language: None,
            primary_languages: None,
            required_languages: None,
            optional_languages: None,
            diagnostics: DiagnosticsConfig::default(),
            sync: SyncConfig::default(),
            indexing: IndexingConfig::default(),
        }
    }
}
