//! Catalog synchronization: the workspace-wide extraction/merge pass.
//!
//! This is the `qtI18n.syncCatalogs` command. Every translation call in
//! the indexed sources is collected, duplicate sources merge into one
//! message with several locations, and each catalog is merged and
//! rewritten on disk.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::catalog::merge::{ExtractedMessage, MergeOptions, merge_extracted};
use crate::catalog::model::TsLocation;
use crate::catalog::reader::CatalogError;
use crate::catalog::writer::write_catalog;
use crate::config::TrSettings;
use crate::db::TrDatabase;
use crate::input::catalog::Catalog;
use crate::input::source::SourceFile;
use crate::syntax::analyze_source;

/// One message collected from the whole source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedMessage {
    /// Context name.
    pub context: String,
    /// Source string.
    pub source: String,
    /// Disambiguation comment, first one seen.
    pub comment: Option<String>,
    /// Whether any call site passed a count argument.
    pub numerus: bool,
    /// Call sites as `(file, 1-indexed line)`.
    pub sites: Vec<(PathBuf, u32)>,
}

/// What a sync pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Catalogs rewritten on disk.
    pub catalogs_written: usize,
    /// Distinct messages extracted from the sources.
    pub messages_extracted: usize,
    /// Messages added across catalogs.
    pub added: usize,
    /// Messages refreshed across catalogs.
    pub updated: usize,
    /// Messages newly marked vanished across catalogs.
    pub vanished: usize,
    /// Messages dropped across catalogs.
    pub removed: usize,
}

/// Collects every translation call in the workspace, merged by identity.
///
/// Duplicate `(context, source)` extractions collapse into one message
/// with multiple sites, per the catalog uniqueness rule.
#[must_use]
pub fn collect_extracted(
    db: &dyn TrDatabase,
    source_files: &HashMap<PathBuf, SourceFile>,
) -> Vec<CollectedMessage> {
    let mut collected: HashMap<(String, String), CollectedMessage> = HashMap::new();

    // stable iteration order keeps comments deterministic
    let mut paths: Vec<&PathBuf> = source_files.keys().collect();
    paths.sort();

    for path in paths {
        let Some(file) = source_files.get(path) else {
            continue;
        };
        for usage in analyze_source(db, *file) {
            let key = usage.key(db);
            let id = (key.context(db).clone(), key.source(db).clone());
            let entry = collected.entry(id.clone()).or_insert_with(|| CollectedMessage {
                context: id.0,
                source: id.1,
                comment: None,
                numerus: false,
                sites: Vec::new(),
            });
            if entry.comment.is_none() {
                entry.comment = usage.comment(db);
            }
            entry.numerus |= usage.numerus(db);
            entry.sites.push((path.clone(), usage.call_line(db) + 1));
        }
    }

    let mut messages: Vec<CollectedMessage> = collected.into_values().collect();
    for message in &mut messages {
        message.sites.sort();
        message.sites.dedup();
    }
    messages.sort_by(|a, b| (&a.context, &a.source).cmp(&(&b.context, &b.source)));
    messages
}

/// Relative path from a catalog directory to a source file, `/`-separated.
///
/// Qt location references are relative to the catalog file's directory
/// (`../../preferences.py`).
#[must_use]
pub fn relative_location(catalog_dir: &Path, source_file: &Path) -> String {
    let from: Vec<Component<'_>> = catalog_dir.components().collect();
    let to: Vec<Component<'_>> = source_file.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in from.iter().skip(common) {
        parts.push("..".to_string());
    }
    for component in to.iter().skip(common) {
        parts.push(component.as_os_str().to_string_lossy().to_string());
    }
    parts.join("/")
}

/// Runs the extraction/merge pass and rewrites every catalog.
///
/// Catalogs without a `sourcelanguage` get the configured one stamped in.
/// The caller is expected to re-index afterwards so the salsa inputs see
/// the new file contents.
///
/// # Errors
/// Returns [`CatalogError`] when a catalog cannot be written.
pub async fn sync_catalogs(
    db: &dyn TrDatabase,
    source_files: &HashMap<PathBuf, SourceFile>,
    catalogs: &[Catalog],
    settings: &TrSettings,
) -> Result<SyncReport, CatalogError> {
    let collected = collect_extracted(db, source_files);
    let mut report = SyncReport { messages_extracted: collected.len(), ..SyncReport::default() };

    let options = MergeOptions {
        purge_obsolete: settings.sync.purge_obsolete,
        drop_location_lines: settings.sync.drop_location_lines,
    };

    for catalog in catalogs {
        let path = PathBuf::from(catalog.file_path(db));
        let catalog_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let extracted: Vec<ExtractedMessage> = collected
            .iter()
            .map(|message| ExtractedMessage {
                context: message.context.clone(),
                source: message.source.clone(),
                comment: message.comment.clone(),
                numerus: message.numerus,
                locations: message
                    .sites
                    .iter()
                    .map(|(file, line)| TsLocation {
                        filename: relative_location(catalog_dir, file),
                        line: Some(*line),
                    })
                    .collect(),
            })
            .collect();

        let mut doc = catalog.doc(db).clone();
        if doc.source_language.is_none() {
            doc.source_language = settings.source_language.clone();
        }

        let stats = merge_extracted(&mut doc, &extracted, options);
        report.added += stats.added;
        report.updated += stats.updated;
        report.vanished += stats.vanished;
        report.removed += stats.removed;

        let text = write_catalog(&doc);
        tokio::fs::write(&path, text).await?;
        report.catalogs_written += 1;

        tracing::info!(
            catalog = %path.display(),
            added = stats.added,
            updated = stats.updated,
            vanished = stats.vanished,
            removed = stats.removed,
            "Catalog synchronized"
        );
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::catalog::reader::parse_catalog;
    use crate::db::TrDatabaseImpl;
    use crate::input::catalog::load_catalog_file;
    use crate::test_utils::python_source;

    #[rstest]
    #[case::sibling("/ws/translations", "/ws/preferences.py", "../preferences.py")]
    #[case::two_up(
        "/ws/resources/translations",
        "/ws/preferences.py",
        "../../preferences.py"
    )]
    #[case::subdir(
        "/ws/resources/translations",
        "/ws/commands/import_svg.py",
        "../../commands/import_svg.py"
    )]
    #[case::same_dir("/ws", "/ws/preferences.py", "preferences.py")]
    fn test_relative_location(#[case] dir: &str, #[case] file: &str, #[case] expected: &str) {
        let result = relative_location(Path::new(dir), Path::new(file));
        assert_eq!(result, expected);
    }

    #[googletest::test]
    fn collect_merges_duplicate_sources() {
        let db = TrDatabaseImpl::default();
        let mut source_files = HashMap::new();
        source_files.insert(
            PathBuf::from("/ws/preferences.py"),
            python_source(
                &db,
                "/ws/preferences.py",
                "a = dtr(\"SvgWB\", \"Geometry\")\nb = dtr(\"SvgWB\", \"Geometry\")\n",
            ),
        );
        source_files.insert(
            PathBuf::from("/ws/commands/import_svg.py"),
            python_source(
                &db,
                "/ws/commands/import_svg.py",
                "c = translate(\"SvgWB\", \"Geometry\")\n",
            ),
        );

        let collected = collect_extracted(&db, &source_files);

        assert_that!(collected, len(eq(1)));
        let message = &collected[0];
        expect_that!(message.context, eq("SvgWB"));
        expect_that!(message.sites, len(eq(3)));
        // 1-indexed lines
        expect_that!(message.sites[0].1, eq(1));
        expect_that!(message.sites[1].1, eq(1));
        expect_that!(message.sites[2].1, eq(2));
    }

    #[googletest::test]
    fn collect_keeps_first_comment_and_any_numerus() {
        let db = TrDatabaseImpl::default();
        let mut source_files = HashMap::new();
        source_files.insert(
            PathBuf::from("/ws/a.py"),
            python_source(
                &db,
                "/ws/a.py",
                "x = dtr(\"SvgWB\", \"Scale\", \"verb\")\ny = dtr(\"SvgWB\", \"Scale\", None, count)\n",
            ),
        );

        let collected = collect_extracted(&db, &source_files);

        assert_that!(collected, len(eq(1)));
        expect_that!(collected[0].comment, some(eq("verb")));
        expect_that!(collected[0].numerus, eq(true));
    }

    #[tokio::test]
    async fn sync_rewrites_catalog_and_keeps_translations() {
        let workspace = TempDir::new().unwrap();
        let root = workspace.path();
        fs::create_dir_all(root.join("resources/translations")).unwrap();
        let catalog_path = root.join("resources/translations/svgwb_de.ts");
        fs::write(
            &catalog_path,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n\
             <TS version=\"2.1\" language=\"de_DE\">\n<context>\n    <name>SvgWB</name>\n\
             <message>\n        <location filename=\"../../old.py\" line=\"1\"/>\n\
             <source>Import</source>\n        <translation>Importieren</translation>\n\
             </message>\n    <message>\n        <source>Gone</source>\n\
             <translation>Weg</translation>\n    </message>\n</context>\n</TS>\n",
        )
        .unwrap();

        let db = TrDatabaseImpl::default();
        let catalog = load_catalog_file(&db, &catalog_path).unwrap();

        let mut source_files = HashMap::new();
        let source_path = root.join("preferences.py");
        source_files.insert(
            source_path.clone(),
            python_source(
                &db,
                &source_path.to_string_lossy(),
                "a = dtr(\"SvgWB\", \"Import\")\nb = dtr(\"SvgWB\", \"Export\")\n",
            ),
        );

        let settings = TrSettings {
            source_language: Some("en".to_string()),
            ..TrSettings::default()
        };

        let report = sync_catalogs(&db, &source_files, &[catalog], &settings).await.unwrap();

        assert_that!(report.catalogs_written, eq(1));
        assert_that!(report.messages_extracted, eq(2));
        assert_that!(report.added, eq(1));
        assert_that!(report.updated, eq(1));
        assert_that!(report.vanished, eq(1));

        let written = fs::read_to_string(&catalog_path).unwrap();
        let parsed = parse_catalog(&written).unwrap();

        // source language stamped in
        expect_that!(parsed.doc.source_language, some(eq("en")));

        // existing translation kept, location refreshed
        let import = parsed.doc.message("SvgWB", "Import").unwrap();
        expect_that!(import.translation, eq("Importieren"));
        expect_that!(
            import.locations,
            elements_are![eq(&TsLocation {
                filename: "../../preferences.py".to_string(),
                line: Some(1)
            })]
        );

        // new message added unfinished
        let export = parsed.doc.message("SvgWB", "Export").unwrap();
        expect_that!(export.is_pending(), eq(true));

        // disappeared message vanished but kept
        let gone = parsed.doc.message("SvgWB", "Gone").unwrap();
        expect_that!(
            gone.state,
            eq(crate::catalog::model::TranslationState::Vanished)
        );
        expect_that!(gone.translation, eq("Weg"));
    }
}
