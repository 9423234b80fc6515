//! Find References implementation.

use std::collections::HashMap;
use std::path::PathBuf;

use tower_lsp::lsp_types::Location;

use crate::db::TrDatabase;
use crate::input::source::SourceFile;
use crate::interned::MessageKey;
use crate::syntax::analyze_source;

/// Finds every source-code usage of a message across the workspace.
///
/// Results are sorted by file path, then position, so clients get a
/// stable order.
pub fn find_references(
    db: &dyn TrDatabase,
    key: MessageKey<'_>,
    source_files: &HashMap<PathBuf, SourceFile>,
) -> Vec<Location> {
    let mut locations = Vec::new();

    for (path, file) in source_files {
        let usages = analyze_source(db, *file);

        for usage in usages {
            if usage.key(db) != key {
                continue;
            }
            let Ok(uri) = tower_lsp::lsp_types::Url::from_file_path(path) else {
                tracing::warn!("Failed to create URI from file path: {}", path.display());
                continue;
            };
            locations.push(Location { uri, range: usage.range(db).into() });
        }
    }

    locations.sort_by(|a, b| {
        a.uri
            .as_str()
            .cmp(b.uri.as_str())
            .then_with(|| a.range.start.line.cmp(&b.range.start.line))
            .then_with(|| a.range.start.character.cmp(&b.range.start.character))
    });
    locations
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::db::TrDatabaseImpl;
    use crate::test_utils::python_source;

    #[googletest::test]
    fn finds_usages_across_files() {
        let db = TrDatabaseImpl::default();
        let mut source_files = HashMap::new();

        source_files.insert(
            PathBuf::from("/ws/commands/import_svg.py"),
            python_source(
                &db,
                "/ws/commands/import_svg.py",
                "a = translate(\"SvgWB\", \"Import\")\nb = translate(\"SvgWB\", \"Export\")\n",
            ),
        );
        source_files.insert(
            PathBuf::from("/ws/preferences.py"),
            python_source(&db, "/ws/preferences.py", "c = dtr(\"SvgWB\", \"Import\")\n"),
        );

        let key = MessageKey::new(&db, "SvgWB".to_string(), "Import".to_string());
        let locations = find_references(&db, key, &source_files);

        assert_that!(locations.len(), eq(2));
        // sorted by path: commands/import_svg.py before preferences.py
        assert_that!(locations[0].uri.path(), ends_with("import_svg.py"));
        assert_that!(locations[1].uri.path(), ends_with("preferences.py"));
    }

    #[googletest::test]
    fn no_usages_yields_empty() {
        let db = TrDatabaseImpl::default();
        let mut source_files = HashMap::new();
        source_files.insert(
            PathBuf::from("/ws/preferences.py"),
            python_source(&db, "/ws/preferences.py", "c = dtr(\"SvgWB\", \"Import\")\n"),
        );

        let key = MessageKey::new(&db, "SvgWB".to_string(), "Never used".to_string());
        let locations = find_references(&db, key, &source_files);

        assert_that!(locations, is_empty());
    }

    #[googletest::test]
    fn same_file_usages_sorted_by_position() {
        let db = TrDatabaseImpl::default();
        let mut source_files = HashMap::new();
        source_files.insert(
            PathBuf::from("/ws/a.py"),
            python_source(
                &db,
                "/ws/a.py",
                "x = dtr(\"SvgWB\", \"Import\")\ny = translate(\"SvgWB\", \"Import\")\n",
            ),
        );

        let key = MessageKey::new(&db, "SvgWB".to_string(), "Import".to_string());
        let locations = find_references(&db, key, &source_files);

        assert_that!(locations.len(), eq(2));
        assert_that!(locations[0].range.start.line, eq(0));
        assert_that!(locations[1].range.start.line, eq(1));
    }
}
