//! Translation catalog input definitions.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use crate::catalog::reader::{CatalogError, MessageId, parse_catalog};
use crate::catalog::model::TsDocument;
use crate::types::{SourcePosition, SourceRange};

/// Locale codes recognized in catalog file names.
///
/// Subset of RFC 5646 covering the locales Qt Linguist catalogs are
/// commonly named after, plus the underscore forms Qt uses in `language`
/// attributes (`de_DE`).
static LOCALE_CODES: LazyLock<HashSet<String>> = LazyLock::new(|| {
    [
        "ar", "bg", "ca", "cs", "da", "de", "de-AT", "de-CH", "de-DE", "el", "en", "en-GB",
        "en-US", "eo", "es", "es-AR", "es-CL", "es-CO", "es-ES", "es-MX", "et", "eu", "fi",
        "fr", "fr-BE", "fr-CA", "fr-CH", "fr-FR", "gl", "he", "hr", "hu", "id", "it", "ja",
        "ka", "ko", "lt", "lv", "nb", "nl", "pl", "pt", "pt-BR", "pt-PT", "ro", "ru", "sk",
        "sl", "sr", "sv", "tr", "uk", "val-ES", "vi", "zh", "zh-CN", "zh-TW",
    ]
    .iter()
    .flat_map(|code| {
        let code = (*code).to_string();
        let normalized = normalize_locale_code(&code);
        vec![code, normalized]
    })
    .collect()
});

/// Normalizes a locale code (lowercase, `-` replaced with `_`).
fn normalize_locale_code(code: &str) -> String {
    code.to_lowercase().replace('-', "_")
}

/// Detects the locale of a catalog from its file name.
///
/// Splits the file stem on `_`, `-` and `.` and searches backwards for a
/// part (or suffix pair) matching a known locale code.
///
/// # Examples
/// - `svgwb_de.ts` → `de`
/// - `svgwb_pt_BR.ts` → `pt_BR`
/// - `translations/fr/app.ts` → `fr`
///
/// # Returns
/// Detected locale code or "unknown".
fn detect_locale_from_path(file_path: &Path) -> String {
    let path_str = file_path.to_string_lossy();
    let parts: Vec<&str> = path_str
        .trim_end_matches(".ts")
        .split(&['/', '.', '_', '-'])
        .filter(|part| !part.is_empty())
        .collect();

    // Two-part suffix first, so `pt_BR` wins over `pt`.
    if parts.len() >= 2
        && let (Some(lang), Some(region)) = (parts.get(parts.len() - 2), parts.last())
    {
        let candidate = format!("{lang}_{region}");
        if LOCALE_CODES.contains(&normalize_locale_code(&candidate)) {
            return candidate;
        }
    }

    for part in parts.iter().rev() {
        if LOCALE_CODES.contains(&normalize_locale_code(part)) {
            return (*part).to_string();
        }
    }

    "unknown".to_string()
}

/// Salsa input representing one parsed catalog file.
#[salsa::input]
pub struct Catalog {
    /// Target locale, e.g. `de_DE`.
    pub locale: String,

    /// Catalog file path.
    #[returns(ref)]
    pub file_path: String,

    /// Parsed document model.
    #[returns(ref)]
    pub doc: TsDocument,

    /// Raw XML text, kept for formatting-preserving edits.
    #[returns(ref)]
    pub xml_text: String,

    /// Range of each message's `<source>` text, for go-to-definition.
    #[returns(ref)]
    pub source_ranges: HashMap<MessageId, SourceRange>,

    /// Range of each message's `<translation>` content, for editing.
    #[returns(ref)]
    pub translation_ranges: HashMap<MessageId, SourceRange>,
}

impl Catalog {
    /// Returns the message identity at a cursor position in the catalog.
    ///
    /// Matches the `<source>` element first, then the `<translation>`.
    pub fn message_at_position(
        self,
        db: &dyn crate::db::TrDatabase,
        position: SourcePosition,
    ) -> Option<crate::interned::MessageKey<'_>> {
        let source_ranges = self.source_ranges(db);
        for ((context, source), range) in source_ranges {
            if range.contains(position) {
                return Some(crate::interned::MessageKey::new(db, context.clone(), source.clone()));
            }
        }

        let translation_ranges = self.translation_ranges(db);
        for ((context, source), range) in translation_ranges {
            if range.contains(position) {
                return Some(crate::interned::MessageKey::new(db, context.clone(), source.clone()));
            }
        }

        None
    }
}

/// Creates a [`Catalog`] input from already-read file content.
///
/// The locale comes from the `language` attribute when present, falling
/// back to the file-name heuristic.
///
/// # Errors
/// Returns [`CatalogError`] if the content does not parse.
pub fn catalog_from_text(
    db: &dyn crate::db::TrDatabase,
    file_path: &Path,
    content: String,
) -> Result<Catalog, CatalogError> {
    let parsed = parse_catalog(&content)?;

    let locale = parsed
        .doc
        .language
        .clone()
        .unwrap_or_else(|| detect_locale_from_path(file_path));

    Ok(Catalog::new(
        db,
        locale,
        file_path.to_string_lossy().to_string(),
        parsed.doc,
        content,
        parsed.source_ranges,
        parsed.translation_ranges,
    ))
}

/// Loads a catalog file and creates a [`Catalog`] input.
///
/// # Errors
/// Returns [`CatalogError`] if the file cannot be read or parsed.
pub fn load_catalog_file(
    db: &dyn crate::db::TrDatabase,
    file_path: &Path,
) -> Result<Catalog, CatalogError> {
    let content = std::fs::read_to_string(file_path)?;
    catalog_from_text(db, file_path, content)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;
    use std::path::Path;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::db::TrDatabaseImpl;

    #[rstest]
    // plain suffix
    #[case("resources/translations/svgwb_de.ts", "de")]
    #[case("resources/translations/svgwb_es.ts", "es")]
    #[case("resources/translations/svgwb_fr.ts", "fr")]
    // two-part locale
    #[case("resources/translations/svgwb_pt_BR.ts", "pt_BR")]
    #[case("app_zh-CN.ts", "zh_CN")]
    // locale as directory
    #[case("translations/fr/app.ts", "fr")]
    // no recognizable locale
    #[case("resources/translations/svgwb.ts", "unknown")]
    fn test_detect_locale_from_path(#[case] path: &str, #[case] expected: &str) {
        let result = detect_locale_from_path(Path::new(path));
        assert_eq!(result, expected);
    }

    #[googletest::test]
    fn load_catalog_file_prefers_language_attribute() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("svgwb_fr.ts");
        fs::write(
            &path,
            "<TS version=\"2.1\" language=\"fr_FR\"><context><name>SvgWB</name></context></TS>",
        )
        .unwrap();

        let db = TrDatabaseImpl::default();
        let catalog = load_catalog_file(&db, &path).unwrap();

        assert_that!(catalog.locale(&db), eq("fr_FR"));
    }

    #[googletest::test]
    fn load_catalog_file_falls_back_to_file_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("svgwb_de.ts");
        fs::write(&path, "<TS version=\"2.1\"><context><name>SvgWB</name></context></TS>").unwrap();

        let db = TrDatabaseImpl::default();
        let catalog = load_catalog_file(&db, &path).unwrap();

        assert_that!(catalog.locale(&db), eq("de"));
    }

    #[googletest::test]
    fn load_catalog_file_rejects_invalid_xml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("svgwb_de.ts");
        fs::write(&path, "not xml at all").unwrap();

        let db = TrDatabaseImpl::default();
        let result = load_catalog_file(&db, &path);

        assert_that!(result, err(anything()));
    }

    #[googletest::test]
    fn message_at_position_finds_source_and_translation() {
        let db = TrDatabaseImpl::default();
        let xml = "<TS version=\"2.1\" language=\"de_DE\"><context><name>SvgWB</name><message>\n\
                   <source>Import</source>\n\
                   <translation>Importieren</translation>\n\
                   </message></context></TS>";
        let parsed = parse_catalog(xml).unwrap();

        let catalog = Catalog::new(
            &db,
            "de_DE".to_string(),
            "/tmp/svgwb_de.ts".to_string(),
            parsed.doc,
            xml.to_string(),
            parsed.source_ranges,
            parsed.translation_ranges,
        );

        // inside <source>Import</source> text on line 1
        let key = catalog.message_at_position(&db, SourcePosition { line: 1, character: 10 });
        assert_that!(key, some(anything()));
        let key = key.unwrap();
        expect_that!(key.context(&db), eq("SvgWB"));
        expect_that!(key.source(&db), eq("Import"));

        // inside the translation text on line 2
        let key = catalog.message_at_position(&db, SourcePosition { line: 2, character: 15 });
        assert_that!(key, some(anything()));

        // outside any message
        let key = catalog.message_at_position(&db, SourcePosition { line: 0, character: 2 });
        expect_that!(key, none());
    }
}
