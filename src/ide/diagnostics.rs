//! Diagnostics generation.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

use crate::catalog::model::TranslationState;
use crate::config::TrSettings;
use crate::db::TrDatabase;
use crate::input::catalog::Catalog;
use crate::input::source::SourceFile;
use crate::syntax::analyze_source;

/// Diagnostic code for messages absent from one or more catalogs.
pub const MISSING_MESSAGE: &str = "missing-message";

/// Diagnostic code for messages with pending translations.
pub const UNFINISHED_TRANSLATION: &str = "unfinished-translation";

/// Diagnostic source tag.
const SOURCE: &str = "qt-i18n";

/// Generates diagnostics for one source file.
///
/// Each translation call is checked against every required catalog:
/// a missing (or vanished) entry produces a warning, a present but
/// untranslated entry an information diagnostic. Both checks can be
/// switched off in the settings.
pub fn generate_diagnostics(
    db: &dyn TrDatabase,
    source_file: SourceFile,
    catalogs: &[Catalog],
    settings: &TrSettings,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    tracing::debug!("Generating diagnostics for source file '{}'", source_file.uri(db));
    let usages = analyze_source(db, source_file);

    for usage in usages {
        let key = usage.key(db);
        let context = key.context(db);
        let source = key.source(db);

        // skip empty strings (mid-edit state)
        if source.is_empty() {
            continue;
        }

        let mut missing_locales = Vec::new();
        let mut pending_locales = Vec::new();

        for catalog in catalogs {
            let locale = catalog.locale(db);
            if !settings.locale_is_required(&locale) {
                continue;
            }

            match catalog.doc(db).message(context, source) {
                None => missing_locales.push(locale),
                Some(message)
                    if matches!(
                        message.state,
                        TranslationState::Vanished | TranslationState::Obsolete
                    ) =>
                {
                    // stale entry: the string is evidently back in the sources
                    missing_locales.push(locale);
                }
                Some(message) if message.is_pending() => pending_locales.push(locale),
                Some(_) => {}
            }
        }

        let range = usage.range(db);

        if settings.diagnostics.missing_messages && !missing_locales.is_empty() {
            diagnostics.push(Diagnostic {
                range: range.into(),
                severity: Some(DiagnosticSeverity::WARNING),
                code: Some(NumberOrString::String(MISSING_MESSAGE.to_string())),
                code_description: None,
                source: Some(SOURCE.to_string()),
                message: format!(
                    "Message '{source}' ({context}) is missing from catalogs: {}",
                    missing_locales.join(", ")
                ),
                related_information: None,
                tags: None,
                data: Some(serde_json::json!({
                    "context": context,
                    "source": source,
                    "numerus": usage.numerus(db),
                    "missing_locales": missing_locales,
                })),
            });
        }

        if settings.diagnostics.unfinished && !pending_locales.is_empty() {
            diagnostics.push(Diagnostic {
                range: range.into(),
                severity: Some(DiagnosticSeverity::INFORMATION),
                code: Some(NumberOrString::String(UNFINISHED_TRANSLATION.to_string())),
                code_description: None,
                source: Some(SOURCE.to_string()),
                message: format!(
                    "Translation of '{source}' is pending in: {}",
                    pending_locales.join(", ")
                ),
                related_information: None,
                tags: None,
                data: None,
            });
        }
    }

    diagnostics
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::db::TrDatabaseImpl;
    use crate::test_utils::{catalog_with_message, finished, python_source, unfinished};

    #[googletest::test]
    fn reports_missing_message() {
        let db = TrDatabaseImpl::default();
        let source_file = python_source(
            &db,
            "import_svg.py",
            "a = translate(\"SvgWB\", \"Import Svg\")\nb = translate(\"SvgWB\", \"Export Svg\")\n",
        );
        let catalog = catalog_with_message(
            &db,
            "de_DE",
            "/t/svgwb_de.ts",
            "SvgWB",
            finished("Import Svg", "Svg importieren"),
        );

        let diagnostics =
            generate_diagnostics(&db, source_file, &[catalog], &TrSettings::default());

        expect_that!(
            diagnostics,
            elements_are![all![
                field!(Diagnostic.message, contains_substring("Export Svg")),
                field!(Diagnostic.message, contains_substring("de_DE")),
                field!(Diagnostic.severity, some(eq(&DiagnosticSeverity::WARNING))),
                field!(
                    Diagnostic.code,
                    some(eq(&NumberOrString::String(MISSING_MESSAGE.to_string())))
                ),
            ]]
        );
        let data = diagnostics[0].data.as_ref().unwrap();
        expect_that!(data.get("context").unwrap().as_str(), some(eq("SvgWB")));
        expect_that!(data.get("source").unwrap().as_str(), some(eq("Export Svg")));
    }

    #[googletest::test]
    fn reports_pending_translation_as_information() {
        let db = TrDatabaseImpl::default();
        let source_file =
            python_source(&db, "import_svg.py", "a = translate(\"SvgWB\", \"Import Svg\")\n");
        let catalog =
            catalog_with_message(&db, "fr_FR", "/t/svgwb_fr.ts", "SvgWB", unfinished("Import Svg"));

        let diagnostics =
            generate_diagnostics(&db, source_file, &[catalog], &TrSettings::default());

        expect_that!(
            diagnostics,
            elements_are![all![
                field!(Diagnostic.message, contains_substring("pending")),
                field!(Diagnostic.severity, some(eq(&DiagnosticSeverity::INFORMATION))),
            ]]
        );
    }

    #[googletest::test]
    fn vanished_entry_counts_as_missing() {
        let db = TrDatabaseImpl::default();
        let source_file =
            python_source(&db, "import_svg.py", "a = translate(\"SvgWB\", \"Import Svg\")\n");
        let message = crate::catalog::model::TsMessage {
            state: crate::catalog::model::TranslationState::Vanished,
            translation: "Svg importieren".to_string(),
            ..crate::catalog::model::TsMessage::new_unfinished("Import Svg", false)
        };
        let catalog = catalog_with_message(&db, "de_DE", "/t/svgwb_de.ts", "SvgWB", message);

        let diagnostics =
            generate_diagnostics(&db, source_file, &[catalog], &TrSettings::default());

        expect_that!(
            diagnostics,
            elements_are![field!(
                Diagnostic.code,
                some(eq(&NumberOrString::String(MISSING_MESSAGE.to_string())))
            )]
        );
    }

    #[googletest::test]
    fn all_messages_translated_yields_no_diagnostics() {
        let db = TrDatabaseImpl::default();
        let source_file =
            python_source(&db, "import_svg.py", "a = translate(\"SvgWB\", \"Import Svg\")\n");
        let catalog = catalog_with_message(
            &db,
            "de_DE",
            "/t/svgwb_de.ts",
            "SvgWB",
            finished("Import Svg", "Svg importieren"),
        );

        let diagnostics =
            generate_diagnostics(&db, source_file, &[catalog], &TrSettings::default());

        expect_that!(diagnostics, is_empty());
    }

    #[googletest::test]
    fn optional_locale_is_not_reported() {
        let db = TrDatabaseImpl::default();
        let source_file =
            python_source(&db, "import_svg.py", "a = translate(\"SvgWB\", \"Import Svg\")\n");
        let catalog =
            catalog_with_message(&db, "fr_FR", "/t/svgwb_fr.ts", "SvgWB", unfinished("Import Svg"));

        let settings = TrSettings {
            optional_languages: Some(vec!["fr_FR".to_string()]),
            ..TrSettings::default()
        };

        let diagnostics = generate_diagnostics(&db, source_file, &[catalog], &settings);

        expect_that!(diagnostics, is_empty());
    }

    #[googletest::test]
    fn toggles_disable_checks() {
        let db = TrDatabaseImpl::default();
        let source_file =
            python_source(&db, "import_svg.py", "a = translate(\"SvgWB\", \"Export Svg\")\n");
        let catalog =
            catalog_with_message(&db, "de_DE", "/t/svgwb_de.ts", "SvgWB", unfinished("Import Svg"));

        let mut settings = TrSettings::default();
        settings.diagnostics.missing_messages = false;

        let diagnostics = generate_diagnostics(&db, source_file, &[catalog], &settings);

        expect_that!(diagnostics, is_empty());
    }
}
