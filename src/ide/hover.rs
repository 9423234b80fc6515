//! Hover implementation.

use std::fmt::Write as _;

use crate::catalog::model::{TranslationState, TsMessage};
use crate::db::TrDatabase;
use crate::input::catalog::Catalog;
use crate::interned::MessageKey;

/// Max characters of a translation before truncation with ellipsis.
const MAX_VALUE_LENGTH: usize = 60;

/// Generate hover content for a message.
///
/// One line per catalog, `**locale**: value`. Pending and vanished
/// messages are annotated; numerus messages list their forms.
///
/// # Sort order
/// 1. `current_language` (when configured)
/// 2. `primary_languages` (in configured order)
/// 3. everything else, alphabetically
pub fn generate_hover_content(
    db: &dyn TrDatabase,
    key: MessageKey<'_>,
    catalogs: &[Catalog],
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) -> Option<String> {
    let context = key.context(db);
    let source = key.source(db);

    let mut translations_found = Vec::new();

    for catalog in catalogs {
        let locale = catalog.locale(db);
        if let Some(message) = catalog.doc(db).message(context, source) {
            translations_found.push((locale, format_message_value(message)));
        }
    }

    if translations_found.is_empty() {
        return None;
    }

    let mut content = format!("**Source:** `{source}`  \n**Context:** `{context}`\n\n");

    sort_translations_by_priority(&mut translations_found, current_language, primary_languages);

    for (locale, value) in translations_found {
        let _ = writeln!(content, "**{locale}**: {value}");
    }

    Some(content)
}

/// Renders one message's translation for display.
fn format_message_value(message: &TsMessage) -> String {
    if message.numerus {
        return format_numerus_forms(message);
    }

    let text = truncate_string(&message.translation, MAX_VALUE_LENGTH);
    match message.state {
        TranslationState::Finished => text,
        TranslationState::Unfinished if message.translation.is_empty() => {
            "*(unfinished)*".to_string()
        }
        TranslationState::Unfinished => format!("{text} *(unfinished)*"),
        TranslationState::Vanished => format!("{text} *(vanished)*"),
        TranslationState::Obsolete => format!("{text} *(obsolete)*"),
    }
}

/// Renders the numerus forms of a plural-aware message.
fn format_numerus_forms(message: &TsMessage) -> String {
    let mut result = String::from("*(numerus)*");
    if let Some(marker) = message.state.as_attr() {
        let _ = write!(result, " *({marker})*");
    }
    result.push('\n');

    if message.numerus_forms.is_empty() {
        result.push_str("  *(no forms)*");
        return result;
    }

    for (index, form) in message.numerus_forms.iter().enumerate() {
        let value = if form.is_empty() {
            "*(empty)*".to_string()
        } else {
            truncate_string(form, MAX_VALUE_LENGTH)
        };
        let _ = writeln!(result, "  `[{index}]`: {value}");
    }
    result.trim_end().to_string()
}

/// Truncates a string to a display length.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

/// Whether a catalog locale matches a configured language.
///
/// `de` matches both `de` and `de_DE`.
pub(crate) fn locale_matches(candidate: &str, wanted: &str) -> bool {
    candidate == wanted || candidate.strip_prefix(wanted).is_some_and(|rest| rest.starts_with('_'))
}

/// Sorts hover lines by locale priority.
fn sort_translations_by_priority(
    translations: &mut [(String, String)],
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) {
    translations.sort_by(|a, b| {
        let priority_a = get_locale_priority(&a.0, current_language, primary_languages);
        let priority_b = get_locale_priority(&b.0, current_language, primary_languages);

        match (priority_a, priority_b) {
            (LocalePriority::Current, LocalePriority::Current) => std::cmp::Ordering::Equal,
            (LocalePriority::Current, _) => std::cmp::Ordering::Less,
            (_, LocalePriority::Current) => std::cmp::Ordering::Greater,
            (LocalePriority::Primary(a_idx), LocalePriority::Primary(b_idx)) => a_idx.cmp(&b_idx),
            (LocalePriority::Primary(_), _) => std::cmp::Ordering::Less,
            (_, LocalePriority::Primary(_)) => std::cmp::Ordering::Greater,
            (LocalePriority::Other(a_locale), LocalePriority::Other(b_locale)) => {
                a_locale.cmp(b_locale)
            }
        }
    });
}

/// Locale priority for sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LocalePriority<'a> {
    /// The configured current language (highest priority).
    Current,
    /// A primary language with its position index.
    Primary(usize),
    /// Anything else (sorted alphabetically).
    Other(&'a str),
}

/// Computes the priority of one locale.
fn get_locale_priority<'a>(
    locale: &'a str,
    current_language: Option<&str>,
    primary_languages: Option<&[String]>,
) -> LocalePriority<'a> {
    if current_language.is_some_and(|c| locale_matches(locale, c)) {
        return LocalePriority::Current;
    }

    if let Some(primaries) = primary_languages
        && let Some(pos) = primaries.iter().position(|p| locale_matches(locale, p))
    {
        return LocalePriority::Primary(pos);
    }

    LocalePriority::Other(locale)
}
