//! In-memory model of a Qt Linguist `.ts` catalog.

/// Lifecycle state of a message's translation.
///
/// A message with no `type` attribute is finished. `vanished` and
/// `obsolete` mark messages whose source string no longer exists in the
/// code; Linguist keeps them so translator work is not lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationState {
    /// Translated and still present in the sources.
    Finished,
    /// Present in the sources, translation pending.
    #[default]
    Unfinished,
    /// Source string disappeared after the last extraction pass.
    Vanished,
    /// Legacy marker for disappeared messages (pre-Qt5 `vanished`).
    Obsolete,
}

impl TranslationState {
    /// The `type` attribute value, or `None` for finished messages.
    #[must_use]
    pub const fn as_attr(self) -> Option<&'static str> {
        match self {
            Self::Finished => None,
            Self::Unfinished => Some("unfinished"),
            Self::Vanished => Some("vanished"),
            Self::Obsolete => Some("obsolete"),
        }
    }

    /// Parses a `type` attribute value. Unknown values read as finished.
    #[must_use]
    pub fn from_attr(value: &str) -> Self {
        match value {
            "unfinished" => Self::Unfinished,
            "vanished" => Self::Vanished,
            "obsolete" => Self::Obsolete,
            _ => Self::Finished,
        }
    }
}

/// A `(filename, line)` provenance reference.
///
/// Filenames are relative to the catalog file's directory, Qt convention.
/// The line is absent for file-only references (`-no-lines` output).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TsLocation {
    /// Path relative to the catalog directory.
    pub filename: String,
    /// 1-indexed line, if recorded.
    pub line: Option<u32>,
}

/// One translatable message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TsMessage {
    /// Canonical source string, the lookup key within a context.
    pub source: String,
    /// Disambiguation comment, if any.
    pub comment: Option<String>,
    /// Provenance references, informational only.
    pub locations: Vec<TsLocation>,
    /// Whether this is a plural-aware message.
    pub numerus: bool,
    /// Translation lifecycle state.
    pub state: TranslationState,
    /// Translated text. Empty while unfinished.
    pub translation: String,
    /// Per-plurality translations for numerus messages.
    pub numerus_forms: Vec<String>,
}

impl TsMessage {
    /// A freshly extracted message with no translation yet.
    #[must_use]
    pub fn new_unfinished(source: impl Into<String>, numerus: bool) -> Self {
        Self {
            source: source.into(),
            comment: None,
            locations: Vec::new(),
            numerus,
            state: TranslationState::Unfinished,
            translation: String::new(),
            numerus_forms: if numerus { vec![String::new()] } else { Vec::new() },
        }
    }

    /// Whether any translated text has been supplied.
    #[must_use]
    pub fn has_translation(&self) -> bool {
        if self.numerus {
            self.numerus_forms.iter().any(|form| !form.is_empty())
        } else {
            !self.translation.is_empty()
        }
    }

    /// Whether the message still needs translator attention.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !matches!(self.state, TranslationState::Finished) || !self.has_translation()
    }
}

/// A named group of messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TsContext {
    /// Context name, e.g. `SvgWB`, `Preferences`, `Validation`.
    pub name: String,
    /// Messages, unique by source string.
    pub messages: Vec<TsMessage>,
}

impl TsContext {
    /// An empty context.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), messages: Vec::new() }
    }

    /// Looks up a message by its source string.
    #[must_use]
    pub fn message(&self, source: &str) -> Option<&TsMessage> {
        self.messages.iter().find(|m| m.source == source)
    }

    /// Mutable lookup by source string.
    pub fn message_mut(&mut self, source: &str) -> Option<&mut TsMessage> {
        self.messages.iter_mut().find(|m| m.source == source)
    }
}

/// A whole catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TsDocument {
    /// TS format version, e.g. `2.1`.
    pub version: Option<String>,
    /// Target locale, e.g. `de_DE`.
    pub language: Option<String>,
    /// Language of the source strings, usually `en`.
    pub source_language: Option<String>,
    /// Contexts, unique by name.
    pub contexts: Vec<TsContext>,
}

impl TsDocument {
    /// An empty catalog for the given locale.
    #[must_use]
    pub fn new(language: Option<String>, source_language: Option<String>) -> Self {
        Self {
            version: Some("2.1".to_string()),
            language,
            source_language,
            contexts: Vec::new(),
        }
    }

    /// Looks up a context by name.
    #[must_use]
    pub fn context(&self, name: &str) -> Option<&TsContext> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Looks up a context by name, creating it if absent.
    pub fn context_mut(&mut self, name: &str) -> &mut TsContext {
        let index = match self.contexts.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.contexts.push(TsContext::new(name));
                self.contexts.len() - 1
            }
        };
        #[allow(clippy::indexing_slicing)] // index is in bounds by construction
        let context = &mut self.contexts[index];
        context
    }

    /// Looks up a message by `(context, source)`.
    #[must_use]
    pub fn message(&self, context: &str, source: &str) -> Option<&TsMessage> {
        self.context(context).and_then(|c| c.message(source))
    }

    /// Total message count across contexts.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.contexts.iter().map(|c| c.messages.len()).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::finished("whatever-unknown", TranslationState::Finished)]
    #[case::unfinished("unfinished", TranslationState::Unfinished)]
    #[case::vanished("vanished", TranslationState::Vanished)]
    #[case::obsolete("obsolete", TranslationState::Obsolete)]
    fn state_from_attr(#[case] attr: &str, #[case] expected: TranslationState) {
        assert_that!(TranslationState::from_attr(attr), eq(expected));
    }

    #[googletest::test]
    fn state_attr_round_trip() {
        for state in [
            TranslationState::Unfinished,
            TranslationState::Vanished,
            TranslationState::Obsolete,
        ] {
            let attr = state.as_attr().unwrap();
            expect_that!(TranslationState::from_attr(attr), eq(state));
        }
        expect_that!(TranslationState::Finished.as_attr(), none());
    }

    #[googletest::test]
    fn new_unfinished_numerus_gets_empty_form() {
        let message = TsMessage::new_unfinished("%n files", true);

        expect_that!(message.numerus_forms, elements_are![eq("")]);
        expect_that!(message.has_translation(), eq(false));
        expect_that!(message.is_pending(), eq(true));
    }

    #[googletest::test]
    fn finished_message_is_not_pending() {
        let message = TsMessage {
            state: TranslationState::Finished,
            translation: "Importieren".to_string(),
            ..TsMessage::new_unfinished("Import", false)
        };

        expect_that!(message.is_pending(), eq(false));
    }

    #[googletest::test]
    fn finished_without_text_is_still_pending() {
        let message = TsMessage {
            state: TranslationState::Finished,
            ..TsMessage::new_unfinished("Import", false)
        };

        expect_that!(message.is_pending(), eq(true));
    }

    #[googletest::test]
    fn context_mut_creates_once() {
        let mut doc = TsDocument::new(Some("de_DE".to_string()), None);

        doc.context_mut("SvgWB").messages.push(TsMessage::new_unfinished("Import", false));
        doc.context_mut("SvgWB").messages.push(TsMessage::new_unfinished("Export", false));

        expect_that!(doc.contexts, len(eq(1)));
        expect_that!(doc.message_count(), eq(2));
        expect_that!(doc.message("SvgWB", "Import"), some(anything()));
        expect_that!(doc.message("SvgWB", "Missing"), none());
    }
}
