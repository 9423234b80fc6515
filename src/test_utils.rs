//! Test helpers shared by several test modules.
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use crate::catalog::model::{TranslationState, TsDocument, TsMessage};
use crate::db::TrDatabaseImpl;
use crate::input::catalog::Catalog;
use crate::input::source::{ProgrammingLanguage, SourceFile};

/// A finished message.
pub(crate) fn finished(source: &str, translation: &str) -> TsMessage {
    TsMessage {
        state: TranslationState::Finished,
        translation: translation.to_string(),
        ..TsMessage::new_unfinished(source, false)
    }
}

/// An untranslated message.
pub(crate) fn unfinished(source: &str) -> TsMessage {
    TsMessage::new_unfinished(source, false)
}

/// Creates a catalog input holding a single message.
pub(crate) fn catalog_with_message(
    db: &TrDatabaseImpl,
    locale: &str,
    file_path: &str,
    context: &str,
    message: TsMessage,
) -> Catalog {
    catalog_with_messages(db, locale, file_path, context, vec![message])
}

/// Creates a catalog input holding several messages in one context.
pub(crate) fn catalog_with_messages(
    db: &TrDatabaseImpl,
    locale: &str,
    file_path: &str,
    context: &str,
    messages: Vec<TsMessage>,
) -> Catalog {
    let mut doc = TsDocument::new(Some(locale.to_string()), None);
    doc.context_mut(context).messages.extend(messages);

    Catalog::new(
        db,
        locale.to_string(),
        file_path.to_string(),
        doc,
        String::new(),
        HashMap::new(),
        HashMap::new(),
    )
}

/// Creates a Python source file input.
pub(crate) fn python_source(db: &TrDatabaseImpl, uri: &str, code: &str) -> SourceFile {
    SourceFile::new(db, uri.to_string(), code.to_string(), ProgrammingLanguage::Python)
}
