//! Extraction-merge pass over a catalog.
//!
//! Implements the message lifecycle: extracted strings enter as
//! unfinished, re-extraction refreshes locations, disappeared strings are
//! marked vanished (or purged), and translator-provided text survives
//! every pass.

use std::cmp::Ordering;

use crate::catalog::model::{TranslationState, TsDocument, TsLocation, TsMessage};

/// One message produced by an extraction pass, locations already relative
/// to the target catalog's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMessage {
    /// Context name.
    pub context: String,
    /// Source string.
    pub source: String,
    /// Disambiguation comment, if the call supplied one.
    pub comment: Option<String>,
    /// Whether the call passed a count argument.
    pub numerus: bool,
    /// Extraction sites, sorted.
    pub locations: Vec<TsLocation>,
}

/// Knobs for the merge pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Drop disappeared messages instead of marking them vanished.
    pub purge_obsolete: bool,
    /// Strip line numbers from location references.
    pub drop_location_lines: bool,
}

/// What a merge pass did, for logging and client reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Messages added as unfinished.
    pub added: usize,
    /// Existing messages whose locations were refreshed.
    pub updated: usize,
    /// Messages newly marked vanished.
    pub vanished: usize,
    /// Messages dropped by `purge_obsolete`.
    pub removed: usize,
}

/// Merges an extraction result into a catalog in place.
///
/// After the merge, contexts are sorted by name and messages by first
/// location, matching the order Qt tooling produces.
pub fn merge_extracted(
    doc: &mut TsDocument,
    extracted: &[ExtractedMessage],
    options: MergeOptions,
) -> MergeStats {
    let mut stats = MergeStats::default();

    // Identity of everything the extraction pass saw.
    let seen: Vec<(&str, &str)> =
        extracted.iter().map(|m| (m.context.as_str(), m.source.as_str())).collect();

    for item in extracted {
        let context = doc.context_mut(&item.context);
        if let Some(message) = context.message_mut(&item.source) {
            refresh_message(message, item);
            stats.updated += 1;
        } else {
            let mut message = TsMessage::new_unfinished(item.source.clone(), item.numerus);
            message.comment = item.comment.clone();
            message.locations = item.locations.clone();
            message.locations.sort();
            context.messages.push(message);
            stats.added += 1;
        }
    }

    retire_unseen(doc, &seen, options, &mut stats);

    if options.drop_location_lines {
        for message in doc.contexts.iter_mut().flat_map(|c| c.messages.iter_mut()) {
            for location in &mut message.locations {
                location.line = None;
            }
        }
    }

    doc.contexts.retain(|c| !c.messages.is_empty());
    doc.contexts.sort_by(|a, b| a.name.cmp(&b.name));
    for context in &mut doc.contexts {
        context.messages.sort_by(compare_messages);
    }

    stats
}

/// Updates a surviving message from its fresh extraction.
///
/// Translator-provided text and state are preserved; only provenance and
/// lifecycle markers change. A vanished message that reappears is revived.
fn refresh_message(message: &mut TsMessage, item: &ExtractedMessage) {
    message.locations = item.locations.clone();
    message.locations.sort();
    message.numerus = item.numerus;
    if item.comment.is_some() {
        message.comment = item.comment.clone();
    }
    if matches!(message.state, TranslationState::Vanished | TranslationState::Obsolete) {
        message.state = if message.has_translation() {
            TranslationState::Finished
        } else {
            TranslationState::Unfinished
        };
    }
}

/// Marks or removes messages the extraction pass no longer produced.
fn retire_unseen(
    doc: &mut TsDocument,
    seen: &[(&str, &str)],
    options: MergeOptions,
    stats: &mut MergeStats,
) {
    for context in &mut doc.contexts {
        let name = context.name.clone();
        if options.purge_obsolete {
            let before = context.messages.len();
            context
                .messages
                .retain(|m| seen.contains(&(name.as_str(), m.source.as_str())));
            stats.removed += before - context.messages.len();
        } else {
            for message in &mut context.messages {
                let is_seen = seen.contains(&(name.as_str(), message.source.as_str()));
                if !is_seen
                    && !matches!(
                        message.state,
                        TranslationState::Vanished | TranslationState::Obsolete
                    )
                {
                    message.state = TranslationState::Vanished;
                    message.locations.clear();
                    stats.vanished += 1;
                }
            }
        }
    }
}

/// Catalog output order: first location (file, then line), then source.
fn compare_messages(a: &TsMessage, b: &TsMessage) -> Ordering {
    match (a.locations.first(), b.locations.first()) {
        (None, None) => a.source.cmp(&b.source),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x
            .filename
            .cmp(&y.filename)
            .then(x.line.cmp(&y.line))
            .then_with(|| a.source.cmp(&b.source)),
    }
}
