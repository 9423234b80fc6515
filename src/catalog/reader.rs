//! `.ts` catalog XML parsing.
//!
//! Event-based parsing with quick-xml. Besides the document model the
//! reader records the text range of every `<source>` and `<translation>`
//! element so IDE features can navigate into the catalog file.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use crate::catalog::model::{TranslationState, TsContext, TsDocument, TsLocation, TsMessage};
use crate::types::{LineIndex, SourceRange};

/// Errors raised while reading a catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// XML-level parse failure.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute syntax.
    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Unescape failure in text or attribute values.
    #[error("invalid escape sequence: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// Structurally invalid catalog.
    #[error("malformed catalog: {0}")]
    Malformed(String),

    /// File system failure.
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
}

/// Identity of a message inside one catalog: `(context, source)`.
pub type MessageId = (String, String);

/// A parsed catalog plus the element ranges IDE features need.
#[derive(Debug, Clone, Default)]
pub struct ParsedCatalog {
    /// The document model.
    pub doc: TsDocument,
    /// Range of each message's `<source>` text.
    pub source_ranges: HashMap<MessageId, SourceRange>,
    /// Range of each message's `<translation>` content.
    pub translation_ranges: HashMap<MessageId, SourceRange>,
}

/// Element currently capturing character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    /// `<name>` of a context.
    ContextName,
    /// `<source>` of a message.
    Source,
    /// `<translation>` text.
    Translation,
    /// One `<numerusform>` inside a translation.
    NumerusForm,
    /// `<comment>` disambiguation.
    Comment,
}

/// Message under construction, with byte spans for range maps.
#[derive(Debug, Clone, Default)]
struct PendingMessage {
    /// Message fields accumulated so far.
    message: TsMessage,
    /// Byte span of the `<source>` text.
    source_span: Option<(usize, usize)>,
    /// Byte span of the `<translation>` content.
    translation_span: Option<(usize, usize)>,
}

/// Context under construction.
#[derive(Debug, Clone, Default)]
struct PendingContext {
    /// Context name, filled by the `<name>` child.
    name: String,
    /// Finished messages with their spans.
    messages: Vec<PendingMessage>,
}

/// Current byte offset of the reader, saturating on overflow.
fn cursor<R>(reader: &Reader<R>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// Reads an attribute value by name, unescaped.
fn attr_value(tag: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, CatalogError> {
    for attr in tag.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Parses `.ts` XML text into a document model with element ranges.
///
/// # Errors
/// Returns [`CatalogError`] on malformed XML. Unknown elements are
/// skipped so catalogs written by newer Qt versions still load.
#[allow(clippy::too_many_lines, clippy::cognitive_complexity)] // one state machine, intentionally flat
pub fn parse_catalog(xml: &str) -> Result<ParsedCatalog, CatalogError> {
    let mut reader = Reader::from_str(xml);
    let line_index = LineIndex::new(xml);

    let mut doc = TsDocument::default();
    let mut source_ranges = HashMap::new();
    let mut translation_ranges = HashMap::new();

    let mut context: Option<PendingContext> = None;
    let mut pending: Option<PendingMessage> = None;
    let mut field: Option<Field> = None;
    let mut buffer = String::new();
    let mut content_start = 0usize;
    let mut depth = 0usize;

    loop {
        let event_start = cursor(&reader);
        match reader.read_event()? {
            Event::Start(tag) => {
                depth += 1;
                match tag.name().as_ref() {
                    b"TS" => {
                        doc.version = attr_value(&tag, b"version")?;
                        doc.language = attr_value(&tag, b"language")?;
                        doc.source_language = attr_value(&tag, b"sourcelanguage")?;
                    }
                    b"context" => {
                        context = Some(PendingContext::default());
                    }
                    b"name" if pending.is_none() => {
                        field = Some(Field::ContextName);
                        buffer.clear();
                    }
                    b"message" => {
                        let numerus = attr_value(&tag, b"numerus")?.as_deref() == Some("yes");
                        pending = Some(PendingMessage {
                            message: TsMessage { numerus, ..TsMessage::default() },
                            ..PendingMessage::default()
                        });
                    }
                    b"location" => {
                        push_location(&tag, pending.as_mut())?;
                    }
                    b"source" => {
                        field = Some(Field::Source);
                        buffer.clear();
                        content_start = cursor(&reader);
                    }
                    b"translation" => {
                        if let Some(p) = pending.as_mut() {
                            p.message.state = attr_value(&tag, b"type")?
                                .map_or(TranslationState::Finished, |v| {
                                    TranslationState::from_attr(&v)
                                });
                        }
                        field = Some(Field::Translation);
                        buffer.clear();
                        content_start = cursor(&reader);
                    }
                    b"numerusform" => {
                        field = Some(Field::NumerusForm);
                        buffer.clear();
                    }
                    b"comment" => {
                        field = Some(Field::Comment);
                        buffer.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(tag) => match tag.name().as_ref() {
                b"location" => {
                    push_location(&tag, pending.as_mut())?;
                }
                b"translation" => {
                    if let Some(p) = pending.as_mut() {
                        p.message.state = attr_value(&tag, b"type")?
                            .map_or(TranslationState::Finished, |v| {
                                TranslationState::from_attr(&v)
                            });
                        let end = cursor(&reader);
                        p.translation_span = Some((end, end));
                    }
                }
                b"numerusform" => {
                    if let Some(p) = pending.as_mut() {
                        p.message.numerus_forms.push(String::new());
                    }
                }
                _ => {}
            },
            Event::Text(text) => {
                if field.is_some() {
                    buffer.push_str(&text.decode().map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(data) => {
                if field.is_some() {
                    buffer.push_str(&String::from_utf8_lossy(&data));
                }
            }
            // text is split around entity references
            Event::GeneralRef(entity) => {
                if field.is_some() {
                    if let Some(ch) = entity.resolve_char_ref()? {
                        buffer.push(ch);
                    } else {
                        match String::from_utf8_lossy(&entity).as_ref() {
                            "amp" => buffer.push('&'),
                            "lt" => buffer.push('<'),
                            "gt" => buffer.push('>'),
                            "apos" => buffer.push('\''),
                            "quot" => buffer.push('"'),
                            other => {
                                return Err(CatalogError::Malformed(format!(
                                    "unknown entity: &{other};"
                                )));
                            }
                        }
                    }
                }
            }
            Event::End(tag) => {
                depth = depth.saturating_sub(1);
                match tag.name().as_ref() {
                    b"name" => {
                        if field == Some(Field::ContextName)
                            && let Some(c) = context.as_mut()
                        {
                            c.name = buffer.clone();
                        }
                        field = None;
                    }
                    b"source" => {
                        if let Some(p) = pending.as_mut() {
                            p.message.source = buffer.clone();
                            p.source_span = Some((content_start, event_start));
                        }
                        field = None;
                    }
                    b"translation" => {
                        if let Some(p) = pending.as_mut() {
                            if !p.message.numerus {
                                p.message.translation = buffer.clone();
                            }
                            p.translation_span = Some((content_start, event_start));
                        }
                        field = None;
                    }
                    b"numerusform" => {
                        if let Some(p) = pending.as_mut() {
                            p.message.numerus_forms.push(buffer.clone());
                        }
                        // keep capturing the rest of the surrounding translation
                        field = Some(Field::Translation);
                        buffer.clear();
                    }
                    b"comment" => {
                        if let Some(p) = pending.as_mut() {
                            p.message.comment = Some(buffer.clone());
                        }
                        field = None;
                    }
                    b"message" => {
                        if let (Some(c), Some(p)) = (context.as_mut(), pending.take()) {
                            c.messages.push(p);
                        }
                    }
                    b"context" => {
                        if let Some(c) = context.take() {
                            commit_context(
                                c,
                                &line_index,
                                &mut doc,
                                &mut source_ranges,
                                &mut translation_ranges,
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(CatalogError::Malformed("unexpected end of file".to_string()));
    }
    if doc.version.is_none() && doc.contexts.is_empty() {
        return Err(CatalogError::Malformed("no <TS> root element".to_string()));
    }

    Ok(ParsedCatalog { doc, source_ranges, translation_ranges })
}

/// Appends a `<location>` reference to the message under construction.
fn push_location(
    tag: &BytesStart<'_>,
    pending: Option<&mut PendingMessage>,
) -> Result<(), CatalogError> {
    let Some(pending) = pending else {
        return Ok(());
    };
    let filename = attr_value(tag, b"filename")?.unwrap_or_default();
    let line = match attr_value(tag, b"line")? {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
            CatalogError::Malformed(format!("invalid location line: {raw}"))
        })?),
        None => None,
    };
    pending.message.locations.push(TsLocation { filename, line });
    Ok(())
}

/// Moves a finished context into the document and records its ranges.
fn commit_context(
    context: PendingContext,
    line_index: &LineIndex,
    doc: &mut TsDocument,
    source_ranges: &mut HashMap<MessageId, SourceRange>,
    translation_ranges: &mut HashMap<MessageId, SourceRange>,
) {
    let mut ts_context = TsContext::new(context.name.clone());
    for pending in context.messages {
        let id = (context.name.clone(), pending.message.source.clone());
        if let Some((start, end)) = pending.source_span {
            source_ranges.insert(id.clone(), line_index.range(start, end));
        }
        if let Some((start, end)) = pending.translation_span {
            translation_ranges.insert(id, line_index.range(start, end));
        }
        ts_context.messages.push(pending.message);
    }
    doc.contexts.push(ts_context);
}
