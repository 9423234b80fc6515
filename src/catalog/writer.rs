//! `.ts` catalog serialization in Qt Linguist's canonical formatting.
//!
//! Output matches what `lupdate` emits: XML declaration, `<!DOCTYPE TS>`,
//! 4-space indents, one `location` per line, empty `<translation>` bodies
//! for unfinished messages.

use std::fmt::Write as _;

use quick_xml::escape::{escape, partial_escape};

use crate::catalog::model::{TsDocument, TsMessage};

/// Serializes a document to `.ts` XML text.
#[must_use]
pub fn write_catalog(doc: &TsDocument) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n");

    out.push_str("<TS");
    push_attr(&mut out, "version", doc.version.as_deref());
    push_attr(&mut out, "language", doc.language.as_deref());
    push_attr(&mut out, "sourcelanguage", doc.source_language.as_deref());
    out.push_str(">\n");

    for context in &doc.contexts {
        out.push_str("<context>\n");
        let _ = writeln!(out, "    <name>{}</name>", partial_escape(&context.name));
        for message in &context.messages {
            out.push_str(&format_message(message, 4));
        }
        out.push_str("</context>\n");
    }

    out.push_str("</TS>\n");
    out
}

/// Formats one `<message>` block at the given base indent.
///
/// Shared with the formatting-preserving XML edit.
#[must_use]
pub(crate) fn format_message(message: &TsMessage, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let inner = " ".repeat(indent + 4);
    let mut out = String::new();

    if message.numerus {
        let _ = writeln!(out, "{pad}<message numerus=\"yes\">");
    } else {
        let _ = writeln!(out, "{pad}<message>");
    }

    for location in &message.locations {
        let _ = write!(out, "{inner}<location filename=\"{}\"", escape(&location.filename));
        if let Some(line) = location.line {
            let _ = write!(out, " line=\"{line}\"");
        }
        out.push_str("/>\n");
    }

    let _ = writeln!(out, "{inner}<source>{}</source>", partial_escape(&message.source));

    if let Some(comment) = &message.comment {
        let _ = writeln!(out, "{inner}<comment>{}</comment>", partial_escape(comment));
    }

    let type_attr = message
        .state
        .as_attr()
        .map(|value| format!(" type=\"{value}\""))
        .unwrap_or_default();

    if message.numerus {
        let _ = writeln!(out, "{inner}<translation{type_attr}>");
        let form_pad = " ".repeat(indent + 8);
        for form in &message.numerus_forms {
            let _ = writeln!(out, "{form_pad}<numerusform>{}</numerusform>", partial_escape(form));
        }
        let _ = writeln!(out, "{inner}</translation>");
    } else {
        let _ = writeln!(
            out,
            "{inner}<translation{type_attr}>{}</translation>",
            partial_escape(&message.translation)
        );
    }

    let _ = writeln!(out, "{pad}</message>");
    out
}

/// Appends an optional XML attribute.
fn push_attr(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = write!(out, " {name}=\"{}\"", escape(value));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;
    use crate::catalog::model::{TranslationState, TsLocation};
    use crate::catalog::reader::parse_catalog;

    fn sample_doc() -> TsDocument {
        let mut doc = TsDocument::new(Some("de_DE".to_string()), Some("en".to_string()));
        let context = doc.context_mut("SvgWB");
        context.messages.push(TsMessage {
            locations: vec![TsLocation {
                filename: "../../preferences.py".to_string(),
                line: Some(10),
            }],
            state: TranslationState::Finished,
            translation: "Importieren".to_string(),
            ..TsMessage::new_unfinished("Import", false)
        });
        context.messages.push(TsMessage {
            locations: vec![TsLocation {
                filename: "../../preferences.py".to_string(),
                line: Some(19),
            }],
            ..TsMessage::new_unfinished("Disable unit scaling", false)
        });
        doc
    }

    #[googletest::test]
    fn writes_qt_shaped_output() {
        let text = write_catalog(&sample_doc());

        expect_that!(text, starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE TS>\n"));
        expect_that!(
            text,
            contains_substring("<TS version=\"2.1\" language=\"de_DE\" sourcelanguage=\"en\">")
        );
        expect_that!(text, contains_substring("    <name>SvgWB</name>"));
        expect_that!(
            text,
            contains_substring(
                "        <location filename=\"../../preferences.py\" line=\"10\"/>"
            )
        );
        expect_that!(text, contains_substring("        <source>Import</source>"));
        expect_that!(text, contains_substring("        <translation>Importieren</translation>"));
        expect_that!(
            text,
            contains_substring("        <translation type=\"unfinished\"></translation>")
        );
        expect_that!(text, ends_with("</TS>\n"));
    }

    #[googletest::test]
    fn escapes_text_and_attributes() {
        let mut doc = TsDocument::new(None, None);
        doc.context_mut("SvgWB").messages.push(TsMessage::new_unfinished("a < b & c", false));

        let text = write_catalog(&doc);

        expect_that!(text, contains_substring("<source>a &lt; b &amp; c</source>"));
    }

    #[googletest::test]
    fn writes_numerus_forms() {
        let mut doc = TsDocument::new(Some("de_DE".to_string()), None);
        doc.context_mut("SvgWB").messages.push(TsMessage {
            numerus_forms: vec!["%n Pfad".to_string(), "%n Pfade".to_string()],
            ..TsMessage::new_unfinished("Imported %n path(s)", true)
        });

        let text = write_catalog(&doc);

        expect_that!(text, contains_substring("<message numerus=\"yes\">"));
        expect_that!(
            text,
            contains_substring("            <numerusform>%n Pfad</numerusform>")
        );
        expect_that!(
            text,
            contains_substring("            <numerusform>%n Pfade</numerusform>")
        );
    }

    #[googletest::test]
    fn round_trips_through_reader() {
        let doc = sample_doc();

        let text = write_catalog(&doc);
        let parsed = parse_catalog(&text).unwrap();

        assert_eq!(parsed.doc, doc);
    }

    #[googletest::test]
    fn round_trips_comment_and_states() {
        let mut doc = TsDocument::new(Some("fr_FR".to_string()), None);
        doc.context_mut("Validation").messages.push(TsMessage {
            comment: Some("numeric bound".to_string()),
            state: TranslationState::Vanished,
            translation: "La valeur minimale est {}".to_string(),
            ..TsMessage::new_unfinished("Minimum value is {}", false)
        });

        let text = write_catalog(&doc);
        let parsed = parse_catalog(&text).unwrap();

        assert_eq!(parsed.doc, doc);
    }
}
