//! Formatting-preserving edits on raw catalog XML.
//!
//! The code action path edits catalog files without re-serializing the
//! whole document, so hand-tuned files keep their byte-for-byte layout
//! outside the inserted block.

use crate::catalog::model::TsMessage;
use crate::catalog::writer::format_message;

/// Inserts a message into the raw XML text of a catalog.
///
/// The message lands at the end of the named context, or in a fresh
/// context appended before `</TS>` when the context does not exist yet.
/// Returns `None` when the text has no `</TS>` close tag to anchor on.
#[must_use]
pub fn insert_message(xml: &str, context: &str, message: &TsMessage) -> Option<String> {
    let block = format_message(message, 4);

    if let Some(insert_at) = context_close_offset(xml, context) {
        let mut out = String::with_capacity(xml.len() + block.len());
        out.push_str(xml.get(..insert_at)?);
        out.push_str(&block);
        out.push_str(xml.get(insert_at..)?);
        return Some(out);
    }

    let ts_close = xml.rfind("</TS>")?;
    let mut out = String::with_capacity(xml.len() + block.len() + 64);
    out.push_str(xml.get(..ts_close)?);
    out.push_str("<context>\n");
    out.push_str(&format!("    <name>{}</name>\n", quick_xml::escape::partial_escape(context)));
    out.push_str(&block);
    out.push_str("</context>\n");
    out.push_str(xml.get(ts_close..)?);
    Some(out)
}

/// Byte offset of the `</context>` closing the named context.
///
/// Anchors on the `<name>` element, then scans forward for the close tag.
fn context_close_offset(xml: &str, context: &str) -> Option<usize> {
    let name_tag =
        format!("<name>{}</name>", quick_xml::escape::partial_escape(context));
    let name_at = xml.find(&name_tag)?;
    let close_rel = xml.get(name_at..)?.find("</context>")?;
    Some(name_at + close_rel)
}
