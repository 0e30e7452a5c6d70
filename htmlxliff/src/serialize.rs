//! HTML5 serializer for the arena DOM.
//!
//! Output is compact and adds no whitespace, so a serialized document parses
//! back into the same tree. This is what the reconstructor relies on when it
//! writes the translated page.

use indextree::NodeId;

use crate::dom::{Document, ElementData, Namespace, NodeKind};

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text is parsed as raw text and must be written back as-is.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

/// Elements whose leading newline is eaten by the parser.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// How text children of an element are escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextMode {
    /// `&`, `<`, `>` and no-break space
    Escaped,
    /// `title` and `textarea`: `&` and `<` only
    Rcdata,
    Raw,
}

impl TextMode {
    fn of(doc: &Document, node: NodeId) -> Self {
        let data = doc.get(node);
        let NodeKind::Element(elem) = &data.kind else {
            return TextMode::Escaped;
        };
        if data.ns != Namespace::Html {
            return TextMode::Escaped;
        }

        let tag = elem.tag.as_str();
        if RAW_TEXT_ELEMENTS.contains(&tag) {
            TextMode::Raw
        } else if tag == "title" || tag == "textarea" {
            TextMode::Rcdata
        } else {
            TextMode::Escaped
        }
    }
}

/// Serialize a whole document, DOCTYPE included.
pub fn serialize_document(doc: &Document) -> String {
    let mut out = String::new();
    if let Some(name) = &doc.doctype {
        out.push_str("<!DOCTYPE ");
        out.push_str(name);
        out.push('>');
    }
    for child in doc.children(doc.document) {
        write_node(doc, child, TextMode::Escaped, &mut out);
    }
    out
}

/// Serialize the children of a node (its inner HTML).
pub fn serialize_inner(doc: &Document, node: NodeId) -> String {
    let mode = TextMode::of(doc, node);
    let mut out = String::new();
    for child in doc.children(node) {
        write_node(doc, child, mode, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, mode: TextMode, out: &mut String) {
    match &doc.get(node).kind {
        NodeKind::Document => {
            for child in doc.children(node) {
                write_node(doc, child, TextMode::Escaped, out);
            }
        }
        NodeKind::Element(elem) => write_element(doc, node, elem, out),
        NodeKind::Text(text) => match mode {
            TextMode::Raw => out.push_str(text),
            TextMode::Rcdata => escape_text(text, false, out),
            TextMode::Escaped => escape_text(text, true, out),
        },
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(&text.replace("--", "- -"));
            out.push_str("-->");
        }
    }
}

fn write_element(doc: &Document, node: NodeId, elem: &ElementData, out: &mut String) {
    let html = doc.get(node).ns == Namespace::Html;
    let tag = elem.tag.as_str();

    out.push('<');
    out.push_str(tag);
    for (name, value) in &elem.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }

    let mut children = doc.children(node).peekable();

    if html && VOID_ELEMENTS.contains(&tag) {
        out.push('>');
        return;
    }
    if !html && children.peek().is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    if html
        && LEADING_NEWLINE_ELEMENTS.contains(&tag)
        && let Some(&first) = children.peek()
        && let NodeKind::Text(text) = &doc.get(first).kind
        && text.starts_with('\n')
    {
        out.push('\n');
    }

    let mode = TextMode::of(doc, node);
    for child in children {
        write_node(doc, child, mode, out);
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn escape_text(text: &str, escape_gt: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' if escape_gt => out.push_str("&gt;"),
            '\u{a0}' if escape_gt => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

impl Document {
    /// Serialize this document to an HTML string.
    pub fn to_html(&self) -> String {
        serialize_document(self)
    }

    /// Inner HTML of a node.
    pub fn inner_html(&self, node: NodeId) -> String {
        serialize_inner(self, node)
    }
}
