//! Inline markup <-> XLIFF inline codes.
//!
//! Forward: the children of a segment become a flat run of text and
//! placeholders. Void elements turn into one `<ph>`; every other element is
//! bracketed by a `<bpt>`/`<ept>` pair sharing an id, with its own children
//! tokenized in between. Ids come from a per-tag-name counter that lives for
//! one tokenization call, so two sibling `<b>` get 1 and 2 while a nested
//! `<i>` starts again at 1.
//!
//! Reverse: inline codes are unwrapped back into the tag text they carry.

use indextree::NodeId;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::dom::{self, Document, NodeKind};
use crate::tracing_macros::debug;

/// Elements that become a single `<ph>` placeholder.
pub const VOID_TAGS: &[&str] = &[
    "br", "hr", "img", "input", "link", "base", "wbr", "area", "embed", "col", "source", "track",
];

/// One piece of tokenized segment content.
///
/// `code` is the literal tag text (`<b>`, `</b>`, `<br/>`); it gets escaped
/// once, when the XLIFF document is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineNode {
    Text(String),
    Ph { id: u32, code: String },
    Bpt { id: u32, code: String },
    Ept { id: u32, code: String },
}

impl InlineNode {
    /// XLIFF element name of a placeholder, `None` for text.
    pub fn element_name(&self) -> Option<&'static str> {
        match self {
            InlineNode::Text(_) => None,
            InlineNode::Ph { .. } => Some("ph"),
            InlineNode::Bpt { .. } => Some("bpt"),
            InlineNode::Ept { .. } => Some("ept"),
        }
    }
}

/// Last id handed out per lowercase tag name.
#[derive(Debug, Default)]
pub struct TagCounters {
    last: HashMap<String, u32>,
}

impl TagCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for `tag`, starting at 1.
    pub fn next(&mut self, tag: &str) -> u32 {
        let counter = self.last.entry(tag.to_ascii_lowercase()).or_insert(0);
        *counter += 1;
        *counter
    }
}

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Tokenize an inner-HTML fragment.
///
/// The fragment is parsed inside a synthetic container. If it does not stay
/// inside that container (a stray end tag closing it early, say), the whole
/// fragment is kept as one literal text node instead.
pub fn tokenize_fragment(html: &str) -> Vec<InlineNode> {
    let fragment = dom::parse_fragment(html, "div");
    if fragment.escaped() {
        debug!("fragment does not nest cleanly, keeping it as literal text");
        return vec![InlineNode::Text(html.to_owned())];
    }

    let doc = fragment.document();
    let mut counters = TagCounters::new();
    let mut out = Vec::new();
    for node in fragment.nodes() {
        tokenize_node(doc, node, &mut counters, &mut out);
    }
    out
}

/// Tokenize the children of `parent` with a fresh set of counters.
pub fn tokenize_children(doc: &Document, parent: NodeId) -> Vec<InlineNode> {
    let mut counters = TagCounters::new();
    let mut out = Vec::new();
    for child in doc.children(parent) {
        tokenize_node(doc, child, &mut counters, &mut out);
    }
    out
}

/// Tokenize one node, text nodes included (used for bare text segments).
pub fn tokenize_node_alone(doc: &Document, node: NodeId) -> Vec<InlineNode> {
    let mut counters = TagCounters::new();
    let mut out = Vec::new();
    tokenize_node(doc, node, &mut counters, &mut out);
    out
}

fn tokenize_node(
    doc: &Document,
    node: NodeId,
    counters: &mut TagCounters,
    out: &mut Vec<InlineNode>,
) {
    match &doc.get(node).kind {
        NodeKind::Text(text) => push_text(out, text),
        NodeKind::Element(elem) => {
            let tag = elem.tag.to_ascii_lowercase();
            let id = counters.next(&tag);
            let attrs = elem.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()));

            if is_void_tag(&tag) {
                out.push(InlineNode::Ph {
                    id,
                    code: start_tag(&tag, attrs, true),
                });
                return;
            }

            out.push(InlineNode::Bpt {
                id,
                code: start_tag(&tag, attrs, false),
            });
            for child in doc.children(node) {
                tokenize_node(doc, child, counters, out);
            }
            out.push(InlineNode::Ept {
                id,
                code: format!("</{tag}>"),
            });
        }
        NodeKind::Comment(_) | NodeKind::Document => {}
    }
}

/// Adjacent text runs are merged so the output has no empty splits.
fn push_text(out: &mut Vec<InlineNode>, text: &str) {
    if let Some(InlineNode::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(InlineNode::Text(text.to_owned()));
    }
}

/// Rebuild a start tag with its attributes in source order.
fn start_tag<'a>(
    tag: &str,
    attrs: impl Iterator<Item = (&'a str, &'a str)>,
    self_closing: bool,
) -> String {
    let mut code = format!("<{tag}");
    for (name, value) in attrs {
        code.push(' ');
        code.push_str(name);
        code.push_str("=\"");
        code.push_str(&html_escape::encode_double_quoted_attribute(value));
        code.push('"');
    }
    code.push_str(if self_closing { "/>" } else { ">" });
    code
}

static BPT: LazyLock<Regex> = LazyLock::new(|| wrapper_regex("bpt"));
static EPT: LazyLock<Regex> = LazyLock::new(|| wrapper_regex("ept"));
static PH: LazyLock<Regex> = LazyLock::new(|| wrapper_regex("ph"));

fn wrapper_regex(name: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{name}\b[^>]*>(.*?)</{name}\s*>"))
        .expect("inline code pattern is valid")
}

/// Turn inline codes back into HTML.
///
/// `xml` is the raw inner XML of a `<source>` or `<target>` element. Tag text
/// inside the codes was escaped when written, so entities are decoded twice
/// before the `<bpt>`, `<ept>` and `<ph>` wrappers are stripped. The result is
/// not checked for balance; the HTML parser downstream copes with that.
pub fn revert_inline(xml: &str) -> String {
    let once = html_escape::decode_html_entities(xml);
    let twice = html_escape::decode_html_entities(&once).into_owned();

    let mut html = twice;
    for pattern in [&*BPT, &*EPT, &*PH] {
        html = pattern.replace_all(&html, "$1").into_owned();
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ph(id: u32, code: &str) -> InlineNode {
        InlineNode::Ph {
            id,
            code: code.to_owned(),
        }
    }

    fn bpt(id: u32, code: &str) -> InlineNode {
        InlineNode::Bpt {
            id,
            code: code.to_owned(),
        }
    }

    fn ept(id: u32, code: &str) -> InlineNode {
        InlineNode::Ept {
            id,
            code: code.to_owned(),
        }
    }

    fn text(s: &str) -> InlineNode {
        InlineNode::Text(s.to_owned())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(tokenize_fragment("just words"), vec![text("just words")]);
    }

    #[test]
    fn test_nested_pairs_share_ids() {
        let nodes = tokenize_fragment("<b>a<i>b</i>c</b>");
        assert_eq!(
            nodes,
            vec![
                bpt(1, "<b>"),
                text("a"),
                bpt(1, "<i>"),
                text("b"),
                ept(1, "</i>"),
                text("c"),
                ept(1, "</b>"),
            ]
        );
    }

    #[test]
    fn test_counters_are_per_tag_name() {
        let nodes = tokenize_fragment("<b>x</b> and <b>y<i>z</i></b>");
        let ids: Vec<_> = nodes
            .iter()
            .filter_map(|n| match n {
                InlineNode::Bpt { id, code } => Some((code.as_str(), *id)),
                _ => None,
            })
            .collect();
        assert_eq!(ids, [("<b>", 1), ("<b>", 2), ("<i>", 1)]);
    }

    #[test]
    fn test_void_element_is_single_ph() {
        let nodes = tokenize_fragment("one<br/>two");
        assert_eq!(nodes, vec![text("one"), ph(1, "<br/>"), text("two")]);
    }

    #[test]
    fn test_attributes_keep_order_and_escape() {
        let nodes = tokenize_fragment(r#"<a href="x?a=1&amp;b=2" title="say &quot;hi&quot;">l</a><img src="p.png" alt="">"#);
        assert_eq!(
            nodes,
            vec![
                bpt(1, r#"<a href="x?a=1&amp;b=2" title="say &quot;hi&quot;">"#),
                text("l"),
                ept(1, "</a>"),
                ph(1, r#"<img src="p.png" alt=""/>"#),
            ]
        );
    }

    #[test]
    fn test_escaping_fragment_falls_back_to_text() {
        let nodes = tokenize_fragment("broken</div>tail");
        assert_eq!(nodes, vec![text("broken</div>tail")]);
    }

    #[test]
    fn test_counters_restart_per_call() {
        let first = tokenize_fragment("<b>a</b>");
        let second = tokenize_fragment("<b>b</b>");
        assert_eq!(first[0], bpt(1, "<b>"));
        assert_eq!(second[0], bpt(1, "<b>"));
    }

    #[test]
    fn test_tokenize_children_of_document_node() {
        let doc = dom::parse("<body><p>Hello <b>World</b><!-- note --></p></body>");
        let body = doc.body().expect("body");
        let p = doc.children(body).next().expect("p");
        assert_eq!(
            tokenize_children(&doc, p),
            vec![text("Hello "), bpt(1, "<b>"), text("World"), ept(1, "</b>")]
        );
    }

    #[test]
    fn test_revert_pair() {
        let xml = r#"Hello <bpt id="1">&lt;b&gt;</bpt>World<ept id="1">&lt;/b&gt;</ept>"#;
        assert_eq!(revert_inline(xml), "Hello <b>World</b>");
    }

    #[test]
    fn test_revert_ph() {
        let xml = r#"a<ph id="1">&lt;br/&gt;</ph>b"#;
        assert_eq!(revert_inline(xml), "a<br/>b");
    }

    #[test]
    fn test_revert_is_case_insensitive_and_multiline() {
        let xml = "<BPT id=\"1\">&lt;p\nclass=\"x\"&gt;</BPT>t<EPT id=\"1\">&lt;/p&gt;</EPT>";
        assert_eq!(revert_inline(xml), "<p\nclass=\"x\">t</p>");
    }

    #[test]
    fn test_revert_decodes_double_escaped_attributes() {
        let xml = r#"<bpt id="1">&lt;a href="x?a=1&amp;amp;b=2"&gt;</bpt>l<ept id="1">&lt;/a&gt;</ept>"#;
        assert_eq!(revert_inline(xml), r#"<a href="x?a=1&b=2">l</a>"#);
    }

    #[test]
    fn test_revert_plain_text() {
        assert_eq!(revert_inline("Tom &amp; Jerry"), "Tom & Jerry");
    }
}
