//! Segment extraction: which parts of an HTML document get translated.
//!
//! The page title comes first, then every direct child of `<body>` that holds
//! visible text. Ids are handed out by one running counter, so a document
//! with a title numbers its first body segment 2.

use indextree::NodeId;

use crate::dom::{Document, NodeKind};
use crate::inline::{self, InlineNode};
use crate::tracing_macros::debug;

/// Attribute written on each extracted element, carrying its slug.
pub const SLUG_ATTRIBUTE: &str = "data-slug";

/// One unit of translatable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 1-based, strictly increasing in document order
    pub id: u32,
    /// `"title"`, the element's own `slug`/`id` attribute, or a synthesized
    /// `body_<id>` / `body_text_<id>`
    pub slug: String,
    /// Lowercase tag name, `"p"` for bare text
    pub tag: String,
    pub source: Vec<InlineNode>,
    /// Always empty on extraction
    pub target: String,
}

/// Segments plus a copy of the document annotated with `data-slug`.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub segments: Vec<Segment>,
    pub annotated: Document,
}

/// An element with non-blank text, or a non-blank text node.
pub fn is_translatable(doc: &Document, node: NodeId) -> bool {
    match &doc.get(node).kind {
        NodeKind::Element(_) => !doc.text_content(node).trim().is_empty(),
        NodeKind::Text(text) => !text.trim().is_empty(),
        NodeKind::Comment(_) | NodeKind::Document => false,
    }
}

/// Direct children of `<body>` that carry translatable content, in order.
pub fn translatable_body_children(doc: &Document) -> Vec<NodeId> {
    match doc.body() {
        Some(body) => doc
            .children(body)
            .filter(|&child| is_translatable(doc, child))
            .collect(),
        None => Vec::new(),
    }
}

/// Extract segments from `doc`. The input is left untouched; the
/// `data-slug` annotations go on the returned copy.
pub fn extract_segments(doc: &Document) -> Extraction {
    let mut annotated = doc.clone();
    let mut segments = Vec::new();
    let mut next_id = 1u32;

    if let Some(title) = doc.title()
        && !doc.text_content(title).trim().is_empty()
    {
        segments.push(Segment {
            id: next_id,
            slug: "title".to_owned(),
            tag: "title".to_owned(),
            source: inline::tokenize_children(doc, title),
            target: String::new(),
        });
        next_id += 1;
    }

    for node in translatable_body_children(doc) {
        let id = next_id;
        next_id += 1;

        let segment = match &doc.get(node).kind {
            NodeKind::Element(elem) => {
                let slug = doc
                    .attr(node, "slug")
                    .or_else(|| doc.attr(node, "id"))
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("body_{id}"));
                annotated.set_attr(node, SLUG_ATTRIBUTE, &slug);

                Segment {
                    id,
                    slug,
                    tag: elem.tag.to_ascii_lowercase(),
                    source: inline::tokenize_children(doc, node),
                    target: String::new(),
                }
            }
            _ => Segment {
                id,
                slug: format!("body_text_{id}"),
                tag: "p".to_owned(),
                source: inline::tokenize_node_alone(doc, node),
                target: String::new(),
            },
        };
        segments.push(segment);
    }

    debug!(count = segments.len(), "extracted segments");

    Extraction {
        segments,
        annotated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;

    #[test]
    fn test_title_then_body() {
        let doc = parse(
            "<html><head><title>Hi</title></head><body><p>Hello <b>World</b></p></body></html>",
        );
        let segments = extract_segments(&doc).segments;
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].id, 1);
        assert_eq!(segments[0].slug, "title");
        assert_eq!(segments[0].tag, "title");
        assert_eq!(segments[0].source, vec![InlineNode::Text("Hi".into())]);

        assert_eq!(segments[1].id, 2);
        assert_eq!(segments[1].slug, "body_2");
        assert_eq!(segments[1].tag, "p");
        assert!(segments[1].target.is_empty());
    }

    #[test]
    fn test_blank_title_is_skipped() {
        let doc = parse("<title>  </title><p>x</p>");
        let segments = extract_segments(&doc).segments;
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].id, 1);
        assert_eq!(segments[0].slug, "body_1");
    }

    #[test]
    fn test_slug_precedence() {
        let doc = parse(
            r#"<body><p slug="intro" id="ignored">a</p><h2 id="heading">b</h2><div>c</div></body>"#,
        );
        let slugs: Vec<_> = extract_segments(&doc)
            .segments
            .into_iter()
            .map(|s| s.slug)
            .collect();
        assert_eq!(slugs, ["intro", "heading", "body_3"]);
    }

    #[test]
    fn test_bare_text_and_skipped_nodes() {
        let doc = parse("<body>\n  <!-- c -->loose<p>  </p><img src=\"x.png\"><H3>Big</H3></body>");
        let segments = extract_segments(&doc).segments;
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].slug, "body_text_1");
        assert_eq!(segments[0].tag, "p");
        assert_eq!(segments[0].source, vec![InlineNode::Text("loose".into())]);

        assert_eq!(segments[1].slug, "body_2");
        assert_eq!(segments[1].tag, "h3");
    }

    #[test]
    fn test_annotation_goes_on_copy() {
        let doc = parse("<body><p>a</p>text<p id=\"x\">b</p></body>");
        let extraction = extract_segments(&doc);

        let body = doc.body().expect("body");
        let first = doc.children(body).next().expect("p");
        assert_eq!(doc.attr(first, SLUG_ATTRIBUTE), None);

        let annotated = &extraction.annotated;
        let slugs: Vec<_> = annotated
            .children(body)
            .filter_map(|n| annotated.attr(n, SLUG_ATTRIBUTE))
            .collect();
        assert_eq!(slugs, ["body_1", "x"]);
    }

    #[test]
    fn test_ids_strictly_increase() {
        let doc = parse("<title>t</title><p>1</p>two<div>3</div><ul><li>4</li></ul>");
        let ids: Vec<_> = extract_segments(&doc)
            .segments
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, [1, 2, 3, 4, 5]);
    }
}
