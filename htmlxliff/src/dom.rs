//! Arena-based HTML document.
//!
//! All nodes live in one `indextree` arena, so node handles stay valid while
//! the tree is edited: the reconstructor collects the nodes it wants to
//! rewrite first and replaces their content afterwards.
//!
//! Parsing goes through html5ever's tree builder, which means every input
//! produces a document (browsers never reject HTML, and neither do we).

use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName, parse_document};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;
use tendril::{StrTendril, TendrilSink};

use crate::tracing_macros::trace;

/// Marker attribute placed on the synthetic container used for fragment parsing.
const CONTAINER_MARKER: &str = "data-htmlxliff-container";

/// Elements whose content is stored as literal text rather than markup.
const TEXT_ONLY_ELEMENTS: &[&str] = &["title", "textarea", "script", "style"];

/// A parsed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Every node of the tree
    pub arena: Arena<NodeData>,

    /// Invisible document node, parent of `<html>` and any top-level comments
    pub document: NodeId,

    /// Root element (usually `<html>`)
    pub root: NodeId,

    /// DOCTYPE name if present (usually "html")
    pub doctype: Option<String>,
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag and attributes
    Element(ElementData),
    /// Text content
    Text(String),
    /// HTML comment
    Comment(String),
}

/// Element data (tag + attributes)
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name, lowercase for HTML elements
    pub tag: String,

    /// Attributes in source order
    pub attrs: IndexMap<String, String>,
}

/// XML namespace of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html,
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

impl Document {
    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Iterate children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Tag name if the node is an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.get(id).kind {
            NodeKind::Element(elem) => Some(elem.tag.as_str()),
            _ => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.get(id).kind, NodeKind::Text(_))
    }

    /// Attribute value by name, `None` for missing attributes and non-elements.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.get(id).kind {
            NodeKind::Element(elem) => elem.attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Set an attribute. Does nothing on non-element nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element(elem) = &mut self.get_mut(id).kind {
            elem.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    /// First child element with the given tag.
    fn child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent)
            .find(|&id| self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
    }

    /// Get the `<head>` element if present
    pub fn head(&self) -> Option<NodeId> {
        self.child_element(self.root, "head")
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        self.child_element(self.root, "body")
    }

    /// Get the `<head><title>` element if present
    pub fn title(&self) -> Option<NodeId> {
        self.head().and_then(|head| self.child_element(head, "title"))
    }

    /// Concatenated text of a node and its descendants (comments excluded).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in id.descendants(&self.arena) {
            if let NodeKind::Text(text) = &self.get(node).kind {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace the content of `id` with the parsed `html` fragment.
    ///
    /// Text-only elements (`title`, `textarea`, `script`, `style`) get the
    /// fragment as one literal text child. A text node is replaced in place by
    /// the fragment's nodes. Any other element re-parses the fragment inside an
    /// element of its own tag so context-dependent children keep their shape.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        match &self.get(id).kind {
            NodeKind::Element(elem) => {
                let tag = elem.tag.clone();
                let ns = self.get(id).ns;
                self.clear_children(id);

                if ns == Namespace::Html && is_text_only_element(&tag) {
                    if !html.is_empty() {
                        let text = self.new_text(html);
                        id.append(text, &mut self.arena);
                    }
                    return;
                }

                let fragment = parse_fragment(html, &tag);
                for node in fragment.all_nodes() {
                    let imported = self.import(&fragment.doc, node);
                    id.append(imported, &mut self.arena);
                }
            }
            NodeKind::Text(_) => {
                let fragment = parse_fragment(html, "div");
                for node in fragment.all_nodes() {
                    let imported = self.import(&fragment.doc, node);
                    id.insert_before(imported, &mut self.arena);
                }
                id.detach(&mut self.arena);
            }
            NodeKind::Comment(_) | NodeKind::Document => {}
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            child.detach(&mut self.arena);
        }
    }

    fn new_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Text(text.to_owned()),
            ns: Namespace::Html,
        })
    }

    /// Deep-copy `node` from another document into this arena (detached).
    fn import(&mut self, other: &Document, node: NodeId) -> NodeId {
        let copy = self.arena.new_node(other.get(node).clone());
        for child in other.children(node) {
            let child_copy = self.import(other, child);
            copy.append(child_copy, &mut self.arena);
        }
        copy
    }
}

fn is_text_only_element(tag: &str) -> bool {
    TEXT_ONLY_ELEMENTS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// An HTML fragment parsed inside a synthetic container element.
#[derive(Debug)]
pub struct Fragment {
    doc: Document,
    container: Option<NodeId>,
    spill: Vec<NodeId>,
}

impl Fragment {
    /// The document the fragment was parsed into.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Nodes parsed inside the container, in order.
    pub fn nodes(&self) -> Vec<NodeId> {
        match self.container {
            Some(container) => self.doc.children(container).collect(),
            None => Vec::new(),
        }
    }

    /// True when content ended up outside the container, i.e. the fragment
    /// closed it early or the container itself was dropped by the parser.
    pub fn escaped(&self) -> bool {
        self.container.is_none() || !self.spill.is_empty()
    }

    /// Container content followed by whatever spilled out of it.
    fn all_nodes(&self) -> Vec<NodeId> {
        let mut nodes = self.nodes();
        nodes.extend(self.spill.iter().copied());
        nodes
    }
}

/// Parse `html` as the content of a `<container_tag>` element in a body.
pub fn parse_fragment(html: &str, container_tag: &str) -> Fragment {
    let wrapped = format!(
        "<!DOCTYPE html><html><head></head><body><{container_tag} {CONTAINER_MARKER}=\"\">{html}</{container_tag}></body></html>"
    );
    let doc = parse(&wrapped);

    let Some(body) = doc.body() else {
        return Fragment {
            doc,
            container: None,
            spill: Vec::new(),
        };
    };

    let container = body
        .descendants(&doc.arena)
        .find(|&id| doc.attr(id, CONTAINER_MARKER).is_some());

    let spill: Vec<NodeId> = doc
        .children(body)
        .filter(|&id| Some(id) != container)
        .filter(|&id| match &doc.get(id).kind {
            NodeKind::Text(text) => !text.trim().is_empty(),
            NodeKind::Element(_) => true,
            _ => false,
        })
        .collect();

    if !spill.is_empty() {
        trace!(
            container_tag,
            spilled = spill.len(),
            "fragment escaped its container"
        );
    }

    Fragment {
        doc,
        container,
        spill,
    }
}

/// Parse HTML into an arena-based Document
pub fn parse(html: &str) -> Document {
    let sink = ArenaSink::new();
    parse_document(sink, Default::default()).one(StrTendril::from(html))
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
pub struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink implementation for building the arena DOM
struct ArenaSink {
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    doctype: RefCell<Option<String>>,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });

        ArenaSink {
            arena: RefCell::new(arena),
            document,
            doctype: RefCell::new(None),
        }
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let arena = self.arena.into_inner();

        // Comments may precede <html>, so look for the first element
        let root = self
            .document
            .children(&arena)
            .find(|&id| matches!(arena[id].get().kind, NodeKind::Element(_)))
            .unwrap_or(self.document);

        Document {
            arena,
            document: self.document,
            root,
            doctype: self.doctype.into_inner(),
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        let (ns, local) = match &node.kind {
            NodeKind::Element(elem) => (node.ns.url(), LocalName::from(elem.tag.as_str())),
            _ => (Namespace::Html.url(), LocalName::from("")),
        };

        OwnedElemName(QualName {
            prefix: None,
            ns: html5ever::Namespace::from(ns),
            local,
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let ns = Namespace::from_url(name.ns.as_ref());
        let attrs = attrs
            .into_iter()
            .map(|attr| (attribute_name(&attr), attr.value.to_string()))
            .collect();

        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Element(ElementData {
                tag: name.local.to_string(),
                attrs,
            }),
            ns,
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(text.to_string()),
            ns: Namespace::Html,
        })
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions do not exist in HTML; keep an empty comment
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(String::new()),
            ns: Namespace::Html,
        })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with a trailing text node, like browsers do
                if let Some(last_child) = parent.children(&arena).next_back()
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_str(&text);
                    return;
                }

                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text.to_string()),
                    ns: Namespace::Html,
                });
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => {
                sibling.insert_before(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                let text_node = arena.new_node(NodeData {
                    kind: NodeKind::Text(text.to_string()),
                    ns: Namespace::Html,
                });
                sibling.insert_before(text_node, &mut arena);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.arena.borrow()[*element].parent().is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(name.to_string());
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template content lives directly under the <template> element
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                elem.attrs
                    .entry(attribute_name(&attr))
                    .or_insert_with(|| attr.value.to_string());
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}

/// Attribute name including its prefix (`xlink:href`), as written in source.
fn attribute_name(attr: &Attribute) -> String {
    match &attr.name.prefix {
        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
        None => attr.name.local.to_string(),
    }
}
