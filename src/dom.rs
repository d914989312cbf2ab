//! Arena-based in-memory document model
//!
//! The framework never assumes a browser: the DOM it binds against is this
//! explicit document model. Nodes live in a flat arena and are addressed by
//! [`NodeId`], so pending binding writes can be queued as plain
//! (node, path, value) triples without borrowing into the tree.
//!
//! Dynamic element state splits in two, mirroring the attribute/property
//! split of a real DOM:
//! - attributes: ordered `(name, value)` string pairs from markup
//! - properties: a nested `serde_json` map addressed by dot paths
//!   (`value`, `textContent`, `style.borderColor`, ...)

use serde_json::{Map, Value};

use crate::error::GraftError;
use crate::html;
use crate::selector::Selector;

/// Handle to a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element payload: tag, markup attributes and live properties.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub props: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
}

/// An in-memory document: a node arena with a synthetic `body` root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

/// Tags serialized without a closing tag and treated as childless by the parser.
pub(crate) const VOID_TAGS: &[&str] = &["input", "br", "hr", "img", "meta", "link"];

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the `body` root.
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Element(ElementData {
                tag: "body".to_string(),
                ..ElementData::default()
            }),
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Parse an HTML fragment into a fresh document (under the `body` root).
    pub fn from_html(markup: &str) -> Result<Self, GraftError> {
        let mut doc = Self::new();
        let root = doc.root;
        html::parse_fragment(&mut doc, root, markup)?;
        Ok(doc)
    }

    /// The synthetic root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.into(),
            ..ElementData::default()
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    // ─────────────────────────────────────────────────────────────
    // Attributes
    // ─────────────────────────────────────────────────────────────

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Set an attribute, replacing any existing value for the same name.
    pub fn set_attribute(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        if let Some(data) = self.element_mut(node) {
            if let Some(slot) = data.attrs.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = value;
            } else {
                data.attrs.push((name, value));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Properties (dot paths)
    // ─────────────────────────────────────────────────────────────

    /// Read a property by dot path.
    ///
    /// `textContent` reads the concatenated descendant text. A missing
    /// single-segment property falls back to the attribute of the same name
    /// (so `<input value="x">` reads back before anything wrote the
    /// property). Missing paths yield `Value::Null`.
    pub fn get_path(&self, node: NodeId, path: &str) -> Value {
        if path == "textContent" {
            return Value::String(self.text_content(node));
        }
        let Some(data) = self.element(node) else {
            return Value::Null;
        };
        let mut segments = path.split('.');
        let first = match segments.next() {
            Some(s) => s,
            None => return Value::Null,
        };
        let mut current = match data.props.get(first) {
            Some(v) => v,
            None => {
                if !path.contains('.') {
                    if let Some(attr) = self.attribute(node, path) {
                        return Value::String(attr.to_string());
                    }
                }
                return Value::Null;
            }
        };
        for segment in segments {
            match current.get(segment) {
                Some(v) => current = v,
                None => return Value::Null,
            }
        }
        current.clone()
    }

    /// Write a property by dot path, creating intermediate objects.
    ///
    /// `textContent` replaces the element's children with a single text node.
    pub fn set_path(&mut self, node: NodeId, path: &str, value: Value) {
        if path == "textContent" {
            self.set_text_content(node, crate::value::display(&value));
            return;
        }
        let Some(data) = self.element_mut(node) else {
            return;
        };
        let mut segments: Vec<&str> = path.split('.').collect();
        let last = match segments.pop() {
            Some(s) => s,
            None => return,
        };
        if segments.is_empty() {
            data.props.insert(last.to_string(), value);
            return;
        }
        let mut current = data
            .props
            .entry(segments[0].to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        for segment in &segments[1..] {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            current = current
                .as_object_mut()
                .expect("just ensured object")
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current
            .as_object_mut()
            .expect("just ensured object")
            .insert(last.to_string(), value);
    }

    // ─────────────────────────────────────────────────────────────
    // Text content and inner HTML
    // ─────────────────────────────────────────────────────────────

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &self.nodes[node.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Replace the element's children with a single text node.
    pub fn set_text_content(&mut self, node: NodeId, text: impl Into<String>) {
        let child = self.create_text(text);
        self.nodes[node.0].children.clear();
        self.nodes[node.0].children.push(child);
    }

    /// Parse an HTML fragment and replace the element's children with it.
    ///
    /// Replaced nodes stay in the arena but become unreachable; the arena
    /// only grows for the lifetime of a document.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), GraftError> {
        self.nodes[node.0].children.clear();
        html::parse_fragment(self, node, markup)
    }

    // ─────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────

    /// All elements in document order matching the selector.
    pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_elements(self.root, &mut |doc, node| {
            if selector.matches(doc, node) {
                out.push(node);
            }
        });
        out
    }

    /// First element under `scope` (inclusive) whose `id` attribute matches.
    pub fn find_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        let mut found = None;
        self.walk_elements(scope, &mut |doc, node| {
            if found.is_none() && doc.attribute(node, "id") == Some(id) {
                found = Some(node);
            }
        });
        found
    }

    fn walk_elements(&self, node: NodeId, visit: &mut impl FnMut(&Self, NodeId)) {
        if self.is_element(node) {
            visit(self, node);
        }
        // children vec is never mutated during a walk; clone keeps the borrow simple
        for child in self.nodes[node.0].children.clone() {
            self.walk_elements(child, visit);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Serialization
    // ─────────────────────────────────────────────────────────────

    /// Serialize a node (tag included) back to HTML.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Serialize an element's children back to HTML.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in &self.nodes[node.0].children {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(&data.tag);
                for (name, value) in &data.attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(value);
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_TAGS.contains(&data.tag.as_str()) {
                    return;
                }
                for child in &self.nodes[node.0].children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&data.tag);
                out.push('>');
            }
        }
    }
}
