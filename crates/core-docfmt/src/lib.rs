//! In-memory model for the remote service's tree-structured rich-text
//! format ("DocFmt", the repository's ADF).
//!
//! The model is a plain value type, agnostic to construction direction: the
//! Markdown encoder and the remote JSON parser both produce the same
//! in-memory shape. Node kinds are a closed variant set (a type
//! discriminator plus a type-specific attribute map) rather than an
//! inheritance hierarchy, per the polymorphism note in the design.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub const SCHEMA_VERSION: u32 = 1;

/// The closed set of DocFmt node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    Blockquote,
    BulletList,
    OrderedList,
    ListItem,
    TaskList,
    TaskItem,
    CodeBlock,
    Table,
    TableRow,
    TableHeaderCell,
    TableDataCell,
    ThematicBreak,
    Text,
    HardBreak,
}

impl NodeKind {
    pub fn as_tag(self) -> &'static str {
        match self {
            NodeKind::Document => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Blockquote => "blockquote",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::TaskList => "taskList",
            NodeKind::TaskItem => "taskItem",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableHeaderCell => "tableHeader",
            NodeKind::TableDataCell => "tableCell",
            NodeKind::ThematicBreak => "rule",
            NodeKind::Text => "text",
            NodeKind::HardBreak => "hardBreak",
        }
    }

    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        Some(match tag {
            "doc" => NodeKind::Document,
            "paragraph" => NodeKind::Paragraph,
            "heading" => NodeKind::Heading,
            "blockquote" => NodeKind::Blockquote,
            "bulletList" => NodeKind::BulletList,
            "orderedList" => NodeKind::OrderedList,
            "listItem" => NodeKind::ListItem,
            "taskList" => NodeKind::TaskList,
            "taskItem" => NodeKind::TaskItem,
            "codeBlock" => NodeKind::CodeBlock,
            "table" => NodeKind::Table,
            "tableRow" => NodeKind::TableRow,
            "tableHeader" => NodeKind::TableHeaderCell,
            "tableCell" => NodeKind::TableDataCell,
            "rule" => NodeKind::ThematicBreak,
            "text" => NodeKind::Text,
            "hardBreak" => NodeKind::HardBreak,
            _ => return None,
        })
    }
}

/// The closed set of inline marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkKind {
    Strong,
    Emphasis,
    Strike,
    Code,
    Link,
    Underline,
    TextColor,
    BackgroundColor,
}

impl MarkKind {
    pub fn as_tag(self) -> &'static str {
        match self {
            MarkKind::Strong => "strong",
            MarkKind::Emphasis => "em",
            MarkKind::Strike => "strike",
            MarkKind::Code => "code",
            MarkKind::Link => "link",
            MarkKind::Underline => "underline",
            MarkKind::TextColor => "textColor",
            MarkKind::BackgroundColor => "backgroundColor",
        }
    }

    pub fn from_tag(tag: &str) -> Option<MarkKind> {
        Some(match tag {
            "strong" => MarkKind::Strong,
            "em" => MarkKind::Emphasis,
            "strike" => MarkKind::Strike,
            "code" => MarkKind::Code,
            "link" => MarkKind::Link,
            "underline" => MarkKind::Underline,
            "textColor" => MarkKind::TextColor,
            "backgroundColor" => MarkKind::BackgroundColor,
            _ => return None,
        })
    }
}

/// A formatting annotation on an inline text leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub kind: MarkKind,
    pub attrs: BTreeMap<String, String>,
}

impl Mark {
    pub fn new(kind: MarkKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
        }
    }

    pub fn link(href: impl Into<String>) -> Self {
        let mut m = Self::new(MarkKind::Link);
        m.attrs.insert("href".to_string(), href.into());
        m
    }

    /// The `code` mark may coexist only with `link`; all other combinations
    /// among the remaining mark kinds are permitted.
    pub fn compatible(a: MarkKind, b: MarkKind) -> bool {
        if a == b {
            return true;
        }
        let has_code = a == MarkKind::Code || b == MarkKind::Code;
        if !has_code {
            return true;
        }
        matches!(
            (a, b),
            (MarkKind::Code, MarkKind::Link) | (MarkKind::Link, MarkKind::Code)
        )
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.kind.as_tag().into()));
        if !self.attrs.is_empty() {
            let mut attrs = Map::new();
            for (k, v) in &self.attrs {
                attrs.insert(k.clone(), Value::String(v.clone()));
            }
            obj.insert("attrs".into(), Value::Object(attrs));
        }
        Value::Object(obj)
    }

    fn from_json(v: &Value) -> Option<Mark> {
        let obj = v.as_object()?;
        let tag = obj.get("type")?.as_str()?;
        let kind = MarkKind::from_tag(tag)?;
        let mut mark = Mark::new(kind);
        if let Some(attrs) = obj.get("attrs").and_then(Value::as_object) {
            for (k, v) in attrs {
                if let Some(s) = v.as_str() {
                    mark.attrs.insert(k.clone(), s.to_string());
                }
            }
        }
        Some(mark)
    }
}

/// A single node in the DocFmt tree. Leaf text nodes carry `text` and
/// `marks`; every other node carries `content` (possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub attrs: BTreeMap<String, Value>,
    pub content: Vec<Node>,
    pub text: Option<String>,
    pub marks: Vec<Mark>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
            content: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    pub fn text(s: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            kind: NodeKind::Text,
            attrs: BTreeMap::new(),
            content: Vec::new(),
            text: Some(s.into()),
            marks,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = content;
        self
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.kind.as_tag().into()));
        if !self.attrs.is_empty() {
            let mut attrs = Map::new();
            for (k, v) in &self.attrs {
                attrs.insert(k.clone(), v.clone());
            }
            obj.insert("attrs".into(), Value::Object(attrs));
        }
        if let Some(text) = &self.text {
            obj.insert("text".into(), Value::String(text.clone()));
        }
        if !self.marks.is_empty() {
            obj.insert(
                "marks".into(),
                Value::Array(self.marks.iter().map(Mark::to_json).collect()),
            );
        }
        if self.kind != NodeKind::Text && self.kind != NodeKind::HardBreak {
            obj.insert(
                "content".into(),
                Value::Array(self.content.iter().map(Node::to_json).collect()),
            );
        }
        Value::Object(obj)
    }

    fn from_json(v: &Value) -> Option<Node> {
        let obj = v.as_object()?;
        let tag = obj.get("type")?.as_str()?;
        let kind = NodeKind::from_tag(tag)?;

        let attrs = obj
            .get("attrs")
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let content = obj
            .get("content")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Node::from_json).collect())
            .unwrap_or_default();

        let text = obj
            .get("text")
            .and_then(Value::as_str)
            .map(|s| s.to_string());

        let marks = obj
            .get("marks")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Mark::from_json).collect())
            .unwrap_or_default();

        Some(Node {
            kind,
            attrs,
            content,
            text,
            marks,
        })
    }
}

/// The root of a DocFmt tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub version: u32,
    pub content: Vec<Node>,
}

#[derive(Debug, Error)]
pub enum DocfmtError {
    #[error("malformed DocFmt JSON")]
    MalformedJson,
    #[error("unsupported document version: {0}")]
    UnsupportedVersion(u32),
    #[error("root node is not a document")]
    NotADocument,
}

impl Document {
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            content,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("version".into(), Value::Number(self.version.into()));
        obj.insert("type".into(), Value::String("doc".into()));
        obj.insert(
            "content".into(),
            Value::Array(self.content.iter().map(Node::to_json).collect()),
        );
        Value::Object(obj)
    }

    /// Parse a DocFmt document from a raw JSON value. Rejects any version
    /// other than 1 and any root whose `type` is not `"doc"`.
    pub fn from_json(v: &Value) -> Result<Document, DocfmtError> {
        let obj = v.as_object().ok_or(DocfmtError::MalformedJson)?;

        let tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DocfmtError::MalformedJson)?;
        if tag != "doc" {
            return Err(DocfmtError::NotADocument);
        }

        let version = obj
            .get("version")
            .and_then(Value::as_u64)
            .ok_or(DocfmtError::MalformedJson)? as u32;
        if version != SCHEMA_VERSION {
            return Err(DocfmtError::UnsupportedVersion(version));
        }

        let content = obj
            .get("content")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Node::from_json).collect())
            .unwrap_or_default();

        Ok(Document { version, content })
    }

    /// Parse from raw bytes (as returned by the transport). Returns
    /// [`DocfmtError::MalformedJson`] on invalid JSON.
    pub fn from_bytes(bytes: &[u8]) -> Result<Document, DocfmtError> {
        let v: Value = serde_json::from_slice(bytes).map_err(|_| DocfmtError::MalformedJson)?;
        Document::from_json(&v)
    }
}

/// Generate a fresh, locally-unique identifier for a task-list or
/// task-item node. Identifiers carry no cross-conversion meaning.
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_compatibility_code_and_link_allowed() {
        assert!(Mark::compatible(MarkKind::Code, MarkKind::Link));
        assert!(Mark::compatible(MarkKind::Link, MarkKind::Code));
    }

    #[test]
    fn mark_compatibility_code_and_strong_forbidden() {
        assert!(!Mark::compatible(MarkKind::Code, MarkKind::Strong));
        assert!(!Mark::compatible(MarkKind::Code, MarkKind::Emphasis));
        assert!(!Mark::compatible(MarkKind::Code, MarkKind::Strike));
    }

    #[test]
    fn mark_compatibility_non_code_pairs_allowed() {
        assert!(Mark::compatible(MarkKind::Strong, MarkKind::Emphasis));
        assert!(Mark::compatible(MarkKind::Strike, MarkKind::Link));
        assert!(Mark::compatible(MarkKind::Underline, MarkKind::TextColor));
    }

    #[test]
    fn round_trip_json_preserves_shape() {
        let doc = Document::new(vec![
            Node::new(NodeKind::Paragraph).with_content(vec![Node::text(
                "hi",
                vec![Mark::new(MarkKind::Strong)],
            )]),
        ]);
        let json = doc.to_json();
        let parsed = Document::from_json(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn rejects_non_doc_root() {
        let v = serde_json::json!({"version": 1, "type": "paragraph", "content": []});
        assert!(matches!(
            Document::from_json(&v),
            Err(DocfmtError::NotADocument)
        ));
    }

    #[test]
    fn rejects_wrong_version() {
        let v = serde_json::json!({"version": 2, "type": "doc", "content": []});
        assert!(matches!(
            Document::from_json(&v),
            Err(DocfmtError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn unknown_node_type_is_skipped_on_parse() {
        let v = serde_json::json!({
            "version": 1,
            "type": "doc",
            "content": [
                {"type": "panel", "content": []},
                {"type": "paragraph", "content": []},
            ]
        });
        let doc = Document::from_json(&v).unwrap();
        assert_eq!(doc.content.len(), 1);
        assert_eq!(doc.content[0].kind, NodeKind::Paragraph);
    }

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(fresh_id(), fresh_id());
    }
}
