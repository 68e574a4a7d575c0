//! Document tree adapter
//!
//! A thin, borrowed view over the materialized `serde_json::Value` tree. The
//! engine only ever talks to this interface, never to raw bytes or a decoder.
//!
//! Absence and JSON `null` are kept apart: a missing key yields `None` from
//! [`Node::field`], while a present `null` yields a node whose kind is
//! [`NodeKind::Null`]. Sparse repeated primitives rely on that distinction.

use serde_json::Value;

/// JSON kind of a present node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
        };
        write!(f, "{}", s)
    }
}

/// Borrowed view over one node of the document tree
///
/// No operation mutates the underlying tree.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(&'a Value);

impl<'a> Node<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self(value)
    }

    pub fn kind(self) -> NodeKind {
        match self.0 {
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
            Value::String(_) => NodeKind::String,
            Value::Number(_) => NodeKind::Number,
            Value::Bool(_) => NodeKind::Boolean,
            Value::Null => NodeKind::Null,
        }
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }

    /// Child node for a key; `None` when this is not an object or the key is
    /// absent (a present `null` still returns a node).
    pub fn field(self, name: &str) -> Option<Node<'a>> {
        match self.0 {
            Value::Object(map) => map.get(name).map(Node),
            _ => None,
        }
    }

    /// Array elements; `None` unless this node is an array
    pub fn elements(self) -> Option<&'a [Value]> {
        self.0.as_array().map(Vec::as_slice)
    }

    pub fn as_str(self) -> Option<&'a str> {
        self.0.as_str()
    }

    /// Own keys of an object node, in document order (empty otherwise)
    pub fn keys(self) -> impl Iterator<Item = &'a str> {
        self.0
            .as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    pub fn raw(self) -> &'a Value {
        self.0
    }
}
