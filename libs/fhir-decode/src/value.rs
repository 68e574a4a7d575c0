//! Decoded value graph
//!
//! Plain data, no behavior beyond accessors: the engine's output mirrors the
//! schema shape: primitives carry their optional element half, composites
//! keep fields in schema order, resources add the resolved kind.

use rust_decimal::Decimal;

/// Scalar half of a decoded primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

/// A decoded primitive: the scalar value merged with the element parsed from
/// its `_`-prefixed extension carrier
///
/// Either half may be absent. A slot of a sparse repeated field can carry an
/// extension without a scalar, a scalar without an extension, or (to keep
/// positional alignment with the value array) neither.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveValue {
    /// Concrete primitive type (`dateTime`, `boolean`, …); for a choice field
    /// this is the resolved candidate.
    pub type_name: String,
    pub value: Option<Scalar>,
    pub element: Option<Composite>,
}

impl PrimitiveValue {
    /// Neither a scalar nor an element half
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.element.is_none()
    }
}

/// A decoded composite: field → value pairs in schema order
///
/// Absent fields are omitted; a choice field appears under its declared base
/// name with the concrete type recorded on the value itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub type_name: String,
    pub fields: Vec<(String, ParsedValue)>,
}

impl Composite {
    pub fn field(&self, name: &str) -> Option<&ParsedValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A decoded resource: the composite body plus the resolved kind
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub kind: String,
    pub body: Composite,
}

/// Any decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Primitive(PrimitiveValue),
    Composite(Composite),
    Resource(Resource),
    /// Repeated field; length equals the declared value array's length
    /// (or the carrier array's, in the all-extension sparse case)
    List(Vec<ParsedValue>),
}

impl ParsedValue {
    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Self::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&Composite> {
        match self {
            Self::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Self::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParsedValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}
