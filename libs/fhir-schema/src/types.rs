//! Declarative schema model
//!
//! Version-agnostic description of a domain type system: each type declares
//! its kind, an optional base type whose fields are inherited, and an ordered
//! field list. The model is plain data, no validation here; consistency is
//! enforced when a [`crate::TypeRegistry`] is built from it.

use serde::{Deserialize, Serialize};

/// Kind of a declared type (primitive-type | complex-type | resource)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeKind {
    /// A primitive data type carried as a single JSON scalar
    PrimitiveType,
    /// A complex data type (structured record, possibly nested)
    ComplexType,
    /// A resource, selectable by the top-level discriminator field
    Resource,
}

/// Lexical class of a primitive type's JSON representation
///
/// Determines which JSON scalar kind a primitive value must arrive as:
/// `text` expects a string, `integer` and `decimal` expect a number,
/// `boolean` expects a true/false literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveClass {
    Text,
    Integer,
    Decimal,
    Boolean,
}

/// A single declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Unique type name (e.g. `dateTime`, `Period`, `Patient`)
    pub name: String,

    pub kind: TypeKind,

    /// Lexical class; required for primitive types, absent otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<PrimitiveClass>,

    /// Whether this is an abstract type
    ///
    /// Abstract resources (e.g. a shared `Resource` base) contribute inherited
    /// fields but are never dispatch targets themselves.
    #[serde(rename = "abstract", default, skip_serializing_if = "std::ops::Not::not")]
    pub abstract_: bool,

    /// Parent type whose fields are inherited and decoded first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    /// Own fields, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
}

/// A declared field of a composite or resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    /// Target type for plain fields; mutually exclusive with `choice`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Candidate types for a type-choice field, in declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<Vec<String>>,

    /// Cardinality: `false` = 0..1, `true` = 0..*
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub many: bool,
}

impl FieldDef {
    /// Plain field referencing a single target type
    pub fn plain(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            choice: None,
            many: false,
        }
    }

    /// Repeated plain field (cardinality 0..*)
    pub fn repeated(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            many: true,
            ..Self::plain(name, type_name)
        }
    }

    /// Type-choice field with the given candidate types
    pub fn choice<I, S>(name: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            type_name: None,
            choice: Some(candidates.into_iter().map(Into::into).collect()),
            many: false,
        }
    }
}

impl TypeDef {
    /// Primitive type with the given lexical class
    pub fn primitive(name: impl Into<String>, class: PrimitiveClass) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::PrimitiveType,
            class: Some(class),
            abstract_: false,
            base: None,
            fields: Vec::new(),
        }
    }

    /// Complex type with the given fields
    pub fn complex(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::ComplexType,
            class: None,
            abstract_: false,
            base: None,
            fields,
        }
    }

    /// Resource type with the given fields
    pub fn resource(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Resource,
            class: None,
            abstract_: false,
            base: None,
            fields,
        }
    }

    /// Sets the base type
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Marks the type abstract
    pub fn abstract_type(mut self) -> Self {
        self.abstract_ = true;
        self
    }
}

/// Top-level declarative schema artifact
///
/// The JSON form a registry can be loaded from:
///
/// ```json
/// { "types": [
///     { "name": "dateTime", "kind": "primitive-type", "class": "text" },
///     { "name": "Period", "kind": "complex-type", "base": "Element",
///       "fields": [ { "name": "start", "type": "dateTime" },
///                   { "name": "end", "type": "dateTime" } ] }
/// ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub types: Vec<TypeDef>,
}

/// Document key of a choice field resolved to a candidate type: the base name
/// with the candidate's type name appended in UpperCamel (`value` + `dateTime`
/// → `valueDateTime`).
pub fn choice_key(base: &str, type_name: &str) -> String {
    let mut key = String::with_capacity(base.len() + type_name.len());
    key.push_str(base);
    let mut chars = type_name.chars();
    if let Some(first) = chars.next() {
        key.extend(first.to_uppercase());
        key.push_str(chars.as_str());
    }
    key
}
