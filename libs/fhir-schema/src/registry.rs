//! Validated, immutable type registry
//!
//! A [`TypeRegistry`] is the compiled form of a [`SchemaDocument`]: base
//! chains are flattened into each type (parent fields first), every field
//! reference is resolved, and the resource-dispatch map is decided here, once,
//! instead of at every lookup. Registries are built at startup and shared
//! read-only across decode calls.

use crate::error::{RegistryError, Result};
use crate::types::{choice_key, FieldDef, PrimitiveClass, SchemaDocument, TypeDef, TypeKind};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

/// Resolved shape of a field after registry construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// Single-type field targeting a primitive
    Primitive { type_name: String },
    /// Single-type field targeting a complex type
    Composite { type_name: String },
    /// Type-choice field; candidates in declaration order
    Choice { candidates: Vec<String> },
}

/// A field with its shape resolved against the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub many: bool,
    pub shape: FieldShape,
}

/// A type with its base chain flattened in
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub name: String,
    pub kind: TypeKind,
    pub class: Option<PrimitiveClass>,
    pub abstract_: bool,
    /// Full field list: base-chain fields first (outermost base leading),
    /// then own fields, each in declaration order.
    pub fields: Vec<ResolvedField>,
    /// Document keys accounted for by this type, including the `_`-prefixed
    /// extension-carrier counterparts of primitive fields and the suffixed
    /// keys of every choice candidate.
    recognized: HashSet<String>,
}

impl ResolvedType {
    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::PrimitiveType
    }

    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether a document key belongs to this type's declared surface
    pub fn recognizes(&self, key: &str) -> bool {
        self.recognized.contains(key)
    }
}

/// Immutable registry of resolved types, shared by all decode calls
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<ResolvedType>>,
    /// Discriminator value → resource type, decided at construction
    resources: HashMap<String, Arc<ResolvedType>>,
}

impl TypeRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<ResolvedType>> {
        self.types.get(name)
    }

    /// Resource type for a discriminator value; abstract resources are
    /// deliberately absent from this map.
    pub fn resource(&self, kind: &str) -> Option<&Arc<ResolvedType>> {
        self.resources.get(kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn resource_kinds(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Builds a registry from a declarative schema document
    pub fn from_document(document: SchemaDocument) -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        for def in document.types {
            builder = builder.define(def);
        }
        builder.build()
    }

    /// Builds a registry from the JSON form of a schema document
    pub fn from_json(json: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// The embedded core datatype registry (primitives, `Element`,
    /// `Extension`, common complex types and two demo resources).
    pub fn core() -> &'static TypeRegistry {
        static CORE: LazyLock<TypeRegistry> = LazyLock::new(|| {
            TypeRegistry::from_json(include_str!("core_types.json"))
                .expect("embedded core type artifact is valid")
        });
        &CORE
    }
}

/// Accumulates type definitions and compiles them into a [`TypeRegistry`]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defs: Vec<TypeDef>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(mut self, def: TypeDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn build(self) -> Result<TypeRegistry> {
        let mut by_name: HashMap<String, TypeDef> = HashMap::with_capacity(self.defs.len());
        for def in self.defs {
            if by_name.contains_key(&def.name) {
                return Err(RegistryError::DuplicateType(def.name));
            }
            by_name.insert(def.name.clone(), def);
        }

        for def in by_name.values() {
            check_shape_rules(def, &by_name)?;
        }

        let has_primitives = by_name
            .values()
            .any(|d| d.kind == TypeKind::PrimitiveType);
        let element_ok = by_name
            .get("Element")
            .is_some_and(|d| d.kind == TypeKind::ComplexType);
        if has_primitives && !element_ok {
            return Err(RegistryError::MissingElementType);
        }

        let mut types = HashMap::with_capacity(by_name.len());
        let mut resources = HashMap::new();

        for def in by_name.values() {
            let resolved = Arc::new(resolve_type(def, &by_name)?);
            if def.kind == TypeKind::Resource && !def.abstract_ {
                resources.insert(def.name.clone(), resolved.clone());
            }
            types.insert(def.name.clone(), resolved);
        }

        tracing::debug!(
            types = types.len(),
            resources = resources.len(),
            "type registry built"
        );

        Ok(TypeRegistry { types, resources })
    }
}

fn check_shape_rules(def: &TypeDef, by_name: &HashMap<String, TypeDef>) -> Result<()> {
    match def.kind {
        TypeKind::PrimitiveType => {
            if def.class.is_none() {
                return Err(RegistryError::MissingPrimitiveClass(def.name.clone()));
            }
            if !def.fields.is_empty() || def.base.is_some() {
                return Err(RegistryError::PrimitiveWithMembers(def.name.clone()));
            }
        }
        TypeKind::ComplexType | TypeKind::Resource => {
            if def.class.is_some() {
                return Err(RegistryError::UnexpectedClass(def.name.clone()));
            }
        }
    }

    if let Some(base) = &def.base {
        match by_name.get(base) {
            None => {
                return Err(RegistryError::UnknownBase {
                    type_name: def.name.clone(),
                    base: base.clone(),
                })
            }
            Some(parent) if parent.kind == TypeKind::PrimitiveType => {
                return Err(RegistryError::PrimitiveBase {
                    type_name: def.name.clone(),
                    base: base.clone(),
                })
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Walks the base chain outermost-first, returning the definitions whose
/// fields the resolved type inherits (the type itself last).
fn base_chain<'a>(
    def: &'a TypeDef,
    by_name: &'a HashMap<String, TypeDef>,
) -> Result<Vec<&'a TypeDef>> {
    let mut chain = vec![def];
    let mut seen: HashSet<&str> = HashSet::from([def.name.as_str()]);
    let mut current = def;

    while let Some(base) = &current.base {
        // base existence is checked in check_shape_rules; a dangling base
        // here would be a builder bug
        let parent = by_name
            .get(base)
            .ok_or_else(|| RegistryError::UnknownBase {
                type_name: current.name.clone(),
                base: base.clone(),
            })?;
        if !seen.insert(parent.name.as_str()) {
            return Err(RegistryError::BaseCycle(def.name.clone()));
        }
        chain.push(parent);
        current = parent;
    }

    chain.reverse();
    Ok(chain)
}

fn resolve_type(def: &TypeDef, by_name: &HashMap<String, TypeDef>) -> Result<ResolvedType> {
    let mut fields = Vec::new();
    let mut recognized = HashSet::new();
    let mut field_names: HashSet<&str> = HashSet::new();

    if def.kind == TypeKind::Resource {
        recognized.insert("resourceType".to_string());
    }

    for ancestor in base_chain(def, by_name)? {
        for field in &ancestor.fields {
            if !field_names.insert(field.name.as_str()) {
                return Err(RegistryError::DuplicateField {
                    type_name: def.name.clone(),
                    field: field.name.clone(),
                });
            }
            let resolved = resolve_field(&def.name, field, by_name)?;
            collect_recognized_keys(&resolved, by_name, &mut recognized);
            fields.push(resolved);
        }
    }

    Ok(ResolvedType {
        name: def.name.clone(),
        kind: def.kind,
        class: def.class,
        abstract_: def.abstract_,
        fields,
        recognized,
    })
}

fn resolve_field(
    owner: &str,
    field: &FieldDef,
    by_name: &HashMap<String, TypeDef>,
) -> Result<ResolvedField> {
    let shape = match (&field.type_name, &field.choice) {
        (Some(type_name), None) => {
            let referent = by_name.get(type_name).ok_or_else(|| {
                RegistryError::UnknownFieldType {
                    type_name: owner.to_string(),
                    field: field.name.clone(),
                    referent: type_name.clone(),
                }
            })?;
            match referent.kind {
                TypeKind::PrimitiveType => FieldShape::Primitive {
                    type_name: type_name.clone(),
                },
                TypeKind::ComplexType => FieldShape::Composite {
                    type_name: type_name.clone(),
                },
                TypeKind::Resource => {
                    return Err(RegistryError::ResourceFieldType {
                        type_name: owner.to_string(),
                        field: field.name.clone(),
                        referent: type_name.clone(),
                    })
                }
            }
        }
        (None, Some(candidates)) => {
            if candidates.is_empty() {
                return Err(RegistryError::EmptyChoice {
                    type_name: owner.to_string(),
                    field: field.name.clone(),
                });
            }
            if field.many {
                return Err(RegistryError::RepeatedChoice {
                    type_name: owner.to_string(),
                    field: field.name.clone(),
                });
            }
            for candidate in candidates {
                match by_name.get(candidate) {
                    None => {
                        return Err(RegistryError::UnknownChoiceCandidate {
                            type_name: owner.to_string(),
                            field: field.name.clone(),
                            candidate: candidate.clone(),
                        })
                    }
                    Some(c) if c.kind == TypeKind::Resource => {
                        return Err(RegistryError::ResourceFieldType {
                            type_name: owner.to_string(),
                            field: field.name.clone(),
                            referent: candidate.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
            FieldShape::Choice {
                candidates: candidates.clone(),
            }
        }
        _ => {
            return Err(RegistryError::FieldShapeConflict {
                type_name: owner.to_string(),
                field: field.name.clone(),
            })
        }
    };

    Ok(ResolvedField {
        name: field.name.clone(),
        many: field.many,
        shape,
    })
}

fn collect_recognized_keys(
    field: &ResolvedField,
    by_name: &HashMap<String, TypeDef>,
    recognized: &mut HashSet<String>,
) {
    match &field.shape {
        FieldShape::Primitive { .. } => {
            recognized.insert(field.name.clone());
            recognized.insert(format!("_{}", field.name));
        }
        FieldShape::Composite { .. } => {
            recognized.insert(field.name.clone());
        }
        FieldShape::Choice { candidates } => {
            for candidate in candidates {
                let key = choice_key(&field.name, candidate);
                let is_primitive = by_name
                    .get(candidate)
                    .is_some_and(|c| c.kind == TypeKind::PrimitiveType);
                if is_primitive {
                    recognized.insert(format!("_{key}"));
                }
                recognized.insert(key);
            }
        }
    }
}
