//! The decode engine
//!
//! [`Decoder`] is the reusable half: it owns the compiled plan and the shared
//! type registry. Every call creates a short-lived [`DecodeRun`] that owns
//! the path stack and the depth budget, recursing schema-first through the
//! document: composites walk their declared fields in order, primitives merge
//! with their `_`-prefixed extension carriers, choice fields resolve their
//! type-suffixed key, and the top-level dispatcher selects the resource
//! schema from the `resourceType` discriminator.

use crate::choice::scan_choice;
use crate::error::{ConfigError, DecodeError, ErrorKind};
use crate::node::{Node, NodeKind};
use crate::path::PathTracker;
use crate::plan::DecodePlan;
use crate::primitive::{bind_scalar, expected_kind, ScalarError};
use crate::value::{Composite, ParsedValue, PrimitiveValue, Resource};
use crate::DecoderConfig;
use lunte_schema::{FieldShape, ResolvedField, ResolvedType, TypeKind, TypeRegistry};
use serde_json::Value;
use std::sync::Arc;

/// Reusable decode engine - owns the plan and the shared registry
pub struct Decoder {
    plan: DecodePlan,
    registry: Arc<TypeRegistry>,
}

impl Decoder {
    pub fn new(plan: DecodePlan, registry: Arc<TypeRegistry>) -> Self {
        Self { plan, registry }
    }

    pub fn from_config(
        config: &DecoderConfig,
        registry: Arc<TypeRegistry>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(config.compile()?, registry))
    }

    pub fn plan(&self) -> &DecodePlan {
        &self.plan
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Dispatches on the top-level `resourceType` discriminator and decodes
    /// the whole document.
    pub fn decode(&self, document: &Value) -> Result<Resource, DecodeError> {
        DecodeRun::new(&self.plan, &self.registry).decode_resource(Node::new(document))
    }

    /// Decodes against a caller-named schema entry point instead of the
    /// discriminator.
    pub fn decode_as(&self, type_name: &str, document: &Value) -> Result<ParsedValue, DecodeError> {
        DecodeRun::new(&self.plan, &self.registry).decode_entry(type_name, Node::new(document))
    }

    pub fn decode_batch(&self, documents: &[Value]) -> Vec<Result<Resource, DecodeError>> {
        documents.iter().map(|d| self.decode(d)).collect()
    }
}

/// Short-lived decode execution; owns the path stack and depth budget
struct DecodeRun<'a> {
    plan: &'a DecodePlan,
    registry: &'a TypeRegistry,
    path: PathTracker,
    depth: usize,
}

impl<'a> DecodeRun<'a> {
    fn new(plan: &'a DecodePlan, registry: &'a TypeRegistry) -> Self {
        Self {
            plan,
            registry,
            path: PathTracker::new(),
            depth: 0,
        }
    }

    // ------------------------------------------------------------------
    // Top-level entry points
    // ------------------------------------------------------------------

    fn decode_resource(mut self, root: Node<'_>) -> Result<Resource, DecodeError> {
        if root.kind() != NodeKind::Object {
            return Err(self.error(
                ErrorKind::TypeMismatch,
                format!("expected object at document root, found {}", root.kind()),
            ));
        }

        let kind = match root.field("resourceType") {
            None => {
                return Err(self.framed_error(
                    "resourceType",
                    ErrorKind::UnknownResourceKind,
                    "document has no resourceType discriminator".to_string(),
                ))
            }
            Some(node) => match node.as_str() {
                Some(kind) => kind,
                None => {
                    return Err(self.framed_error(
                        "resourceType",
                        ErrorKind::TypeMismatch,
                        format!("expected string for resourceType, found {}", node.kind()),
                    ))
                }
            },
        };

        let registry = self.registry;
        let Some(ty) = registry.resource(kind) else {
            let message = if registry.contains(kind) {
                format!("resource kind '{}' is abstract and cannot be decoded", kind)
            } else {
                format!("unknown resource kind '{}'", kind)
            };
            return Err(self.framed_error(
                "resourceType",
                ErrorKind::UnknownResourceKind,
                message,
            ));
        };

        if !self.plan.allows_kind(kind) {
            return Err(self.framed_error(
                "resourceType",
                ErrorKind::UnsupportedResourceKind,
                format!("resource kind '{}' is not in the supported set", kind),
            ));
        }

        let body = self.with_frame(kind, None, |run| run.decode_composite(ty, root))?;
        Ok(Resource {
            kind: kind.to_string(),
            body,
        })
    }

    fn decode_entry(mut self, type_name: &str, root: Node<'_>) -> Result<ParsedValue, DecodeError> {
        let registry = self.registry;
        let Some(ty) = registry.get(type_name) else {
            return Err(self.error(
                ErrorKind::UnknownResourceKind,
                format!("schema has no entry point type '{}'", type_name),
            ));
        };

        match ty.kind {
            TypeKind::PrimitiveType => {
                let primitive = self.with_frame(&ty.name, None, |run| {
                    run.bind_primitive(ty, Some(root), None, None)
                })?;
                Ok(ParsedValue::Primitive(primitive))
            }
            TypeKind::ComplexType => {
                let composite =
                    self.with_frame(&ty.name, None, |run| run.decode_composite(ty, root))?;
                Ok(ParsedValue::Composite(composite))
            }
            TypeKind::Resource => {
                let body =
                    self.with_frame(&ty.name, None, |run| run.decode_composite(ty, root))?;
                Ok(ParsedValue::Resource(Resource {
                    kind: ty.name.clone(),
                    body,
                }))
            }
        }
    }

    // ------------------------------------------------------------------
    // Composite walker
    // ------------------------------------------------------------------

    fn decode_composite(
        &mut self,
        ty: &ResolvedType,
        node: Node<'_>,
    ) -> Result<Composite, DecodeError> {
        if node.kind() != NodeKind::Object {
            return Err(self.error(
                ErrorKind::TypeMismatch,
                format!("expected object for {}, found {}", ty.name, node.kind()),
            ));
        }

        self.depth += 1;
        let result = if self.depth > self.plan.max_recursion_depth {
            Err(self.error(
                ErrorKind::DepthExceeded,
                format!(
                    "nesting exceeds the configured maximum depth of {}",
                    self.plan.max_recursion_depth
                ),
            ))
        } else {
            self.decode_fields(ty, node)
        };
        self.depth -= 1;
        result
    }

    fn decode_fields(
        &mut self,
        ty: &ResolvedType,
        node: Node<'_>,
    ) -> Result<Composite, DecodeError> {
        if self.plan.strict {
            for key in node.keys() {
                if !ty.recognizes(key) {
                    return Err(self.framed_error(
                        key,
                        ErrorKind::UnrecognizedElement,
                        format!("unrecognized element '{}'", key),
                    ));
                }
            }
        }

        let mut fields = Vec::new();
        for field in &ty.fields {
            if let Some(value) = self.decode_field(field, node)? {
                fields.push((field.name.clone(), value));
            }
        }

        Ok(Composite {
            type_name: ty.name.clone(),
            fields,
        })
    }

    fn decode_field(
        &mut self,
        field: &ResolvedField,
        node: Node<'_>,
    ) -> Result<Option<ParsedValue>, DecodeError> {
        match &field.shape {
            FieldShape::Primitive { type_name } => {
                let ty = self.lookup(type_name)?;
                let value_node = node.field(&field.name);
                let carrier_node = node.field(&format!("_{}", field.name));

                if field.many {
                    return self.decode_primitive_list(field, ty, value_node, carrier_node);
                }
                if value_node.is_none() && carrier_node.is_none() {
                    return Ok(None);
                }

                let primitive = self.with_frame(&field.name, None, |run| {
                    run.bind_primitive(ty, value_node, carrier_node, None)
                })?;
                Ok(Some(ParsedValue::Primitive(primitive)))
            }
            FieldShape::Composite { type_name } => {
                let ty = self.lookup(type_name)?;
                let Some(value_node) = node.field(&field.name) else {
                    return Ok(None);
                };
                if value_node.is_null() {
                    return Ok(None);
                }

                if field.many {
                    return self.decode_composite_list(field, ty, value_node);
                }

                let composite = self.with_frame(&field.name, None, |run| {
                    run.decode_composite(ty, value_node)
                })?;
                Ok(Some(ParsedValue::Composite(composite)))
            }
            FieldShape::Choice { candidates } => self.decode_choice(field, candidates, node),
        }
    }

    /// Repeated primitive: the value array and the carrier array pair index
    /// by index. The output length equals the value array's length; a carrier
    /// array may only be longer when the value array is absent entirely.
    fn decode_primitive_list(
        &mut self,
        field: &ResolvedField,
        ty: &ResolvedType,
        value_node: Option<Node<'_>>,
        carrier_node: Option<Node<'_>>,
    ) -> Result<Option<ParsedValue>, DecodeError> {
        if value_node.is_none() && carrier_node.is_none() {
            return Ok(None);
        }

        let carrier_key = format!("_{}", field.name);
        let values = self.expect_elements(&field.name, value_node)?;
        let carriers = self.expect_elements(&carrier_key, carrier_node)?;

        let (len, values, carriers) = match (values, carriers) {
            (Some(values), Some(carriers)) => {
                if carriers.len() > values.len() {
                    return Err(self.framed_error(
                        &field.name,
                        ErrorKind::TypeMismatch,
                        format!(
                            "extension carrier array has {} entries but the value array has {}",
                            carriers.len(),
                            values.len()
                        ),
                    ));
                }
                (values.len(), Some(values), Some(carriers))
            }
            (Some(values), None) => (values.len(), Some(values), None),
            // all-extension sparse case: no value array at all
            (None, Some(carriers)) => (carriers.len(), None, Some(carriers)),
            (None, None) => return Ok(None),
        };

        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            let value_el = values.and_then(|v| v.get(i)).map(Node::new);
            let carrier_el = carriers.and_then(|c| c.get(i)).map(Node::new);
            let primitive = self.with_frame(&field.name, Some(i), |run| {
                run.bind_primitive(ty, value_el, carrier_el, Some(i))
            })?;
            items.push(ParsedValue::Primitive(primitive));
        }

        Ok(Some(ParsedValue::List(items)))
    }

    fn decode_composite_list(
        &mut self,
        field: &ResolvedField,
        ty: &ResolvedType,
        value_node: Node<'_>,
    ) -> Result<Option<ParsedValue>, DecodeError> {
        let Some(elements) = value_node.elements() else {
            return Err(self.framed_error(
                &field.name,
                ErrorKind::TypeMismatch,
                format!("expected array for '{}', found {}", field.name, value_node.kind()),
            ));
        };

        let mut items = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            let composite = self.with_frame(&field.name, Some(i), |run| {
                run.decode_composite(ty, Node::new(element))
            })?;
            items.push(ParsedValue::Composite(composite));
        }

        Ok(Some(ParsedValue::List(items)))
    }

    // ------------------------------------------------------------------
    // Choice resolver
    // ------------------------------------------------------------------

    fn decode_choice(
        &mut self,
        field: &ResolvedField,
        candidates: &[String],
        node: Node<'_>,
    ) -> Result<Option<ParsedValue>, DecodeError> {
        let scan = scan_choice(node, &field.name, candidates, self.registry);

        if scan.value_hits.len() > 1 {
            let keys: Vec<&str> = scan.value_hits.iter().map(|h| h.key.as_str()).collect();
            return Err(self.framed_error(
                &field.name,
                ErrorKind::AmbiguousChoice,
                format!(
                    "choice field '{}' is populated through multiple keys: {}",
                    field.name,
                    keys.join(", ")
                ),
            ));
        }
        if scan.carrier_hits.len() > 1 {
            let keys: Vec<String> = scan
                .carrier_hits
                .iter()
                .map(|h| format!("_{}", h.key))
                .collect();
            return Err(self.framed_error(
                &field.name,
                ErrorKind::AmbiguousChoice,
                format!(
                    "choice field '{}' has multiple extension carriers: {}",
                    field.name,
                    keys.join(", ")
                ),
            ));
        }

        let (candidate_index, key) = match (scan.value_hits.first(), scan.carrier_hits.first()) {
            (None, None) => return Ok(None),
            (Some(v), Some(c)) if v.candidate != c.candidate => {
                return Err(self.framed_error(
                    &field.name,
                    ErrorKind::InconsistentChoice,
                    format!(
                        "value key '{}' and extension carrier '_{}' name different candidate types",
                        v.key, c.key
                    ),
                ));
            }
            (Some(v), _) => (v.candidate, v.key.clone()),
            (None, Some(c)) => (c.candidate, c.key.clone()),
        };

        let ty = self.lookup(&candidates[candidate_index])?;
        if ty.is_primitive() {
            let value_node = node.field(&key);
            let carrier_node = node.field(&format!("_{}", key));
            let primitive = self.with_frame(&key, None, |run| {
                run.bind_primitive(ty, value_node, carrier_node, None)
            })?;
            Ok(Some(ParsedValue::Primitive(primitive)))
        } else {
            // composite candidates have no carrier key, so the scan
            // guarantees the value key is present here
            let Some(value_node) = node.field(&key) else {
                return Ok(None);
            };
            let composite =
                self.with_frame(&key, None, |run| run.decode_composite(ty, value_node))?;
            Ok(Some(ParsedValue::Composite(composite)))
        }
    }

    // ------------------------------------------------------------------
    // Primitive binder
    // ------------------------------------------------------------------

    /// Merges a primitive's scalar node with its extension carrier.
    /// `position` is `None` for non-array fields; inside arrays it is the
    /// element index and relaxes the null rules (sparse slots).
    fn bind_primitive(
        &mut self,
        ty: &ResolvedType,
        value_node: Option<Node<'_>>,
        carrier_node: Option<Node<'_>>,
        position: Option<usize>,
    ) -> Result<PrimitiveValue, DecodeError> {
        let Some(class) = ty.class else {
            return Err(self.error(
                ErrorKind::TypeMismatch,
                format!("schema registry type '{}' has no lexical class", ty.name),
            ));
        };

        let element = match carrier_node {
            None => None,
            // tolerated: "no extension" at the top level, sparse slot in arrays
            Some(node) if node.is_null() => None,
            Some(node) if node.kind() == NodeKind::Object => {
                let element_ty = self.lookup("Element")?;
                Some(self.decode_composite(element_ty, node)?)
            }
            Some(node) => {
                return Err(self.error(
                    ErrorKind::TypeMismatch,
                    format!("expected object for extension carrier, found {}", node.kind()),
                ))
            }
        };

        let value = match value_node {
            None => None,
            Some(node) if node.is_null() => {
                if position.is_none() {
                    return Err(self.error(
                        ErrorKind::TypeMismatch,
                        format!("null is not a valid {} value outside an array", ty.name),
                    ));
                }
                None
            }
            Some(node) => match bind_scalar(class, node) {
                Ok(scalar) => Some(scalar),
                Err(ScalarError::WrongKind { actual }) => {
                    return Err(self.error(
                        ErrorKind::TypeMismatch,
                        format!(
                            "expected {} for {}, found {}",
                            expected_kind(class),
                            ty.name,
                            actual
                        ),
                    ))
                }
                Err(ScalarError::BadNumber { detail }) => {
                    return Err(self.error(ErrorKind::TypeMismatch, detail))
                }
            },
        };

        Ok(PrimitiveValue {
            type_name: ty.name.clone(),
            value,
            element,
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Unwraps an optional array-shaped node; a present `null` counts as
    /// absent.
    fn expect_elements<'n>(
        &mut self,
        display_name: &str,
        node: Option<Node<'n>>,
    ) -> Result<Option<&'n [Value]>, DecodeError> {
        match node {
            None => Ok(None),
            Some(n) if n.is_null() => Ok(None),
            Some(n) => match n.elements() {
                Some(elements) => Ok(Some(elements)),
                None => Err(self.framed_error(
                    display_name,
                    ErrorKind::TypeMismatch,
                    format!("expected array for '{}', found {}", display_name, n.kind()),
                )),
            },
        }
    }

    fn lookup(&self, name: &str) -> Result<&'a Arc<ResolvedType>, DecodeError> {
        let registry = self.registry;
        registry.get(name).ok_or_else(|| {
            self.error(
                ErrorKind::TypeMismatch,
                format!("schema registry has no type '{}'", name),
            )
        })
    }

    /// Runs `f` inside a path frame; the pop is guaranteed on both the `Ok`
    /// and the `Err` exit. Errors render their path on construction, so the
    /// failure location survives the pop.
    fn with_frame<T>(
        &mut self,
        name: &str,
        index: Option<usize>,
        f: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        self.path.push(name, index);
        let result = f(self);
        self.path.pop();
        result
    }

    fn error(&self, kind: ErrorKind, message: String) -> DecodeError {
        DecodeError::new(kind, self.path.render(), message)
    }

    /// Error located one frame below the current position
    fn framed_error(&mut self, name: &str, kind: ErrorKind, message: String) -> DecodeError {
        self.path.push(name, None);
        let err = self.error(kind, message);
        self.path.pop();
        err
    }
}
