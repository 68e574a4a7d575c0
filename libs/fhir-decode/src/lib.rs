//! Schema-driven decode engine for FHIR-style JSON documents
//!
//! # Architecture
//!
//! One generic, data-driven walker replaces the per-type parse functions such
//! formats usually accumulate. The engine is parameterized by a
//! [`lunte_schema::TypeRegistry`] and separates configuration, planning, and
//! execution:
//!
//! ```text
//! DecoderConfig (declarative) → DecodePlan (executable) → Decoder (reusable)
//! ```
//!
//! ## Phase 1: Declarative Configuration
//!
//! [`DecoderConfig`] selects strict vs. lenient handling of unrecognized
//! keys, an optional allow-list of dispatchable resource kinds, and the
//! recursion budget. Serializable (YAML/JSON).
//!
//! ## Phase 2: Compiled Plan
//!
//! `compile()` validates the configuration and produces a [`DecodePlan`] in
//! lookup-friendly shape.
//!
//! ## Phase 3: Reusable Decoder & Per-Call Runs
//!
//! [`Decoder`] owns the plan and the shared registry and is reusable across
//! calls and threads; every `decode*` call creates a short-lived run that
//! owns its own path stack and depth counter, so concurrent decodes never
//! interfere.
//!
//! # Key properties
//!
//! - **Data-driven**: type behavior is table lookup over the registry, never
//!   a per-type match arm
//! - **Fail-fast**: the first structural error aborts the call, carrying the
//!   location as a rendered path (`Patient.name[0].given[2]`)
//! - **Sparse-array aware**: repeated primitives pair a value array with its
//!   `_`-prefixed extension-carrier array index by index
//! - **No I/O, no logging**: input is a materialized `serde_json::Value`;
//!   failures are values, never log lines or panics

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

mod choice;
mod decoder;
mod error;
mod node;
mod path;
mod plan;
mod primitive;
mod value;

pub use decoder::Decoder;
pub use error::{ConfigError, DecodeError, ErrorKind};
pub use node::{Node, NodeKind};
pub use path::{PathFrame, PathTracker};
pub use plan::DecodePlan;
pub use value::{Composite, ParsedValue, PrimitiveValue, Resource, Scalar};

// ============================================================================
// Core Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Handling of document keys the schema does not account for
    #[serde(default)]
    pub unknown_elements: UnknownElements,

    /// Explicit allow-list of dispatchable resource kinds. Omitted = every
    /// non-abstract resource in the registry is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_resource_kinds: Option<Vec<String>>,

    /// Hard bound on composite nesting; exceeding it fails with
    /// `depth-exceeded` instead of overflowing the call stack
    #[serde(default = "default_max_recursion_depth")]
    pub max_recursion_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownElements {
    /// Reject with `unrecognized-element`
    #[default]
    Strict,
    /// Ignore silently
    Lenient,
}

fn default_max_recursion_depth() -> usize {
    128
}

impl DecoderConfig {
    pub fn defaults() -> Self {
        Self {
            unknown_elements: UnknownElements::Strict,
            supported_resource_kinds: None,
            max_recursion_depth: default_max_recursion_depth(),
        }
    }

    /// Defaults with unknown keys ignored
    pub fn lenient() -> Self {
        Self {
            unknown_elements: UnknownElements::Lenient,
            ..Self::defaults()
        }
    }

    pub fn builder() -> DecoderConfigBuilder {
        DecoderConfigBuilder::default()
    }

    pub fn compile(&self) -> Result<DecodePlan, ConfigError> {
        if self.max_recursion_depth == 0 {
            return Err(ConfigError::ZeroRecursionDepth);
        }

        let supported_resource_kinds = match &self.supported_resource_kinds {
            None => None,
            Some(kinds) => {
                if kinds.is_empty() {
                    return Err(ConfigError::EmptySupportSet);
                }
                let mut set = HashSet::with_capacity(kinds.len());
                for kind in kinds {
                    if !set.insert(kind.clone()) {
                        return Err(ConfigError::DuplicateResourceKind(kind.clone()));
                    }
                }
                Some(set)
            }
        };

        Ok(DecodePlan {
            strict: self.unknown_elements == UnknownElements::Strict,
            supported_resource_kinds,
            max_recursion_depth: self.max_recursion_depth,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

// ============================================================================
// Builder Pattern
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct DecoderConfigBuilder {
    cfg: Option<DecoderConfig>,
}

impl DecoderConfigBuilder {
    pub fn unknown_elements(mut self, mode: UnknownElements) -> Self {
        self.cfg().unknown_elements = mode;
        self
    }

    pub fn supported_resource_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cfg().supported_resource_kinds =
            Some(kinds.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.cfg().max_recursion_depth = depth;
        self
    }

    pub fn build(self) -> DecoderConfig {
        self.cfg.unwrap_or_default()
    }

    fn cfg(&mut self) -> &mut DecoderConfig {
        self.cfg.get_or_insert_with(DecoderConfig::defaults)
    }
}
