//! Schema model for the lunte decode engine
//!
//! This crate holds the *data* half of the engine, a declarative description
//! of every type in the domain: primitives with their lexical classes,
//! complex types with ordered field lists and base-type inheritance, and
//! resources selectable by the top-level discriminator. The decode engine in
//! `lunte-decode` is parameterized by a [`TypeRegistry`] and contains no
//! per-type code of its own.
//!
//! Registries are built once, validated eagerly, and shared read-only:
//!
//! ```text
//! SchemaDocument (declarative JSON) → RegistryBuilder::build() → TypeRegistry
//! ```
//!
//! Construction resolves every field reference, flattens base chains
//! (parent fields first), precomputes the document keys each type accounts
//! for (including `_`-prefixed extension carriers and suffixed choice
//! variants), and fixes the discriminator → resource dispatch map. Anything
//! inconsistent fails with a [`RegistryError`] here rather than at decode
//! time.
//!
//! A small embedded core artifact ([`TypeRegistry::core`]) covers the common
//! datatypes plus two demo resources; real deployments load their own
//! artifact via [`TypeRegistry::from_json`].

mod error;
mod registry;
mod types;

pub use error::{RegistryError, Result};
pub use registry::{FieldShape, RegistryBuilder, ResolvedField, ResolvedType, TypeRegistry};
pub use types::{choice_key, FieldDef, PrimitiveClass, SchemaDocument, TypeDef, TypeKind};
