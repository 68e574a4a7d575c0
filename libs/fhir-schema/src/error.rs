use thiserror::Error;

/// Errors raised while building a type registry from schema definitions
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate type definition '{0}'")]
    DuplicateType(String),

    #[error("primitive type '{0}' is missing its lexical class")]
    MissingPrimitiveClass(String),

    #[error("type '{0}' declares a lexical class but is not a primitive")]
    UnexpectedClass(String),

    #[error("primitive type '{0}' may not declare fields or a base")]
    PrimitiveWithMembers(String),

    #[error("type '{type_name}' has unknown base '{base}'")]
    UnknownBase { type_name: String, base: String },

    #[error("type '{type_name}' has primitive base '{base}'")]
    PrimitiveBase { type_name: String, base: String },

    #[error("base chain of type '{0}' contains a cycle")]
    BaseCycle(String),

    #[error("field '{type_name}.{field}' must declare exactly one of 'type' or 'choice'")]
    FieldShapeConflict { type_name: String, field: String },

    #[error("field '{type_name}.{field}' references unknown type '{referent}'")]
    UnknownFieldType {
        type_name: String,
        field: String,
        referent: String,
    },

    #[error("field '{type_name}.{field}' uses resource type '{referent}' as a field type")]
    ResourceFieldType {
        type_name: String,
        field: String,
        referent: String,
    },

    #[error("choice field '{type_name}.{field}' lists unknown candidate '{candidate}'")]
    UnknownChoiceCandidate {
        type_name: String,
        field: String,
        candidate: String,
    },

    #[error("choice field '{type_name}.{field}' has no candidates")]
    EmptyChoice { type_name: String, field: String },

    #[error("choice field '{type_name}.{field}' cannot be repeated")]
    RepeatedChoice { type_name: String, field: String },

    #[error("field '{type_name}.{field}' is declared more than once in the base chain")]
    DuplicateField { type_name: String, field: String },

    #[error("schema declares primitive types but no 'Element' complex type")]
    MissingElementType,

    #[error("malformed schema artifact: {0}")]
    Artifact(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
