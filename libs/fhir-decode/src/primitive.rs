//! Lexical binding of primitive scalars
//!
//! Maps a present, non-null document node onto the scalar form a primitive
//! class expects: text primitives arrive as JSON strings, integer and decimal
//! primitives as numbers, booleans as true/false literals. Fractional numbers
//! do NOT bind to integer primitives; the lenient truncation some parsers
//! apply loses data and is rejected here.

use crate::node::{Node, NodeKind};
use crate::value::Scalar;
use lunte_schema::PrimitiveClass;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Why a scalar failed to bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScalarError {
    /// Node is of the wrong JSON kind for the class
    WrongKind { actual: NodeKind },
    /// Node is a number but does not fit the class (fractional integer,
    /// out-of-range magnitude)
    BadNumber { detail: String },
}

/// JSON kind a lexical class expects, for error messages
pub(crate) fn expected_kind(class: PrimitiveClass) -> &'static str {
    match class {
        PrimitiveClass::Text => "string",
        PrimitiveClass::Integer | PrimitiveClass::Decimal => "number",
        PrimitiveClass::Boolean => "boolean",
    }
}

/// Binds a present, non-null node to the class's scalar form
pub(crate) fn bind_scalar(class: PrimitiveClass, node: Node<'_>) -> Result<Scalar, ScalarError> {
    match class {
        PrimitiveClass::Text => match node.as_str() {
            Some(s) => Ok(Scalar::Text(s.to_string())),
            None => Err(ScalarError::WrongKind { actual: node.kind() }),
        },
        PrimitiveClass::Boolean => match node.raw().as_bool() {
            Some(b) => Ok(Scalar::Boolean(b)),
            None => Err(ScalarError::WrongKind { actual: node.kind() }),
        },
        PrimitiveClass::Integer => {
            let Some(number) = node.raw().as_number() else {
                return Err(ScalarError::WrongKind { actual: node.kind() });
            };
            number
                .as_i64()
                .map(Scalar::Integer)
                .ok_or_else(|| ScalarError::BadNumber {
                    detail: format!("number {} is not a valid integer value", number),
                })
        }
        PrimitiveClass::Decimal => {
            let Some(number) = node.raw().as_number() else {
                return Err(ScalarError::WrongKind { actual: node.kind() });
            };
            let text = number.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map(Scalar::Decimal)
                .map_err(|_| ScalarError::BadNumber {
                    detail: format!("number {} is out of decimal range", number),
                })
        }
    }
}
