//! Choice-field key scanning
//!
//! A choice field (`value[x]` style) is encoded with a type-suffixed key:
//! `value` + `dateTime` → `valueDateTime`. Primitive candidates additionally
//! have a `_`-prefixed extension-carrier counterpart. The scan collects every
//! hit; the walker turns multiple hits into ambiguity errors.

use crate::node::Node;
use lunte_schema::{choice_key, TypeRegistry};

/// One matched key: candidate index into the declaration-order list plus the
/// plain (un-prefixed) key it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChoiceHit {
    pub candidate: usize,
    pub key: String,
}

/// Raw scan outcome, before ambiguity rules are applied
#[derive(Debug, Default)]
pub(crate) struct ChoiceScan {
    pub value_hits: Vec<ChoiceHit>,
    pub carrier_hits: Vec<ChoiceHit>,
}

/// Checks every candidate's suffixed key (and, for primitive candidates, its
/// carrier counterpart) against the object's own keys.
pub(crate) fn scan_choice(
    node: Node<'_>,
    base: &str,
    candidates: &[String],
    registry: &TypeRegistry,
) -> ChoiceScan {
    let mut scan = ChoiceScan::default();

    for (index, candidate) in candidates.iter().enumerate() {
        let key = choice_key(base, candidate);

        if node.field(&key).is_some() {
            scan.value_hits.push(ChoiceHit {
                candidate: index,
                key: key.clone(),
            });
        }

        let is_primitive = registry
            .get(candidate)
            .is_some_and(|ty| ty.is_primitive());
        if is_primitive && node.field(&format!("_{key}")).is_some() {
            scan.carrier_hits.push(ChoiceHit {
                candidate: index,
                key,
            });
        }
    }

    scan
}
