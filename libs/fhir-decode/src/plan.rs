//! Compiled decode plan

use std::collections::HashSet;

/// Executable form of a [`crate::DecoderConfig`]
///
/// Produced by `DecoderConfig::compile`; everything the run loop consults has
/// been validated and put into lookup-friendly shape.
#[derive(Debug, Clone)]
pub struct DecodePlan {
    /// Reject unrecognized document keys instead of ignoring them
    pub strict: bool,
    /// Dispatchable resource kinds; `None` allows every non-abstract resource
    /// the registry knows
    pub supported_resource_kinds: Option<HashSet<String>>,
    pub max_recursion_depth: usize,
}

impl DecodePlan {
    pub(crate) fn allows_kind(&self, kind: &str) -> bool {
        match &self.supported_resource_kinds {
            Some(kinds) => kinds.contains(kind),
            None => true,
        }
    }
}
