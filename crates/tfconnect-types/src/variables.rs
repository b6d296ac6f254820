//! Flat variable set passed to the engine.

use serde::{Deserialize, Serialize};

use crate::action::PropertyBag;

/// Variable name carrying the state key.
pub const ENTITY_IDENTIFIER_VAR: &str = "entity_identifier";
/// Variable name carrying the blueprint identifier.
pub const BLUEPRINT_VAR: &str = "blueprint";
/// Variable name carrying the run identifier.
pub const RUN_ID_VAR: &str = "run_id";

/// Reserved variable names; these always win on conflict.
pub const RESERVED_VARS: [&str; 3] = [ENTITY_IDENTIFIER_VAR, BLUEPRINT_VAR, RUN_ID_VAR];

/// Mapping from variable name to JSON value.
///
/// Serializes to a flat JSON object, which is the engine's
/// `*.tfvars.json` format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSet(PropertyBag);

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay `source` onto this set, key by key.
    ///
    /// Later sources overwrite earlier ones. Nested objects are replaced
    /// whole, never deep-merged.
    pub fn overlay(&mut self, source: &PropertyBag) {
        for (k, v) in source {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &PropertyBag {
        &self.0
    }

    pub fn into_map(self) -> PropertyBag {
        self.0
    }
}

impl From<PropertyBag> for VariableSet {
    fn from(map: PropertyBag) -> Self {
        Self(map)
    }
}
