//! Helpers for reading the engine's JSON state document.

use serde_json::Value;

/// Resource type whose `id` attribute is the upstream entity identifier.
pub const ENTITY_RESOURCE_TYPE: &str = "port-labs_entity";

/// Extract the entity id from a `show -json` state document.
///
/// Returns the `id` attribute of the root-module resource of type
/// [`ENTITY_RESOURCE_TYPE`] when exactly one such resource exists.
/// Zero or several matches are ambiguous and yield `None`.
pub fn extract_entity_id(state: &Value) -> Option<String> {
    let resources = state
        .get("values")?
        .get("root_module")?
        .get("resources")?
        .as_array()?;

    let mut entities = resources
        .iter()
        .filter(|r| r.get("type").and_then(Value::as_str) == Some(ENTITY_RESOURCE_TYPE));

    let first = entities.next()?;
    if entities.next().is_some() {
        return None;
    }

    first
        .get("values")?
        .get("id")?
        .as_str()
        .map(str::to_string)
}
