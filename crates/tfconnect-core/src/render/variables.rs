//! Variable set construction and the engine variable file.

use std::path::{Path, PathBuf};

use tfconnect_types::action::PropertyBag;
use tfconnect_types::error::BridgeError;
use tfconnect_types::state::StateKey;
use tfconnect_types::variables::{BLUEPRINT_VAR, ENTITY_IDENTIFIER_VAR, RUN_ID_VAR, VariableSet};

use crate::workspace::write_private_file;

/// File name of the variable file inside a workspace.
pub const VAR_FILE_NAME: &str = "port.tfvars.json";

/// Build the variable set for one operation.
///
/// Precedence, low to high: entity properties, payload properties, then
/// the reserved keys `entity_identifier`, `blueprint` and `run_id`.
/// Destroy passes `None` for the entity properties.
pub fn build_variables(
    entity_props: Option<&PropertyBag>,
    payload_props: &PropertyBag,
    state_key: &StateKey,
    blueprint: &str,
    run_id: &str,
) -> VariableSet {
    let reserved = reserved_variables(state_key, blueprint, run_id);
    let empty = PropertyBag::new();
    merge_sources(&[entity_props.unwrap_or(&empty), payload_props, &reserved])
}

/// The three operation-metadata variables.
pub fn reserved_variables(state_key: &StateKey, blueprint: &str, run_id: &str) -> PropertyBag {
    let mut reserved = PropertyBag::new();
    reserved.insert(ENTITY_IDENTIFIER_VAR.to_string(), state_key.as_str().into());
    reserved.insert(BLUEPRINT_VAR.to_string(), blueprint.into());
    reserved.insert(RUN_ID_VAR.to_string(), run_id.into());
    reserved
}

/// Shallow-merge `sources` in order; later keys overwrite earlier ones.
pub fn merge_sources(sources: &[&PropertyBag]) -> VariableSet {
    let mut vars = VariableSet::new();
    for source in sources {
        vars.overlay(source);
    }
    vars
}

/// Serialize a variable set to the engine's JSON variable-file format.
pub fn serialize_variables(vars: &VariableSet) -> Result<Vec<u8>, BridgeError> {
    serde_json::to_vec_pretty(vars).map_err(|e| BridgeError::SerializationError(e.to_string()))
}

/// Write the variable file into `dir` with owner-only permissions.
pub async fn write_var_file(dir: &Path, vars: &VariableSet) -> Result<PathBuf, BridgeError> {
    let bytes = serialize_variables(vars)?;
    write_private_file(dir, VAR_FILE_NAME, &bytes).await
}
