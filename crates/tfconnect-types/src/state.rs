//! State key and run outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the persistent state object in the engine's backend.
///
/// Either the entity reference carried by the event, or a freshly minted
/// token of the form `e_<16 hex chars>` for an entity that does not exist
/// yet. The same entity must resolve to the same key for its whole
/// lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    /// Marker prepended to minted keys.
    pub const PREFIX: &'static str = "e_";

    /// Number of random hex characters in a minted key.
    pub const TOKEN_LEN: usize = 16;

    /// Mint a new random key.
    pub fn mint() -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", Self::PREFIX, &token[..Self::TOKEN_LEN]))
    }

    /// Wrap an existing entity reference unchanged.
    pub fn from_entity(entity_ref: impl Into<String>) -> Self {
        Self(entity_ref.into())
    }

    /// Whether the key has the shape of a minted key.
    pub fn is_minted(&self) -> bool {
        self.0
            .strip_prefix(Self::PREFIX)
            .is_some_and(|t| t.len() == Self::TOKEN_LEN && t.chars().all(|c| c.is_ascii_hexdigit()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How an `apply` should treat the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// Converge the remote state toward the rendered configuration.
    Apply,
    /// Tear down everything tracked under the state key.
    Destroy,
}

impl fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyMode::Apply => f.write_str("apply"),
            ApplyMode::Destroy => f.write_str("destroy"),
        }
    }
}

/// Final status reported upstream for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Success,
    Failure,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Success => f.write_str("SUCCESS"),
            ActionStatus::Failure => f.write_str("FAILURE"),
        }
    }
}

/// Result of a successful apply or destroy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub run_id: String,
    pub state_key: StateKey,
    pub mode: ApplyMode,
    /// Entity id read back from engine state, when extraction is enabled
    /// and a single entity resource was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn minted_key_has_prefix_and_length() {
        let key = StateKey::mint();
        assert!(key.as_str().starts_with("e_"));
        assert_eq!(key.as_str().len(), StateKey::PREFIX.len() + StateKey::TOKEN_LEN);
        assert!(key.is_minted());
    }

    #[test]
    fn minted_keys_do_not_collide() {
        let keys: HashSet<StateKey> = (0..10_000).map(|_| StateKey::mint()).collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn entity_key_is_unchanged() {
        let key = StateKey::from_entity("my-bucket");
        assert_eq!(key.as_str(), "my-bucket");
        assert!(!key.is_minted());
    }

    #[test]
    fn action_status_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&ActionStatus::Success).unwrap(), "\"SUCCESS\"");
        assert_eq!(ActionStatus::Failure.to_string(), "FAILURE");
    }

    #[test]
    fn state_key_serializes_transparently() {
        let key = StateKey::from_entity("e_abc123");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"e_abc123\"");
    }
}
