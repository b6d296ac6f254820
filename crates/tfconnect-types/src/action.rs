//! Action event types.
//!
//! [`ActionBody`] is the JSON document the triggering system POSTs to the
//! webhook. [`ActionEvent`] is the validated domain view of it that the
//! orchestrator works with.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Free-form string-keyed bag of JSON values.
///
/// Used for both the entity's current properties and the action's input
/// payload. Merging is shallow (see `VariableSet`).
pub type PropertyBag = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Trigger kind
// ---------------------------------------------------------------------------

/// The lifecycle event that triggered an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    /// First-time creation of an entity.
    #[serde(rename = "CREATE")]
    Create,
    /// Update of an existing entity.
    #[serde(rename = "DAY-2")]
    Day2Update,
    /// Removal of an existing entity.
    #[serde(rename = "DELETE")]
    Delete,
}

impl TriggerKind {
    /// Wire representation used by the triggering system.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Create => "CREATE",
            TriggerKind::Day2Update => "DAY-2",
            TriggerKind::Delete => "DELETE",
        }
    }

    /// Whether this trigger tears infrastructure down.
    pub fn is_destructive(&self) -> bool {
        matches!(self, TriggerKind::Delete)
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(TriggerKind::Create),
            "DAY-2" => Ok(TriggerKind::Day2Update),
            "DELETE" => Ok(TriggerKind::Delete),
            other => Err(BridgeError::UnknownTrigger(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain event
// ---------------------------------------------------------------------------

/// A validated inbound operation.
///
/// Exactly one trigger kind; the blueprint is always present. The entity
/// reference is `None` for a first-time create and `Some` once the entity
/// exists. Blank strings never appear as an entity reference; any other
/// value is kept exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub trigger: TriggerKind,
    pub run_id: String,
    pub entity_ref: Option<String>,
    pub blueprint: String,
    pub entity_properties: PropertyBag,
    pub payload_properties: PropertyBag,
}

impl ActionEvent {
    /// Convert a raw [`ActionBody`] into a domain event.
    ///
    /// Fails with [`BridgeError::UnknownTrigger`] when the trigger string is
    /// not one of `CREATE`, `DAY-2`, `DELETE`, and with
    /// [`BridgeError::InvalidEvent`] when the run id or blueprint is blank.
    pub fn from_body(body: &ActionBody) -> Result<Self, BridgeError> {
        let trigger = body.payload.action.trigger.parse::<TriggerKind>().map_err(|_| {
            let label = if body.payload.action.identifier.is_empty() {
                body.payload.action.trigger.clone()
            } else {
                body.payload.action.identifier.clone()
            };
            BridgeError::UnknownTrigger(label)
        })?;

        if body.context.run_id.trim().is_empty() {
            return Err(BridgeError::InvalidEvent("context.runId is empty".to_string()));
        }
        if body.context.blueprint.trim().is_empty() {
            return Err(BridgeError::InvalidEvent(
                "context.blueprint is empty".to_string(),
            ));
        }

        let entity_ref = body
            .context
            .entity
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .map(str::to_string);

        let entity_properties = body
            .payload
            .entity
            .as_ref()
            .map(|e| e.properties.clone())
            .unwrap_or_default();

        Ok(Self {
            trigger,
            run_id: body.context.run_id.clone(),
            entity_ref,
            blueprint: body.context.blueprint.clone(),
            entity_properties,
            payload_properties: body.payload.properties.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Inbound webhook document.
///
/// Only `context.blueprint`, `context.runId` and `payload.action.trigger`
/// are required; everything else defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionBody {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub trigger: TriggerInfo,
    pub context: ActionContext,
    pub payload: ActionPayload,
}

/// Who triggered the action, and when.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerInfo {
    #[serde(default)]
    pub by: TriggeredBy,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub origin: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredBy {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub org_id: String,
}

/// Correlation data for the action run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionContext {
    /// Identifier of the entity the action targets, once it exists.
    #[serde(default)]
    pub entity: Option<String>,
    pub blueprint: String,
    pub run_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(default)]
    pub entity: Option<EntitySnapshot>,
    pub action: ActionDefinition,
    #[serde(default)]
    pub properties: PropertyBag,
}

/// The entity's state at trigger time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySnapshot {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub properties: PropertyBag,
}

/// Definition of the action being run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    pub trigger: String,
    #[serde(default)]
    pub invocation_method: serde_json::Value,
    #[serde(default)]
    pub blueprint: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(trigger: &str, entity: Option<&str>) -> ActionBody {
        serde_json::from_value(json!({
            "action": "create_bucket",
            "context": { "entity": entity, "blueprint": "bucket", "runId": "r_123" },
            "payload": {
                "entity": { "properties": { "region": "eu-west-1" } },
                "action": { "identifier": "create_bucket", "trigger": trigger },
                "properties": { "name": "x" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn trigger_kind_parses_wire_values() {
        assert_eq!("CREATE".parse::<TriggerKind>().unwrap(), TriggerKind::Create);
        assert_eq!("DAY-2".parse::<TriggerKind>().unwrap(), TriggerKind::Day2Update);
        assert_eq!("DELETE".parse::<TriggerKind>().unwrap(), TriggerKind::Delete);
        assert!(matches!(
            "create".parse::<TriggerKind>(),
            Err(BridgeError::UnknownTrigger(_))
        ));
    }

    #[test]
    fn trigger_kind_display_matches_wire() {
        assert_eq!(TriggerKind::Day2Update.to_string(), "DAY-2");
        assert!(TriggerKind::Delete.is_destructive());
        assert!(!TriggerKind::Create.is_destructive());
    }

    #[test]
    fn from_body_create_without_entity() {
        let event = ActionEvent::from_body(&body("CREATE", None)).unwrap();
        assert_eq!(event.trigger, TriggerKind::Create);
        assert_eq!(event.run_id, "r_123");
        assert_eq!(event.blueprint, "bucket");
        assert!(event.entity_ref.is_none());
        assert_eq!(event.payload_properties["name"], json!("x"));
        assert_eq!(event.entity_properties["region"], json!("eu-west-1"));
    }

    #[test]
    fn from_body_empty_entity_is_absent() {
        let event = ActionEvent::from_body(&body("DAY-2", Some("  "))).unwrap();
        assert!(event.entity_ref.is_none());
    }

    #[test]
    fn from_body_keeps_entity_reference() {
        let event = ActionEvent::from_body(&body("DELETE", Some("e_abc123"))).unwrap();
        assert_eq!(event.entity_ref.as_deref(), Some("e_abc123"));
        assert_eq!(event.trigger, TriggerKind::Delete);
    }

    #[test]
    fn from_body_does_not_rewrite_entity_reference() {
        let event = ActionEvent::from_body(&body("DAY-2", Some(" e_abc "))).unwrap();
        assert_eq!(event.entity_ref.as_deref(), Some(" e_abc "));
    }

    #[test]
    fn from_body_unknown_trigger_names_the_action() {
        let err = ActionEvent::from_body(&body("RESTART", None)).unwrap_err();
        match err {
            BridgeError::UnknownTrigger(label) => assert_eq!(label, "create_bucket"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_body_rejects_blank_run_id() {
        let mut b = body("CREATE", None);
        b.context.run_id = String::new();
        assert!(matches!(
            ActionEvent::from_body(&b),
            Err(BridgeError::InvalidEvent(_))
        ));
    }

    #[test]
    fn minimal_body_deserializes() {
        let b: ActionBody = serde_json::from_value(json!({
            "context": { "blueprint": "bucket", "runId": "r_1" },
            "payload": { "action": { "trigger": "CREATE" } }
        }))
        .unwrap();
        let event = ActionEvent::from_body(&b).unwrap();
        assert!(event.entity_properties.is_empty());
        assert!(event.payload_properties.is_empty());
    }
}
