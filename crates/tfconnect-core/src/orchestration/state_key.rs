use tfconnect_types::action::ActionEvent;
use tfconnect_types::state::StateKey;

/// Resolve the backend state key for an event.
///
/// An existing entity reference is reused unchanged so every operation on
/// that entity lands on the same remote state object. Events without one
/// get a freshly minted `e_`-prefixed key, which the upstream entity then
/// adopts as its identifier.
pub fn derive_state_key(event: &ActionEvent) -> StateKey {
    match event.entity_ref.as_deref() {
        Some(entity) => StateKey::from_entity(entity),
        None => StateKey::mint(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tfconnect_types::action::{PropertyBag, TriggerKind};

    fn event(entity_ref: Option<&str>) -> ActionEvent {
        ActionEvent {
            trigger: TriggerKind::Create,
            run_id: "r_1".to_string(),
            entity_ref: entity_ref.map(str::to_string),
            blueprint: "bucket".to_string(),
            entity_properties: PropertyBag::new(),
            payload_properties: PropertyBag::new(),
        }
    }

    #[test]
    fn existing_reference_is_reused_verbatim() {
        let ev = event(Some("my-bucket"));
        for _ in 0..3 {
            assert_eq!(derive_state_key(&ev).as_str(), "my-bucket");
        }
    }

    #[test]
    fn minted_reference_round_trips_as_entity() {
        // Create mints a key, the entity takes it as its identifier, and
        // later Day-2/Delete events reuse it.
        let minted = derive_state_key(&event(None));
        let later = derive_state_key(&event(Some(minted.as_str())));
        assert_eq!(minted, later);
    }

    #[test]
    fn missing_reference_mints_distinct_keys() {
        let ev = event(None);
        let keys: HashSet<_> = (0..1_000)
            .map(|_| {
                let key = derive_state_key(&ev);
                assert!(key.as_str().starts_with(StateKey::PREFIX));
                key
            })
            .collect();
        assert_eq!(keys.len(), 1_000);
    }
}
