//! Serialization hooks and whole-manager snapshots.
//!
//! Components registered with
//! [`Manager::register_serializable`](crate::manager::Manager::register_serializable)
//! can be converted to and from JSON one entity at a time, or all at once via
//! [`ManagerSnapshot`]. Systems are never part of a snapshot.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::manager::Manager;
use crate::EcsError;

/// Largest id counter [`Manager::restore_snapshot`] accepts. Sparse arrays
/// are sized by sequence number, so the counter bounds their growth.
pub const MAX_SNAPSHOT_SEQUENCE: u64 = u32::MAX as u64;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// A serializable copy of a manager's entities and serializable components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    /// Next sequence number the manager would hand out.
    pub next_sequence: u64,
    /// Raw ids of all live entities, sorted.
    pub entities: Vec<u64>,
    /// Component name -> raw entity id -> component JSON.
    /// `BTreeMap` keeps serialization order deterministic.
    pub components: BTreeMap<String, BTreeMap<u64, serde_json::Value>>,
}

impl ManagerSnapshot {
    /// blake3 hash of the canonical JSON encoding.
    ///
    /// Two managers with the same live entities, counter and component values
    /// hash identically regardless of their internal dense order.
    pub fn state_hash(&self) -> [u8; 32] {
        // Serializing plain maps, vectors and JSON values cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        *blake3::hash(&bytes).as_bytes()
    }

    /// [`state_hash`](Self::state_hash) as lowercase hex.
    pub fn state_hash_hex(&self) -> String {
        self.state_hash()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Manager hooks
// ---------------------------------------------------------------------------

impl Manager {
    fn store_index_by_name(&self, name: &str) -> Result<usize, EcsError> {
        self.name_index
            .get(name)
            .copied()
            .ok_or_else(|| EcsError::UnknownComponent {
                name: name.to_owned(),
            })
    }

    /// Serialize `entity`'s component registered as `name`.
    pub fn serialize_component(
        &self,
        name: &str,
        entity: Entity,
    ) -> Result<serde_json::Value, EcsError> {
        let store = &self.stores[self.store_index_by_name(name)?];
        if !store.is_serializable() {
            return Err(EcsError::NotSerializable {
                component: name.to_owned(),
            });
        }
        store
            .serialize_entity(entity)
            .unwrap_or_else(|| {
                Err(EcsError::MissingComponent {
                    entity,
                    component: name.to_owned(),
                })
            })
    }

    /// Set `entity`'s component registered as `name` from JSON, replacing any
    /// existing value.
    pub fn deserialize_component(
        &mut self,
        name: &str,
        entity: Entity,
        value: serde_json::Value,
    ) -> Result<(), EcsError> {
        self.check(entity)?;
        let index = self.store_index_by_name(name)?;
        self.stores[index].deserialize_entity(entity, value)
    }

    /// Capture every live entity and every serializable component.
    ///
    /// Stores registered without serde support are skipped with a warning.
    pub fn capture_snapshot(&self) -> Result<ManagerSnapshot, EcsError> {
        let mut entities: Vec<u64> = self.entities.iter().map(Entity::to_raw).collect();
        entities.sort_unstable();

        let mut components = BTreeMap::new();
        for store in &self.stores {
            match store.serialize_all() {
                Some(pairs) => {
                    let by_entity: BTreeMap<u64, serde_json::Value> = pairs?
                        .into_iter()
                        .map(|(entity, json)| (entity.to_raw(), json))
                        .collect();
                    components.insert(store.name().to_owned(), by_entity);
                }
                None if store.len() > 0 => {
                    tracing::warn!(
                        component = store.name(),
                        count = store.len(),
                        "component type has no serializer registered -- skipping in snapshot"
                    );
                }
                None => {}
            }
        }

        Ok(ManagerSnapshot {
            next_sequence: self.next_sequence,
            entities,
            components,
        })
    }

    /// Check the structure of `snapshot` against this manager without
    /// touching any live data.
    ///
    /// Entity sequences must stay below the snapshot's counter, which itself
    /// is capped at [`MAX_SNAPSHOT_SEQUENCE`]. Components may only name
    /// registered types and listed entities.
    fn check_snapshot(&self, snapshot: &ManagerSnapshot) -> Result<(), EcsError> {
        if snapshot.next_sequence > MAX_SNAPSHOT_SEQUENCE {
            return Err(EcsError::InvalidSnapshot {
                details: format!(
                    "id counter {} exceeds the limit of {MAX_SNAPSHOT_SEQUENCE}",
                    snapshot.next_sequence
                ),
            });
        }

        let mut live = HashSet::with_capacity(snapshot.entities.len());
        for &raw in &snapshot.entities {
            let entity = Entity::from_raw(raw);
            if !Self::validate(entity) {
                return Err(EcsError::InvalidEntity { raw });
            }
            if entity.sequence() >= snapshot.next_sequence {
                return Err(EcsError::InvalidSnapshot {
                    details: format!(
                        "entity {entity} is not below the id counter {}",
                        snapshot.next_sequence
                    ),
                });
            }
            if !live.insert(raw) {
                return Err(EcsError::InvalidSnapshot {
                    details: format!("entity {entity} is listed twice"),
                });
            }
        }

        for (name, by_entity) in &snapshot.components {
            self.store_index_by_name(name)?;
            for &raw in by_entity.keys() {
                let entity = Entity::from_raw(raw);
                if !Self::validate(entity) {
                    return Err(EcsError::InvalidEntity { raw });
                }
                if !live.contains(&raw) {
                    return Err(EcsError::DeadEntity { entity });
                }
            }
        }
        Ok(())
    }

    /// Replace all live data with `snapshot`.
    ///
    /// Registrations and systems are kept. Every entity and component in the
    /// manager is dropped first, including components of types the snapshot
    /// does not mention.
    ///
    /// A structurally invalid snapshot is rejected before anything changes.
    /// If a component value then fails to deserialize, the error is returned
    /// and the manager holds whatever was restored up to that point.
    pub fn restore_snapshot(&mut self, snapshot: &ManagerSnapshot) -> Result<(), EcsError> {
        self.check_snapshot(snapshot)?;

        self.entities.clear();
        for store in &mut self.stores {
            store.clear();
        }
        self.next_sequence = snapshot.next_sequence;

        for &raw in &snapshot.entities {
            self.entities.insert(Entity::from_raw(raw));
        }

        for (name, by_entity) in &snapshot.components {
            let index = self.store_index_by_name(name)?;
            for (&raw, value) in by_entity {
                self.stores[index].deserialize_entity(Entity::from_raw(raw), value.clone())?;
            }
        }

        tracing::debug!(
            entities = self.entities.len(),
            component_types = snapshot.components.len(),
            "restored manager snapshot"
        );
        Ok(())
    }

    /// Whether `entity` holds a component registered as `name`.
    pub fn has_component_named(&self, name: &str, entity: Entity) -> bool {
        self.name_index
            .get(name)
            .is_some_and(|&i| self.stores[i].has_entity(entity))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Position {
        x: f64,
        y: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Name(String);

    #[derive(Debug)]
    struct Opaque;

    fn populated() -> (Manager, Vec<Entity>) {
        let mut m = Manager::new();
        m.register_serializable::<Position>("position");
        m.register_serializable::<Name>("name");
        let mut es = Vec::new();
        for i in 0..4 {
            let e = m.create();
            m.add(e, Position { x: i as f64, y: 0.0 }).unwrap();
            if i % 2 == 0 {
                m.add(e, Name(format!("n{i}"))).unwrap();
            }
            es.push(e);
        }
        m.destroy(es[1]);
        (m, es)
    }

    #[test]
    fn serialize_single_component() {
        let (m, es) = populated();
        let json = m.serialize_component("position", es[2]).unwrap();
        assert_eq!(json, serde_json::json!({"x": 2.0, "y": 0.0}));
    }

    #[test]
    fn serialize_missing_component_errors() {
        let (m, es) = populated();
        let err = m.serialize_component("name", es[3]).unwrap_err();
        assert!(matches!(err, EcsError::MissingComponent { .. }));
        let err = m.serialize_component("nope", es[0]).unwrap_err();
        assert!(matches!(err, EcsError::UnknownComponent { .. }));
    }

    #[test]
    fn deserialize_replaces_value() {
        let (mut m, es) = populated();
        m.deserialize_component("position", es[0], serde_json::json!({"x": 7.0, "y": 8.0}))
            .unwrap();
        assert_eq!(m.get::<Position>(es[0]), &Position { x: 7.0, y: 8.0 });
    }

    #[test]
    fn deserialize_bad_json_reports_component() {
        let (mut m, es) = populated();
        let err = m
            .deserialize_component("position", es[0], serde_json::json!("oops"))
            .unwrap_err();
        match err {
            EcsError::Serialization { component, .. } => assert_eq!(component, "position"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_serializable_store_is_reported() {
        let mut m = Manager::new();
        m.register::<Opaque>("opaque");
        let e = m.create();
        m.add(e, Opaque).unwrap();
        assert!(matches!(
            m.serialize_component("opaque", e),
            Err(EcsError::NotSerializable { .. })
        ));
        let snap = m.capture_snapshot().unwrap();
        assert!(snap.components.is_empty());
        assert_eq!(snap.entities.len(), 1);
    }

    #[test]
    fn snapshot_restore_roundtrip_preserves_hash() {
        let (mut m, es) = populated();
        let snap = m.capture_snapshot().unwrap();
        let hash = snap.state_hash();

        // Mutate, then restore.
        m.get_mut::<Position>(es[0]).x = 100.0;
        m.destroy(es[2]);
        m.create();
        assert_ne!(m.capture_snapshot().unwrap().state_hash(), hash);

        m.restore_snapshot(&snap).unwrap();
        assert_eq!(m.capture_snapshot().unwrap().state_hash(), hash);
        assert!(m.has(es[2]));
        assert!(!m.has(es[1]));
        assert_eq!(m.get::<Name>(es[2]), &Name("n2".into()));
        // Counter restored: next id continues after the snapshot's counter.
        assert_eq!(m.create().sequence(), snap.next_sequence);
    }

    #[test]
    fn snapshot_survives_json() {
        let (m, _) = populated();
        let snap = m.capture_snapshot().unwrap();
        let text = serde_json::to_string(&snap).unwrap();
        let back: ManagerSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.state_hash_hex().len(), 64);
    }

    #[test]
    fn restore_rejects_untagged_entity() {
        let mut m = Manager::new();
        let snap = ManagerSnapshot {
            next_sequence: 1,
            entities: vec![0],
            components: BTreeMap::new(),
        };
        assert!(matches!(
            m.restore_snapshot(&snap),
            Err(EcsError::InvalidEntity { raw: 0 })
        ));
    }

    fn bare(next_sequence: u64, entities: Vec<u64>) -> ManagerSnapshot {
        ManagerSnapshot {
            next_sequence,
            entities,
            components: BTreeMap::new(),
        }
    }

    #[test]
    fn restore_rejects_entity_at_or_above_counter() {
        let (mut m, _) = populated();
        let before = m.capture_snapshot().unwrap();
        let snap = bare(2, vec![Entity::from_sequence(2).to_raw()]);

        assert!(matches!(
            m.restore_snapshot(&snap),
            Err(EcsError::InvalidSnapshot { .. })
        ));
        // Nothing was touched.
        assert_eq!(m.capture_snapshot().unwrap(), before);
    }

    #[test]
    fn restored_counter_never_reissues_live_ids() {
        let mut m = Manager::new();
        let live = Entity::from_sequence(2);
        assert!(m.restore_snapshot(&bare(0, vec![live.to_raw()])).is_err());

        m.restore_snapshot(&bare(3, vec![live.to_raw()])).unwrap();
        for _ in 0..3 {
            let created = m.create();
            assert_ne!(created, live);
            assert!(created.sequence() >= 3);
        }
        assert_eq!(m.entity_count(), 4);
    }

    #[test]
    fn restore_rejects_huge_sequence_without_allocating() {
        let mut m = Manager::new();
        let huge = Entity::from_sequence((1 << 48) - 1).to_raw();
        assert!(matches!(
            m.restore_snapshot(&bare(0, vec![huge])),
            Err(EcsError::InvalidSnapshot { .. })
        ));
        assert!(matches!(
            m.restore_snapshot(&bare(1 << 40, vec![huge])),
            Err(EcsError::InvalidSnapshot { .. })
        ));
        assert_eq!(m.entity_count(), 0);
    }

    #[test]
    fn restore_counter_limit_is_inclusive() {
        let mut m = Manager::new();
        m.restore_snapshot(&bare(MAX_SNAPSHOT_SEQUENCE, Vec::new()))
            .unwrap();
        assert_eq!(
            m.capture_snapshot().unwrap().next_sequence,
            MAX_SNAPSHOT_SEQUENCE
        );
        assert!(matches!(
            m.restore_snapshot(&bare(MAX_SNAPSHOT_SEQUENCE + 1, Vec::new())),
            Err(EcsError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn restore_rejects_duplicate_entities() {
        let mut m = Manager::new();
        let raw = Entity::from_sequence(1).to_raw();
        let err = m.restore_snapshot(&bare(4, vec![raw, raw])).unwrap_err();
        assert!(err.to_string().contains("twice"), "{err}");
    }

    #[test]
    fn restore_rejects_component_of_unlisted_entity() {
        let (mut m, es) = populated();
        let mut snap = m.capture_snapshot().unwrap();
        // es[1] was destroyed before capture.
        snap.components
            .get_mut("position")
            .unwrap()
            .insert(es[1].to_raw(), serde_json::json!({"x": 0.0, "y": 0.0}));

        let before = m.capture_snapshot().unwrap();
        assert!(matches!(
            m.restore_snapshot(&snap),
            Err(EcsError::DeadEntity { entity }) if entity == es[1]
        ));
        assert_eq!(m.capture_snapshot().unwrap(), before);
    }

    #[test]
    fn restore_rejects_unregistered_component_name() {
        let (mut m, es) = populated();
        let mut snap = m.capture_snapshot().unwrap();
        snap.components.insert(
            "health".to_owned(),
            BTreeMap::from([(es[0].to_raw(), serde_json::json!(10))]),
        );
        assert!(matches!(
            m.restore_snapshot(&snap),
            Err(EcsError::UnknownComponent { .. })
        ));
        assert!(m.has(es[2]));
    }

    #[test]
    fn has_component_named_checks_store() {
        let (m, es) = populated();
        assert!(m.has_component_named("name", es[0]));
        assert!(!m.has_component_named("name", es[3]));
        assert!(!m.has_component_named("missing", es[0]));
    }
}
