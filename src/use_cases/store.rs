// Entity state store: the latest kinematic state per entity id.
//
// Each snapshot builds a fresh immutable frame that is published with
// `send_replace`, so a render tick always sees one whole frame.

use crate::domain::{ProjectileKinematics, Snapshot, UnitKinematics};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct EntityFrame {
    pub tick: u64,
    pub timestamp: String,
    /// Wall-clock instant the frame was applied; reference for extrapolation.
    pub received_at_ms: u64,
    units: Vec<UnitKinematics>,
    projectiles: Vec<ProjectileKinematics>,
    unit_index: HashMap<String, usize>,
    projectile_index: HashMap<String, usize>,
}

// Later duplicates overwrite earlier ones but keep the first slot.
fn index_by_id<T>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> &str,
) -> (Vec<T>, HashMap<String, usize>) {
    let mut ordered: Vec<T> = Vec::with_capacity(items.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(items.len());
    for item in items {
        let existing = index.get(id_of(&item)).copied();
        match existing {
            Some(slot) => ordered[slot] = item,
            None => {
                index.insert(id_of(&item).to_string(), ordered.len());
                ordered.push(item);
            }
        }
    }
    (ordered, index)
}

impl EntityFrame {
    pub fn empty(received_at_ms: u64) -> Self {
        Self {
            received_at_ms,
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: Snapshot, received_at_ms: u64) -> Self {
        let (units, unit_index) = index_by_id(snapshot.units, |u| u.id.as_str());
        let (projectiles, projectile_index) =
            index_by_id(snapshot.projectiles, |p| p.id.as_str());
        Self {
            tick: snapshot.tick,
            timestamp: snapshot.timestamp,
            received_at_ms,
            units,
            projectiles,
            unit_index,
            projectile_index,
        }
    }

    pub fn units(&self) -> &[UnitKinematics] {
        &self.units
    }

    pub fn projectiles(&self) -> &[ProjectileKinematics] {
        &self.projectiles
    }

    pub fn unit(&self, id: &str) -> Option<&UnitKinematics> {
        self.unit_index.get(id).map(|&slot| &self.units[slot])
    }

    pub fn contains_unit(&self, id: &str) -> bool {
        self.unit_index.contains_key(id)
    }

    pub fn contains_projectile(&self, id: &str) -> bool {
        self.projectile_index.contains_key(id)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }
}

/// Single point of synchronization between the poll and render loops.
pub struct EntityStore {
    frame_tx: watch::Sender<Arc<EntityFrame>>,
}

impl EntityStore {
    pub fn new(now_ms: u64) -> Self {
        let (frame_tx, _frame_rx) = watch::channel(Arc::new(EntityFrame::empty(now_ms)));
        Self { frame_tx }
    }

    /// Replaces the whole store with `snapshot`, stamped with `now_ms`.
    pub fn apply_snapshot(&self, snapshot: Snapshot, now_ms: u64) -> Arc<EntityFrame> {
        let frame = Arc::new(EntityFrame::from_snapshot(snapshot, now_ms));
        self.frame_tx.send_replace(frame.clone());
        frame
    }

    /// Latest frame. Cloning the Arc keeps readers off the watch lock.
    pub fn current(&self) -> Arc<EntityFrame> {
        self.frame_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<EntityFrame>> {
        self.frame_tx.subscribe()
    }
}
