use std::collections::BTreeMap;

use glam::Vec2;

use crate::geometry::Rect;
use crate::net::{MAX_SNAPSHOT_REMOVALS, WorldSnapshot};
use crate::player::InteractionState;
use crate::session::PlayerColor;

use super::entity::{Entity, EntityId};

/// Live entity table. Ids are handed out in increasing order and iteration
/// follows id order, so "first match" scans are deterministic join order.
#[derive(Debug)]
pub struct World {
    tick: u32,
    entities: BTreeMap<EntityId, Entity>,
    next_entity_id: EntityId,
    removed_entities: Vec<EntityId>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            tick: 0,
            entities: BTreeMap::new(),
            next_entity_id: 1,
            removed_entities: Vec::new(),
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn spawn_player(&mut self, spawn: Rect, color: PlayerColor) -> EntityId {
        let id = self.allocate_id();
        self.entities.insert(id, Entity::new(id, spawn, color));
        id
    }

    /// Removes an entity and clears every grab link that pointed at it.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;

        if let Some(target) = entity.grabbing {
            if let Some(held) = self.entities.get_mut(&target) {
                held.held_by = None;
                let state = held.free_state();
                held.set_state(state);
            }
        }

        if let Some(holder) = entity.held_by {
            if let Some(grabber) = self.entities.get_mut(&holder) {
                grabber.grabbing = None;
                let state = grabber.free_state();
                grabber.set_state(state);
            }
        }

        if self.removed_entities.len() == MAX_SNAPSHOT_REMOVALS {
            let dropped = self.removed_entities.remove(0);
            log::debug!("Removal backlog full, forgetting entity {}", dropped);
        }
        self.removed_entities.push(id);
        Some(entity)
    }

    /// Links `grabber` to `target`. Both must exist, be distinct, and the
    /// target must not already be held.
    pub fn link(&mut self, grabber: EntityId, target: EntityId) -> bool {
        if grabber == target {
            return false;
        }
        match self.entities.get(&target) {
            Some(t) if t.held_by.is_none() && t.grabbing != Some(grabber) => {}
            _ => return false,
        }
        let Some(actor) = self.entities.get_mut(&grabber) else {
            return false;
        };
        if actor.grabbing.is_some() {
            return false;
        }

        actor.grabbing = Some(target);
        actor.set_state(InteractionState::Grabbing);

        if let Some(held) = self.entities.get_mut(&target) {
            held.held_by = Some(grabber);
            held.velocity = Vec2::ZERO;
            held.set_state(InteractionState::Held);
        }
        true
    }

    /// Ends `grabber`'s current grab, if any. Returns the released id.
    pub fn release(&mut self, grabber: EntityId) -> Option<EntityId> {
        let actor = self.entities.get_mut(&grabber)?;
        let target = actor.grabbing.take()?;
        let state = actor.free_state();
        actor.set_state(state);

        if let Some(held) = self.entities.get_mut(&target) {
            held.held_by = None;
            held.set_state(InteractionState::Falling);
        }
        Some(target)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids despawned since the last call to [`World::take_removed`], oldest
    /// first. Holds at most `MAX_SNAPSHOT_REMOVALS` ids; callers that never
    /// drain it lose the oldest. Live snapshots still omit those entities.
    pub fn removed_entities(&self) -> &[EntityId] {
        &self.removed_entities
    }

    pub fn take_removed(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.removed_entities)
    }

    pub fn snapshot(&self, camera_offset: Vec2) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            camera_offset: camera_offset.into(),
            entities: self.entities.values().map(Entity::to_network_state).collect(),
            removed_entity_ids: self.removed_entities.clone(),
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(world: &mut World, x: f32) -> EntityId {
        world.spawn_player(Rect::new(x, 0.0, 100.0, 100.0), PlayerColor::default())
    }

    #[test]
    fn ids_are_monotonic_and_ordered() {
        let mut world = World::new();
        let a = spawn(&mut world, 0.0);
        let b = spawn(&mut world, 100.0);
        world.despawn(a);
        let c = spawn(&mut world, 200.0);

        assert!(a < b && b < c);
        assert_eq!(world.ids(), vec![b, c]);
    }

    #[test]
    fn removal_backlog_is_bounded() {
        let mut world = World::new();
        let ids: Vec<_> = (0..MAX_SNAPSHOT_REMOVALS + 3)
            .map(|i| spawn(&mut world, i as f32))
            .collect();
        for &id in &ids {
            world.despawn(id);
        }

        let removed = world.removed_entities();
        assert_eq!(removed.len(), MAX_SNAPSHOT_REMOVALS);
        assert_eq!(removed.first(), Some(&ids[3]));
        assert_eq!(removed.last(), ids.last());

        assert_eq!(world.take_removed().len(), MAX_SNAPSHOT_REMOVALS);
        assert!(world.removed_entities().is_empty());
    }

    #[test]
    fn link_is_exclusive() {
        let mut world = World::new();
        let a = spawn(&mut world, 0.0);
        let b = spawn(&mut world, 100.0);
        let c = spawn(&mut world, 200.0);

        assert!(world.link(a, b));
        assert!(!world.link(c, b), "b already has a holder");
        assert!(!world.link(b, a), "b cannot grab its own holder");
        assert!(!world.link(a, c), "a already holds b");
        assert!(!world.link(c, c));

        assert_eq!(world.get(b).unwrap().state, InteractionState::Held);
        assert_eq!(world.get(a).unwrap().state, InteractionState::Grabbing);
    }

    #[test]
    fn release_clears_both_sides() {
        let mut world = World::new();
        let a = spawn(&mut world, 0.0);
        let b = spawn(&mut world, 100.0);
        world.link(a, b);

        assert_eq!(world.release(a), Some(b));
        assert!(world.get(a).unwrap().grabbing.is_none());
        assert!(world.get(b).unwrap().held_by.is_none());
        assert_eq!(world.get(b).unwrap().state, InteractionState::Falling);
        assert_eq!(world.release(a), None);
    }

    #[test]
    fn despawn_clears_links_both_ways() {
        let mut world = World::new();
        let a = spawn(&mut world, 0.0);
        let b = spawn(&mut world, 100.0);
        let c = spawn(&mut world, 200.0);
        world.link(a, b);
        world.link(b, c);

        world.despawn(b);

        assert!(world.get(a).unwrap().grabbing.is_none());
        assert!(world.get(c).unwrap().held_by.is_none());
        assert_eq!(world.removed_entities(), &[b]);
    }

    #[test]
    fn snapshot_lists_live_entities() {
        let mut world = World::new();
        let a = spawn(&mut world, 0.0);
        let b = spawn(&mut world, 100.0);
        world.despawn(b);

        let snapshot = world.snapshot(Vec2::new(-960.0, -540.0));

        assert_eq!(snapshot.entities.len(), 1);
        assert_eq!(snapshot.entities[0].entity_id, a);
        assert_eq!(snapshot.removed_entity_ids, vec![b]);
        assert_eq!(snapshot.camera_offset, [-960.0, -540.0]);
    }
}
