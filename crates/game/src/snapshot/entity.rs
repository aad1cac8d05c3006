use glam::Vec2;

use crate::geometry::Rect;
use crate::net::EntityState;
use crate::player::{Facing, InteractionState};
use crate::session::PlayerColor;

pub type EntityId = u32;

/// A simulated player body. Plain data: the physics step and the session
/// mutate it, nothing here knows about rendering or the network.
///
/// `grabbing` and `held_by` are non-owning links: ids looked up in the live
/// entity table, cleared by the table when either side is removed.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub rect: Rect,
    pub velocity: Vec2,
    pub state: InteractionState,
    pub facing: Facing,
    /// Ticks spent in the current state.
    pub animation_tick: u32,
    pub grabbing: Option<EntityId>,
    pub held_by: Option<EntityId>,
    /// Result of the last collision pass.
    pub grounded: bool,
    pub color: PlayerColor,
}

impl Entity {
    pub fn new(id: EntityId, spawn: Rect, color: PlayerColor) -> Self {
        Self {
            id,
            rect: spawn,
            velocity: Vec2::ZERO,
            state: InteractionState::Idle,
            facing: Facing::default(),
            animation_tick: 0,
            grabbing: None,
            held_by: None,
            grounded: false,
            color,
        }
    }

    /// Enters `state`, restarting the animation counter on an actual change.
    pub fn set_state(&mut self, state: InteractionState) {
        if self.state != state {
            self.state = state;
            self.animation_tick = 0;
        }
    }

    pub fn advance_animation(&mut self) {
        self.animation_tick = self.animation_tick.saturating_add(1);
    }

    /// The state a body drops back to once a grab ends.
    pub fn free_state(&self) -> InteractionState {
        if self.grounded {
            InteractionState::Idle
        } else {
            InteractionState::Falling
        }
    }

    pub fn is_held(&self) -> bool {
        self.held_by.is_some()
    }

    pub fn to_network_state(&self) -> EntityState {
        EntityState {
            entity_id: self.id,
            position: self.rect.position().into(),
            size: self.rect.size().into(),
            facing_left: self.facing == Facing::Left,
            state: self.state as u8,
            animation_tick: self.animation_tick,
            held_by: self.held_by,
            grabbing: self.grabbing,
            color: self.color.rgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> Entity {
        Entity::new(7, Rect::new(910.0, 490.0, 100.0, 100.0), PlayerColor::default())
    }

    #[test]
    fn state_change_resets_animation() {
        let mut entity = entity();
        entity.advance_animation();
        entity.advance_animation();

        entity.set_state(InteractionState::Idle);
        assert_eq!(entity.animation_tick, 2);

        entity.set_state(InteractionState::Leaping);
        assert_eq!(entity.animation_tick, 0);
    }

    #[test]
    fn network_state_carries_pose() {
        let mut entity = entity();
        entity.facing = Facing::Left;
        entity.set_state(InteractionState::Falling);
        entity.held_by = Some(3);

        let state = entity.to_network_state();

        assert_eq!(state.entity_id, 7);
        assert_eq!(state.position, [910.0, 490.0]);
        assert!(state.facing_left);
        assert_eq!(InteractionState::from(state.state), InteractionState::Falling);
        assert_eq!(state.held_by, Some(3));
    }
}
