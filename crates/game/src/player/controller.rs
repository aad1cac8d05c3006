use glam::Vec2;

use crate::geometry::resolve;
use crate::map::StaticWorld;
use crate::snapshot::{Entity, EntityId, World};

use super::{Facing, GrabConfig, Intent, InteractionState, PhysicsConfig};

/// What an applied intent did. `Ignored` covers unknown ids, gated held
/// bodies and jumps without ground contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    Ignored,
    Moved,
    Jumped,
    Grabbed(EntityId),
    Released(EntityId),
}

/// Advances bodies one tick and applies intents to them.
pub struct PlayerController {
    physics: PhysicsConfig,
    grab: GrabConfig,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new(PhysicsConfig::default(), GrabConfig::default())
    }
}

impl PlayerController {
    pub fn new(physics: PhysicsConfig, grab: GrabConfig) -> Self {
        Self { physics, grab }
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    pub fn grab(&self) -> &GrabConfig {
        &self.grab
    }

    pub fn apply_intent(
        &self,
        world: &mut World,
        statics: &StaticWorld,
        id: EntityId,
        intent: Intent,
    ) -> IntentOutcome {
        let Some(entity) = world.get_mut(id) else {
            return IntentOutcome::Ignored;
        };

        if entity.is_held() && !self.grab.held_accepts_intents {
            return IntentOutcome::Ignored;
        }

        match intent {
            Intent::Left => self.launch(entity, Facing::Left),
            Intent::Right => self.launch(entity, Facing::Right),
            Intent::Up => self.jump(entity, statics),
            Intent::Grab => self.toggle_grab(world, id),
        }
    }

    fn launch(&self, entity: &mut Entity, facing: Facing) -> IntentOutcome {
        entity.facing = facing;
        entity.velocity.x = facing.sign() * self.physics.launch_speed;
        if entity.state == InteractionState::Idle {
            entity.set_state(InteractionState::Leaping);
        }
        IntentOutcome::Moved
    }

    fn jump(&self, entity: &mut Entity, statics: &StaticWorld) -> IntentOutcome {
        // Fresh overlap query: the velocity state alone cannot tell a body
        // resting on a ledge from one at the top of its arc.
        if !statics.touches(&entity.rect) {
            return IntentOutcome::Ignored;
        }

        entity.velocity.y = -self.physics.jump_speed;
        if entity.state != InteractionState::Held {
            entity.set_state(InteractionState::Jumping);
        }
        IntentOutcome::Jumped
    }

    fn toggle_grab(&self, world: &mut World, actor: EntityId) -> IntentOutcome {
        if let Some(released) = world.release(actor) {
            return IntentOutcome::Released(released);
        }

        let Some(target) = self.find_grab_target(world, actor) else {
            return IntentOutcome::Ignored;
        };

        if world.link(actor, target) {
            self.pin_held(world, actor);
            IntentOutcome::Grabbed(target)
        } else {
            IntentOutcome::Ignored
        }
    }

    /// First entity, in id order, whose center lies within reach in the
    /// actor's facing direction and inside the vertical band.
    fn find_grab_target(&self, world: &World, actor: EntityId) -> Option<EntityId> {
        let grabber = world.get(actor)?;
        let origin = grabber.rect.center();
        let sign = grabber.facing.sign();

        world
            .entities()
            .filter(|other| other.id != actor)
            .filter(|other| other.held_by.is_none() && other.grabbing != Some(actor))
            .find(|other| {
                let delta = other.rect.center() - origin;
                let ahead = delta.x * sign;
                (0.0..=self.grab.reach).contains(&ahead)
                    && delta.y.abs() <= self.grab.vertical_band
            })
            .map(|other| other.id)
    }

    /// One physics tick for a single body:
    /// friction, integration, collision against every platform, gravity when
    /// unsupported, state update, animation counter.
    ///
    /// Held bodies skip integration; their holder pins them afterwards.
    pub fn step(&self, entity: &mut Entity, statics: &StaticWorld) {
        if entity.is_held() {
            entity.advance_animation();
            return;
        }

        entity.velocity.x *= 1.0 - self.physics.friction;

        let previous = entity.rect;
        entity.rect = previous.translated(entity.velocity);

        // Platforms are resolved in order; a later platform may override an
        // earlier correction.
        let mut supported = false;
        for platform in statics.rects() {
            let Some(res) = resolve(
                entity.rect,
                previous,
                platform,
                entity.velocity,
                self.physics.landing_offset,
            ) else {
                continue;
            };

            entity.rect = res.rect;
            if res.stop_x {
                entity.velocity.x = 0.0;
            }
            if res.stop_y {
                entity.velocity.y = 0.0;
            }
            supported |= res.grounded;
        }

        entity.grounded = supported;
        if !supported {
            entity.velocity.y += self.physics.gravity;
        }

        self.update_state(entity);
        entity.advance_animation();
    }

    /// Airborne and landing rules apply to grabbers too; the `grabbing` link,
    /// not the state, records the grab. A grabber keeps showing `Grabbing`
    /// only until it leaves support.
    fn update_state(&self, entity: &mut Entity) {
        let moving = entity.velocity.x.abs() > self.physics.settle_speed;

        let next = match entity.state {
            InteractionState::Held => return,
            InteractionState::Grabbing if entity.grounded => return,
            _ if entity.grounded => match entity.state {
                InteractionState::Idle => InteractionState::Idle,
                _ if moving => InteractionState::Leaping,
                _ => InteractionState::Idle,
            },
            InteractionState::Jumping if entity.velocity.y <= 0.0 => InteractionState::Jumping,
            _ => InteractionState::Falling,
        };

        entity.set_state(next);
    }

    /// Moves the body `grabber` holds to its carry position.
    pub fn pin_held(&self, world: &mut World, grabber: EntityId) {
        let Some(holder) = world.get(grabber) else {
            return;
        };
        let Some(target) = holder.grabbing else {
            return;
        };
        let anchor = Vec2::new(holder.rect.x, holder.rect.y - self.grab.hold_offset);

        if let Some(held) = world.get_mut(target) {
            held.rect = held.rect.at(anchor);
            held.velocity = Vec2::ZERO;
        }
    }
}
