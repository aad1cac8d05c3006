mod camera;
mod config;
mod shared;

pub use camera::Camera;
pub use config::{ConfigError, PlayerColor, SessionConfig, default_palette};
pub use shared::SharedSession;

use glam::Vec2;

use crate::event::{DeathCause, EventQueue, SessionEvent};
use crate::geometry::Rect;
use crate::map::{StaticWorld, WorldError};
use crate::net::{PlatformState, WorldSnapshot};
use crate::player::{Intent, IntentOutcome, PlayerController};
use crate::snapshot::{Entity, EntityId, World};

/// Owns the entity table and the platforms of one running game. Every
/// operation here is synchronous; callers serialize access through
/// [`SharedSession`].
pub struct Session {
    config: SessionConfig,
    controller: PlayerController,
    world: World,
    statics: StaticWorld,
    camera: Camera,
    events: EventQueue,
    next_color: usize,
}

impl Session {
    pub fn new(config: SessionConfig, statics: StaticWorld) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            controller: PlayerController::new(config.physics.clone(), config.grab.clone()),
            world: World::new(),
            statics,
            camera: Camera::new(config.viewport()),
            events: EventQueue::new(config.max_pending_events),
            next_color: 0,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Adds a body at the spawn point and returns its id and color name.
    pub fn join(&mut self) -> (EntityId, String) {
        let color = self.next_color();
        let spawn = Rect::from_center(
            Vec2::from(self.config.spawn),
            Vec2::from(self.config.entity_size),
        );

        let id = self.world.spawn_player(spawn, color.clone());
        log::info!("Entity {} joined as {}", id, color.name);

        self.events.push(SessionEvent::EntityCreated {
            id,
            color: color.name.clone(),
        });
        (id, color.name)
    }

    pub fn apply(&mut self, id: EntityId, intent: Intent) -> IntentOutcome {
        let outcome = self
            .controller
            .apply_intent(&mut self.world, &self.statics, id, intent);
        log::trace!("Entity {} {:?} -> {:?}", id, intent, outcome);
        outcome
    }

    /// Parses a wire direction and applies it. Unrecognized directions are
    /// dropped and yield `None`.
    pub fn apply_direction(&mut self, id: EntityId, direction: &str) -> Option<IntentOutcome> {
        match Intent::parse(direction) {
            Some(intent) => Some(self.apply(id, intent)),
            None => {
                log::debug!("Entity {} sent unknown direction {:?}", id, direction);
                None
            }
        }
    }

    /// Removes a body. Returns false if it was already gone.
    pub fn leave(&mut self, id: EntityId) -> bool {
        if self.world.despawn(id).is_none() {
            return false;
        }
        log::info!("Entity {} left", id);
        self.events.push(SessionEvent::EntityLeft { id });
        true
    }

    /// One simulation step: physics for every body in id order, then deaths,
    /// then the camera.
    pub fn tick(&mut self) {
        for id in self.world.ids() {
            if let Some(entity) = self.world.get_mut(id) {
                self.controller.step(entity, &self.statics);
            }
            self.controller.pin_held(&mut self.world, id);
        }

        self.evaluate_deaths();
        self.camera
            .update(self.world.entities().map(|entity| entity.rect.center()));
        self.world.advance_tick();
    }

    fn evaluate_deaths(&mut self) {
        let height = self.config.viewport_height;
        let mut doomed: Vec<(EntityId, DeathCause)> = Vec::new();

        let highest_top = self
            .world
            .entities()
            .map(|entity| entity.rect.top())
            .fold(f32::INFINITY, f32::min);
        let lowest = self
            .world
            .entities()
            .fold(None::<&Entity>, |lowest, entity| match lowest {
                Some(current) if current.rect.bottom() >= entity.rect.bottom() => Some(current),
                _ => Some(entity),
            });

        if let Some(lowest) = lowest {
            if lowest.rect.bottom() - highest_top > height {
                doomed.push((lowest.id, DeathCause::LeftBehind));
            }
        }

        for entity in self.world.entities() {
            if entity.rect.top() > height && doomed.iter().all(|(id, _)| *id != entity.id) {
                doomed.push((entity.id, DeathCause::FellOff));
            }
        }

        for (id, cause) in doomed {
            self.kill(id, cause);
        }
    }

    fn kill(&mut self, id: EntityId, cause: DeathCause) {
        if self.world.despawn(id).is_some() {
            log::info!("Entity {} died: {}", id, cause.as_str());
            self.events.push(SessionEvent::EntityDied { id, cause });
        }
    }

    /// Current state without consuming the removal list.
    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot(self.camera.offset())
    }

    /// Snapshot for broadcast. Removals are reported once.
    pub fn publish_snapshot(&mut self) -> WorldSnapshot {
        let mut snapshot = self.snapshot();
        snapshot.removed_entity_ids = self.world.take_removed();
        snapshot
    }

    pub fn platforms(&self) -> Vec<PlatformState> {
        self.statics.rects().map(PlatformState::from).collect()
    }

    pub fn append_platform(&mut self, rect: Rect) -> Result<usize, WorldError> {
        let index = self.statics.append_platform(rect)?;
        log::debug!("Platform {} appended at ({}, {})", index, rect.x, rect.y);
        self.events.push(SessionEvent::PlatformsChanged);
        Ok(index)
    }

    pub fn reposition_platform(&mut self, index: usize, rect: Rect) -> Result<(), WorldError> {
        self.statics.reposition_platform(index, rect)?;
        log::debug!("Platform {} moved to ({}, {})", index, rect.x, rect.y);
        self.events.push(SessionEvent::PlatformsChanged);
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain()
    }

    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn statics(&self) -> &StaticWorld {
        &self.statics
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.world.get(id)
    }

    /// Direct access for placement tools. Changes take effect on the next tick.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.world.get_mut(id)
    }

    pub fn entity_count(&self) -> usize {
        self.world.entity_count()
    }

    pub fn tick_count(&self) -> u32 {
        self.world.tick()
    }

    fn next_color(&mut self) -> PlayerColor {
        let palette = &self.config.palette;
        let color = palette[self.next_color % palette.len()].clone();
        self.next_color = self.next_color.wrapping_add(1);
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::DefaultLevel;

    fn session() -> Session {
        let config = SessionConfig::default();
        let statics = DefaultLevel::new(config.viewport_width, config.viewport_height)
            .build()
            .unwrap();
        Session::new(config, statics).unwrap()
    }

    #[test]
    fn colors_cycle_through_palette() {
        let mut session = session();
        let palette = default_palette();

        let names: Vec<String> = (0..palette.len() + 1).map(|_| session.join().1).collect();

        assert_eq!(names[0], palette[0].name);
        assert_eq!(names[1], palette[1].name);
        assert_eq!(names[palette.len()], palette[0].name);
    }

    #[test]
    fn join_spawns_at_center() {
        let mut session = session();
        let (id, _) = session.join();

        let entity = session.entity(id).unwrap();
        assert_eq!(entity.rect.center(), Vec2::new(960.0, 540.0));
        assert_eq!(
            session.drain_events(),
            vec![SessionEvent::EntityCreated {
                id,
                color: "green".to_string()
            }]
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SessionConfig::default();
        config.viewport_height = 0.0;
        let statics = StaticWorld::from_rects([Rect::new(0.0, 980.0, 1920.0, 100.0)]).unwrap();

        assert!(matches!(
            Session::new(config, statics),
            Err(ConfigError::Viewport { .. })
        ));
    }

    #[test]
    fn unknown_direction_is_dropped() {
        let mut session = session();
        let (id, _) = session.join();

        assert_eq!(session.apply_direction(id, "sideways"), None);
        assert_eq!(
            session.apply_direction(id, "left"),
            Some(IntentOutcome::Moved)
        );
    }

    #[test]
    fn publish_reports_removals_once() {
        let mut session = session();
        let (a, _) = session.join();
        let (b, _) = session.join();
        session.leave(b);

        let first = session.publish_snapshot();
        let second = session.publish_snapshot();

        assert_eq!(first.removed_entity_ids, vec![b]);
        assert!(second.removed_entity_ids.is_empty());
        assert_eq!(second.entities[0].entity_id, a);
    }

    #[test]
    fn platform_edits_are_announced() {
        let mut session = session();
        let before = session.platforms().len();

        let index = session
            .append_platform(Rect::new(50.0, 50.0, 200.0, 20.0))
            .unwrap();
        session
            .reposition_platform(index, Rect::new(80.0, 60.0, 200.0, 20.0))
            .unwrap();

        assert_eq!(session.platforms().len(), before + 1);
        assert_eq!(session.platforms()[index].x, 80.0);
        assert_eq!(session.drain_events(), vec![SessionEvent::PlatformsChanged]);
        assert_eq!(
            session.reposition_platform(99, Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(WorldError::UnknownPlatform(99))
        );
    }
}
