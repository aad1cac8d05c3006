use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use frogpile::{
    DeathCause, GameLoop, Intent, IntentOutcome, InteractionState, PlatformDef, Rect, Session,
    SessionConfig, SessionEvent, SharedSession, StaticWorld,
};
use glam::Vec2;

const GROUND_TOP: f32 = 980.0;

fn ground_session() -> Session {
    let statics = StaticWorld::from_rects([Rect::new(0.0, GROUND_TOP, 1920.0, 100.0)]).unwrap();
    Session::new(SessionConfig::default(), statics).unwrap()
}

/// Ground placed far away so bodies near the spawn column fall freely.
fn open_air_session() -> Session {
    let statics = StaticWorld::from_rects([Rect::new(10_000.0, GROUND_TOP, 100.0, 100.0)]).unwrap();
    Session::new(SessionConfig::default(), statics).unwrap()
}

fn place(session: &mut Session, id: u32, x: f32, y: f32) {
    let entity = session.entity_mut(id).unwrap();
    entity.rect = entity.rect.at(Vec2::new(x, y));
    entity.velocity = Vec2::ZERO;
}

fn deaths(events: &[SessionEvent]) -> Vec<(u32, DeathCause)> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::EntityDied { id, cause } => Some((*id, *cause)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_spread_rule_kills_lowest_once() {
    let mut session = open_air_session();
    let (high, _) = session.join();
    let (low, _) = session.join();
    place(&mut session, high, 0.0, 0.0);
    place(&mut session, low, 0.0, 1081.0);
    session.drain_events();

    session.tick();

    let events = session.drain_events();
    assert_eq!(deaths(&events), vec![(low, DeathCause::LeftBehind)]);
    assert!(session.entity(low).is_none());
    assert!(session.entity(high).is_some());

    session.tick();
    assert!(deaths(&session.drain_events()).is_empty());
}

#[test]
fn test_fall_off_happens_on_the_crossing_tick() {
    let mut session = open_air_session();
    let (id, _) = session.join();
    place(&mut session, id, 900.0, 1075.0);

    for _ in 0..3 {
        session.tick();
        let entity = session.entity(id).expect("still above the edge");
        assert!(entity.rect.top() <= 1080.0);
    }

    session.tick();
    assert!(session.entity(id).is_none());
    assert_eq!(
        deaths(&session.drain_events()),
        vec![(id, DeathCause::FellOff)]
    );
}

#[test]
fn test_camera_tracks_mean_center() {
    let mut session = open_air_session();
    let (a, _) = session.join();
    let (b, _) = session.join();

    // Place so that the centers land on (0,0) and (200,100) after one tick of
    // free fall, which moves neither body.
    place(&mut session, a, -50.0, -50.0);
    place(&mut session, b, 150.0, 50.0);
    session.tick();

    let viewport = session.config().viewport();
    assert_eq!(session.camera().focus(), Vec2::new(100.0, 50.0));
    assert_eq!(
        session.camera().offset(),
        Vec2::new(100.0, 50.0) - viewport / 2.0
    );
}

#[test]
fn test_camera_starts_at_origin_and_holds_when_empty() {
    let mut session = ground_session();
    let viewport = session.config().viewport();
    assert_eq!(session.camera().offset(), -viewport / 2.0);

    let (id, _) = session.join();
    session.tick();
    let focus = session.camera().focus();
    session.leave(id);
    session.tick();

    assert_eq!(session.camera().focus(), focus);
}

#[test]
fn test_join_leave_round_trip() {
    let mut session = ground_session();
    let (holder, _) = session.join();
    let (id, _) = session.join();
    place(&mut session, holder, 500.0, 400.0);
    place(&mut session, id, 600.0, 400.0);

    assert_eq!(
        session.apply(holder, Intent::Grab),
        IntentOutcome::Grabbed(id)
    );
    assert!(session.leave(id));

    assert!(session.entity(id).is_none());
    let holder = session.entity(holder).unwrap();
    assert!(holder.grabbing.is_none());
    assert_ne!(holder.state, InteractionState::Grabbing);

    let mut session = ground_session();
    let (id, _) = session.join();
    assert!(session.leave(id));
    assert_eq!(session.entity_count(), 0);
    assert!(!session.leave(id));
}

#[test]
fn test_intents_for_departed_entities_are_ignored() {
    let mut session = ground_session();
    let (id, _) = session.join();
    session.leave(id);

    for intent in [Intent::Left, Intent::Right, Intent::Up, Intent::Grab] {
        assert_eq!(session.apply(id, intent), IntentOutcome::Ignored);
    }
}

#[test]
fn test_third_party_cannot_steal_held_entity() {
    let mut session = ground_session();
    let (a, _) = session.join();
    let (b, _) = session.join();
    let (c, _) = session.join();
    place(&mut session, a, 500.0, 400.0);
    place(&mut session, b, 600.0, 400.0);
    assert_eq!(session.apply(a, Intent::Grab), IntentOutcome::Grabbed(b));

    // b now hangs at (500, 300). Put c level with it, facing it.
    let carried = session.entity(b).unwrap().rect.position();
    assert_eq!(carried, Vec2::new(500.0, 300.0));
    place(&mut session, c, 650.0, 300.0);
    session.apply(c, Intent::Left);
    assert_eq!(session.apply(c, Intent::Grab), IntentOutcome::Ignored);
    assert_eq!(session.entity(b).unwrap().held_by, Some(a));
}

#[test]
fn test_held_entity_follows_holder() {
    let mut session = ground_session();
    let (a, _) = session.join();
    let (b, _) = session.join();
    place(&mut session, a, 500.0, 400.0);
    place(&mut session, b, 600.0, 400.0);
    session.apply(a, Intent::Grab);

    for _ in 0..90 {
        session.tick();
        let holder = session.entity(a).unwrap().rect;
        let held = session.entity(b).unwrap();
        assert_eq!(held.rect.position(), Vec2::new(holder.x, holder.y - 100.0));
        assert_eq!(held.state, InteractionState::Held);
    }
}

#[test]
fn test_snapshot_reports_live_entities() {
    let mut session = ground_session();
    let (a, color) = session.join();
    session.tick();

    let snapshot = session.publish_snapshot();
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.entities.len(), 1);
    let state = &snapshot.entities[0];
    assert_eq!(state.entity_id, a);
    assert!(!state.facing_left);
    assert_eq!(color, "green");
    assert_eq!(
        snapshot.camera_offset,
        <[f32; 2]>::from(session.camera().offset())
    );
}

#[test]
fn test_map_file_shape_builds_static_world() {
    let json = r#"[
        {"width": 1920, "height": 100, "x": 0, "y": 980},
        {"width": 200, "height": 20, "x": 300, "y": 500}
    ]"#;

    let defs: Vec<PlatformDef> = serde_json::from_str(json).unwrap();
    let statics = StaticWorld::from_defs(&defs).unwrap();

    assert_eq!(statics.len(), 2);
    assert_eq!(statics.ground().rect, Rect::new(0.0, 980.0, 1920.0, 100.0));
}

#[test]
fn test_partial_config_falls_back_to_defaults() {
    let config: SessionConfig =
        serde_json::from_str(r#"{"viewport_width": 1280, "physics": {"gravity": 2}}"#).unwrap();

    assert_eq!(config.viewport_width, 1280.0);
    assert_eq!(config.viewport_height, 1080.0);
    assert_eq!(config.physics.gravity, 2.0);
    assert_eq!(config.physics.jump_speed, 30.0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_shared_session_serializes_intents_and_ticks() {
    let shared = SharedSession::new(ground_session());
    let ids: Vec<u32> = (0..4).map(|_| shared.with(|s| s.join().0)).collect();

    let handlers: Vec<_> = ids
        .iter()
        .map(|&id| {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let intent = if i % 2 == 0 { Intent::Left } else { Intent::Right };
                    shared.with(|s| s.apply(id, intent));
                }
            })
        })
        .collect();

    for _ in 0..200 {
        shared.with(Session::tick);
    }
    for handler in handlers {
        handler.join().unwrap();
    }

    let session = shared.lock();
    assert_eq!(session.tick_count(), 200);
    assert_eq!(session.entity_count(), 4);
}

#[test]
fn test_game_loop_stops_at_tick_boundary() {
    let shared = SharedSession::new(ground_session());
    shared.with(|s| s.join());

    let running = Arc::new(AtomicBool::new(true));
    let ticks = Arc::new(AtomicU64::new(0));

    let loop_thread = {
        let shared = shared.clone();
        let running = running.clone();
        let ticks = ticks.clone();
        thread::spawn(move || {
            let mut game_loop = GameLoop::new(240, running);
            game_loop.run(|_| {
                shared.with(Session::tick);
                ticks.fetch_add(1, Ordering::SeqCst);
            });
            game_loop.ticks()
        })
    };

    thread::sleep(Duration::from_millis(100));
    running.store(false, Ordering::SeqCst);
    let ran = loop_thread.join().unwrap();

    assert!(ran > 0);
    assert_eq!(ran, ticks.load(Ordering::SeqCst));
    assert_eq!(u64::from(shared.lock().tick_count()), ran);
}
