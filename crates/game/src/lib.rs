pub mod event;
pub mod geometry;
pub mod map;
pub mod net;
pub mod player;
pub mod session;
pub mod simulation;
pub mod snapshot;

pub use event::{DeathCause, EventQueue, SessionEvent};
pub use geometry::{CONTACT_EPSILON, Rect, Resolution, collides, resolve};
pub use map::{DefaultLevel, Platform, PlatformDef, PlatformKind, StaticWorld, WorldError};
pub use net::{
    DEFAULT_PORT, DEFAULT_TICK_RATE, EntityState, MAX_PACKET_SIZE, MAX_SNAPSHOT_ENTITIES,
    MAX_SNAPSHOT_REMOVALS, Packet, PacketError, PacketHeader, PacketType, PlatformState,
    WorldSnapshot,
};
pub use player::{
    Facing, GrabConfig, Intent, IntentOutcome, InteractionState, PhysicsConfig, PlayerController,
};
pub use session::{
    Camera, ConfigError, PlayerColor, Session, SessionConfig, SharedSession, default_palette,
};
pub use simulation::{FixedTimestep, GameLoop};
pub use snapshot::{Entity, EntityId, World};
