use rkyv::util::AlignedVec;
use rkyv::{rancor, Archive, Deserialize, Serialize};

use crate::geometry::Rect;

pub const MAX_PACKET_SIZE: usize = 8192;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x46524F47;
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Snapshots travel in a single datagram. An archived `EntityState` is 48
/// bytes and a removed id 4, so these caps keep a full snapshot under
/// `MAX_PACKET_SIZE`.
pub const MAX_SNAPSHOT_ENTITIES: usize = 128;
pub const MAX_SNAPSHOT_REMOVALS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
}

impl PacketHeader {
    pub fn new(sequence: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PacketType {
    // client -> server
    Join,
    Intent { direction: String },
    Leave,
    Ping { timestamp: u64 },
    AddPlatform(PlatformState),
    MovePlatform { index: u32, platform: PlatformState },

    // server -> client
    Joined { entity_id: u32, color: String },
    Denied { reason: String },
    Died { entity_id: u32 },
    Snapshot(WorldSnapshot),
    Platforms(Vec<PlatformState>),
    Pong { timestamp: u64 },
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct EntityState {
    pub entity_id: u32,
    /// Top-left corner in world space.
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub facing_left: bool,
    pub state: u8,
    pub animation_tick: u32,
    pub held_by: Option<u32>,
    pub grabbing: Option<u32>,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlatformState {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<PlatformState> for Rect {
    fn from(p: PlatformState) -> Self {
        Rect::new(p.x, p.y, p.width, p.height)
    }
}

impl From<&Rect> for PlatformState {
    fn from(rect: &Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

#[derive(Debug, Clone, Default, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct WorldSnapshot {
    pub tick: u32,
    /// Subtract from world coordinates to get screen coordinates.
    pub camera_offset: [f32; 2],
    pub entities: Vec<EntityState>,
    pub removed_entity_ids: Vec<u32>,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("packet of {0} bytes exceeds the datagram limit")]
    TooLarge(usize),
}

impl Packet {
    pub fn new(header: PacketHeader, payload: PacketType) -> Self {
        Self { header, payload }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        let data = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)?;

        if data.len() > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge(data.len()));
        }
        Ok(data)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        // Receive buffers carry no alignment guarantee.
        let mut aligned = AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);
        rkyv::from_bytes::<Self, rancor::Error>(&aligned).map_err(PacketError::Deserialize)
    }
}
