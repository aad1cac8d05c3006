mod protocol;

pub use protocol::{
    EntityState, Packet, PacketError, PacketHeader, PacketType, PlatformState, WorldSnapshot,
    DEFAULT_PORT, DEFAULT_TICK_RATE, MAX_PACKET_SIZE, MAX_SNAPSHOT_ENTITIES,
    MAX_SNAPSHOT_REMOVALS, PROTOCOL_MAGIC, PROTOCOL_VERSION,
};
