mod default_level;
mod objects;

pub use default_level::DefaultLevel;
pub use objects::{Platform, PlatformDef, PlatformKind, StaticWorld, WorldError};
