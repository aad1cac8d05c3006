mod entity;
mod world;

pub use entity::{Entity, EntityId};
pub use world::World;
