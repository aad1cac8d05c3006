mod collision;
mod rect;

pub use collision::{collides, resolve, Resolution, CONTACT_EPSILON};
pub use rect::Rect;
