mod config;
mod controller;
mod state;

pub use config::{GrabConfig, PhysicsConfig};
pub use controller::{IntentOutcome, PlayerController};
pub use state::{Facing, Intent, InteractionState};
