use serde::{Deserialize, Serialize};

/// Per-session movement tuning. Velocities are in world units per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    /// Fraction of horizontal velocity removed every tick, in `[0, 1)`.
    pub friction: f32,
    pub jump_speed: f32,
    pub launch_speed: f32,
    /// How far below a platform's top edge a landed body rests.
    pub landing_offset: f32,
    /// Grounded bodies slower than this settle from leaping to idle.
    pub settle_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 1.0,
            friction: 0.1,
            jump_speed: 30.0,
            launch_speed: 20.0,
            landing_offset: 10.0,
            settle_speed: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Horizontal reach in the facing direction, center to center.
    pub reach: f32,
    /// Allowed vertical distance between centers, either way.
    pub vertical_band: f32,
    /// A held body is pinned this far above its holder's top-left corner.
    pub hold_offset: f32,
    /// Whether held bodies still react to their own intents.
    pub held_accepts_intents: bool,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            reach: 180.0,
            vertical_band: 10.0,
            hold_offset: 100.0,
            held_accepts_intents: true,
        }
    }
}
