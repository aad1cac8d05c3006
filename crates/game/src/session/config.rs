use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::player::{GrabConfig, PhysicsConfig};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("friction must lie in [0, 1), got {0}")]
    Friction(f32),
    #[error("viewport must be positive, got {width}x{height}")]
    Viewport { width: f32, height: f32 },
    #[error("entity size must be positive, got {width}x{height}")]
    EntitySize { width: f32, height: f32 },
    #[error("colour palette is empty")]
    EmptyPalette,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerColor {
    pub name: String,
    pub rgb: [u8; 3],
}

impl PlayerColor {
    pub fn new(name: &str, rgb: [u8; 3]) -> Self {
        Self {
            name: name.to_string(),
            rgb,
        }
    }
}

pub fn default_palette() -> Vec<PlayerColor> {
    vec![
        PlayerColor::new("green", [76, 175, 80]),
        PlayerColor::new("red", [229, 57, 53]),
        PlayerColor::new("blue", [30, 136, 229]),
        PlayerColor::new("purple", [102, 51, 153]),
        PlayerColor::new("orange", [251, 140, 0]),
        PlayerColor::new("yellow", [253, 216, 53]),
        PlayerColor::new("pink", [236, 64, 122]),
        PlayerColor::new("cyan", [0, 172, 193]),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub physics: PhysicsConfig,
    pub grab: GrabConfig,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Center of a freshly joined body.
    pub spawn: [f32; 2],
    pub entity_size: [f32; 2],
    pub palette: Vec<PlayerColor>,
    pub max_pending_events: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            grab: GrabConfig::default(),
            viewport_width: 1920.0,
            viewport_height: 1080.0,
            spawn: [960.0, 540.0],
            entity_size: [100.0, 100.0],
            palette: default_palette(),
            max_pending_events: 256,
        }
    }
}

impl SessionConfig {
    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.viewport_width, self.viewport_height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let friction = self.physics.friction;
        if !(0.0..1.0).contains(&friction) {
            return Err(ConfigError::Friction(friction));
        }
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            return Err(ConfigError::Viewport {
                width: self.viewport_width,
                height: self.viewport_height,
            });
        }
        let [width, height] = self.entity_size;
        if width <= 0.0 || height <= 0.0 {
            return Err(ConfigError::EntitySize { width, height });
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SessionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn friction_out_of_range() {
        let mut config = SessionConfig::default();
        config.physics.friction = 1.0;
        assert_eq!(config.validate(), Err(ConfigError::Friction(1.0)));
    }

    #[test]
    fn empty_palette() {
        let config = SessionConfig {
            palette: Vec::new(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyPalette));
    }
}
