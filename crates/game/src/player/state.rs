use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum InteractionState {
    #[default]
    Idle = 0,
    Leaping = 1,
    Jumping = 2,
    Falling = 3,
    Grabbing = 4,
    Held = 5,
}

impl InteractionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Leaping => "leaping",
            Self::Jumping => "jumping",
            Self::Falling => "falling",
            Self::Grabbing => "grabbing",
            Self::Held => "held",
        }
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self, Self::Jumping | Self::Falling)
    }
}

impl From<u8> for InteractionState {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Leaping,
            2 => Self::Jumping,
            3 => Self::Falling,
            4 => Self::Grabbing,
            5 => Self::Held,
            _ => Self::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// `-1.0` for left, `1.0` for right.
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// A directional intent sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Left,
    Right,
    Up,
    Grab,
}

impl Intent {
    /// Parses the wire spelling. Anything unrecognised yields `None` and is
    /// dropped by the caller.
    pub fn parse(direction: &str) -> Option<Self> {
        match direction {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "up" => Some(Self::Up),
            "grab" => Some(Self::Grab),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Grab => "grab",
        }
    }
}
