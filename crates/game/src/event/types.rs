use crate::snapshot::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// The lowest body when the group spread exceeded the viewport height.
    LeftBehind,
    /// Fell below the bottom of the viewport.
    FellOff,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftBehind => "left behind",
            Self::FellOff => "fell off the world",
        }
    }
}

/// Notifications the session raises for the transport boundary. Delivery is
/// advisory: the state change they describe has already happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    EntityCreated { id: EntityId, color: String },
    /// Targeted at the owner of `id` only.
    EntityDied { id: EntityId, cause: DeathCause },
    EntityLeft { id: EntityId },
    PlatformsChanged,
}

impl SessionEvent {
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Self::EntityCreated { id, .. }
            | Self::EntityDied { id, .. }
            | Self::EntityLeft { id } => Some(*id),
            Self::PlatformsChanged => None,
        }
    }

    /// Events that can be rebuilt from later state and are evicted first.
    pub fn is_coalescable(&self) -> bool {
        matches!(self, Self::PlatformsChanged)
    }
}
