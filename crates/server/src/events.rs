use std::net::SocketAddr;

/// Operator-facing notifications, shown in the TUI log or written to the
/// log in headless mode.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    ClientJoined {
        client_id: u32,
        addr: SocketAddr,
        entity_id: u32,
        color: String,
    },
    ClientLeft {
        client_id: u32,
        entity_id: u32,
        reason: DisconnectReason,
    },
    JoinDenied {
        addr: SocketAddr,
        reason: String,
    },
    EntityDied {
        entity_id: u32,
        cause: &'static str,
    },
    OutboundDropped {
        tick: u32,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Graceful,
    Timeout,
    Died,
    Shutdown,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "left",
            DisconnectReason::Timeout => "timed out",
            DisconnectReason::Died => "died",
            DisconnectReason::Shutdown => "disconnected by shutdown",
        }
    }
}

impl ServerEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ServerEvent::JoinDenied { .. } | ServerEvent::OutboundDropped { .. }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ServerEvent::Error { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            ServerEvent::ClientJoined {
                client_id,
                addr,
                entity_id,
                color,
            } => format!(
                "Client {} joined from {} (entity {}, {})",
                client_id, addr, entity_id, color
            ),
            ServerEvent::ClientLeft {
                client_id,
                entity_id,
                reason,
            } => format!(
                "Client {} (entity {}) {}",
                client_id,
                entity_id,
                reason.as_str()
            ),
            ServerEvent::JoinDenied { addr, reason } => {
                format!("Join denied to {}: {}", addr, reason)
            }
            ServerEvent::EntityDied { entity_id, cause } => {
                format!("Entity {} {}", entity_id, cause)
            }
            ServerEvent::OutboundDropped { tick } => {
                format!("Outbound queue full, dropped tick {} output", tick)
            }
            ServerEvent::Error { message } => message.clone(),
        }
    }
}
