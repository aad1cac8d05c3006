use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, mpsc};

use frogpile::{
    EntityId, GameLoop, MAX_PACKET_SIZE, Packet, PacketHeader, PacketType, PlatformState, Rect,
    Session, SessionEvent, SharedSession, WorldSnapshot,
};

use crate::config::ServerConfig;
use crate::connection::{ClientConnection, ConnectionManager};
use crate::events::{DisconnectReason, ServerEvent};
use crate::stats::{NetworkCounters, NetworkStats};

const SWEEP_INTERVAL: Duration = Duration::from_millis(100);

/// Everything one tick hands to the outbound task.
#[derive(Debug)]
pub struct TickOutput {
    pub tick: u32,
    pub events: Vec<SessionEvent>,
    pub snapshot: Option<WorldSnapshot>,
}

/// State shared by the socket tasks, the game loop thread and the TUI.
///
/// Lock order is connections first, then the session. The session lock is
/// never held across an await.
pub struct ServerContext {
    pub config: ServerConfig,
    pub session: SharedSession,
    pub connections: Mutex<ConnectionManager>,
    pub counters: NetworkCounters,
    events: mpsc::UnboundedSender<ServerEvent>,
}

impl ServerContext {
    pub fn new(
        config: ServerConfig,
        session: Session,
        events: mpsc::UnboundedSender<ServerEvent>,
    ) -> Self {
        Self {
            connections: Mutex::new(ConnectionManager::new(
                config.max_clients,
                config.client_timeout,
            )),
            session: SharedSession::new(session),
            counters: NetworkCounters::default(),
            events,
            config,
        }
    }

    fn emit(&self, event: ServerEvent) {
        // A closed receiver only means nobody is watching.
        let _ = self.events.send(event);
    }

    /// Applies one inbound packet and returns the replies for its sender.
    pub async fn handle_packet(&self, packet: Packet, addr: SocketAddr) -> Vec<Packet> {
        if !packet.header.is_valid() {
            self.counters.record_malformed();
            log::debug!("Dropping packet with bad header from {}", addr);
            return Vec::new();
        }

        let mut connections = self.connections.lock().await;
        let mut replies = Vec::new();

        match packet.payload {
            PacketType::Join => self.handle_join(&mut connections, addr, &mut replies),
            PacketType::Intent { direction } => {
                self.handle_intent(&connections, addr, &direction)
            }
            PacketType::Leave => self.handle_leave(&mut connections, addr),
            PacketType::Ping { timestamp } => replies.push(PacketType::Pong { timestamp }),
            PacketType::AddPlatform(platform) => {
                self.handle_add_platform(platform, addr, &mut replies)
            }
            PacketType::MovePlatform { index, platform } => {
                self.handle_move_platform(index, platform, addr, &mut replies)
            }
            _ => log::debug!("Ignoring client-bound packet from {}", addr),
        }

        if let Some(client) = connections.get_by_addr_mut(&addr) {
            client.touch();
        }

        replies
            .into_iter()
            .map(|payload| {
                let sequence = connections
                    .get_by_addr_mut(&addr)
                    .map_or(0, ClientConnection::next_sequence);
                Packet::new(PacketHeader::new(sequence), payload)
            })
            .collect()
    }

    fn handle_join(
        &self,
        connections: &mut ConnectionManager,
        addr: SocketAddr,
        replies: &mut Vec<PacketType>,
    ) {
        let existing = connections
            .get_by_addr(&addr)
            .map(|client| (client.entity_id, client.color.clone()));
        if let Some((entity_id, color)) = existing {
            // A retransmitted join; a dead entity's owner gets a fresh one.
            if self.session.with(|session| session.entity(entity_id).is_some()) {
                replies.push(PacketType::Joined { entity_id, color });
                return;
            }
            connections.remove_by_addr(&addr);
        }

        if connections.is_full() {
            let reason = "Server full".to_string();
            self.emit(ServerEvent::JoinDenied {
                addr,
                reason: reason.clone(),
            });
            replies.push(PacketType::Denied { reason });
            return;
        }

        let ((entity_id, color), platforms) = self
            .session
            .with(|session| (session.join(), session.platforms()));
        let client_id = connections.insert(addr, entity_id, color.clone());

        self.emit(ServerEvent::ClientJoined {
            client_id,
            addr,
            entity_id,
            color: color.clone(),
        });
        replies.push(PacketType::Joined { entity_id, color });
        replies.push(PacketType::Platforms(platforms));
    }

    fn handle_intent(&self, connections: &ConnectionManager, addr: SocketAddr, direction: &str) {
        let Some(client) = connections.get_by_addr(&addr) else {
            log::debug!("Intent from unknown address {}", addr);
            return;
        };

        let entity_id = client.entity_id;
        let outcome = self
            .session
            .with(|session| session.apply_direction(entity_id, direction));
        if outcome.is_none() {
            log::debug!("Client {} sent malformed intent {:?}", client.client_id, direction);
        }
    }

    fn handle_leave(&self, connections: &mut ConnectionManager, addr: SocketAddr) {
        let Some(client) = connections.remove_by_addr(&addr) else {
            log::debug!("Leave from unknown address {}", addr);
            return;
        };

        self.session.with(|session| session.leave(client.entity_id));
        self.emit(ServerEvent::ClientLeft {
            client_id: client.client_id,
            entity_id: client.entity_id,
            reason: DisconnectReason::Graceful,
        });
    }

    fn handle_add_platform(
        &self,
        platform: PlatformState,
        addr: SocketAddr,
        replies: &mut Vec<PacketType>,
    ) {
        if !self.config.allow_map_edits {
            replies.push(PacketType::Denied {
                reason: "Map edits are disabled".to_string(),
            });
            return;
        }

        match self
            .session
            .with(|session| session.append_platform(Rect::from(platform)))
        {
            Ok(index) => log::info!("Platform {} added by {}", index, addr),
            Err(err) => replies.push(PacketType::Denied {
                reason: err.to_string(),
            }),
        }
    }

    fn handle_move_platform(
        &self,
        index: u32,
        platform: PlatformState,
        addr: SocketAddr,
        replies: &mut Vec<PacketType>,
    ) {
        if !self.config.allow_map_edits {
            replies.push(PacketType::Denied {
                reason: "Map edits are disabled".to_string(),
            });
            return;
        }

        match self.session.with(|session| {
            session.reposition_platform(index as usize, Rect::from(platform))
        }) {
            Ok(()) => log::info!("Platform {} moved by {}", index, addr),
            Err(err) => replies.push(PacketType::Denied {
                reason: err.to_string(),
            }),
        }
    }

    /// Turns one tick's output into addressed packets. Dead entities lose
    /// their connection here; only their owner hears about the death.
    pub fn route(
        &self,
        connections: &mut ConnectionManager,
        output: TickOutput,
    ) -> Vec<(SocketAddr, Packet)> {
        let mut sends = Vec::new();

        for event in output.events {
            match event {
                SessionEvent::EntityDied { id, cause } => {
                    self.emit(ServerEvent::EntityDied {
                        entity_id: id,
                        cause: cause.as_str(),
                    });
                    if let Some(mut client) = connections.remove_by_entity(id) {
                        let header = PacketHeader::new(client.next_sequence());
                        sends.push((
                            client.addr,
                            Packet::new(header, PacketType::Died { entity_id: id }),
                        ));
                        self.emit(ServerEvent::ClientLeft {
                            client_id: client.client_id,
                            entity_id: id,
                            reason: DisconnectReason::Died,
                        });
                    }
                }
                SessionEvent::PlatformsChanged => {
                    let platforms = self.session.with(|session| session.platforms());
                    for client in connections.iter_mut() {
                        let header = PacketHeader::new(client.next_sequence());
                        sends.push((
                            client.addr,
                            Packet::new(header, PacketType::Platforms(platforms.clone())),
                        ));
                    }
                }
                SessionEvent::EntityCreated { id, color } => {
                    log::debug!("Entity {} created ({})", id, color);
                }
                SessionEvent::EntityLeft { id } => log::debug!("Entity {} removed", id),
            }
        }

        if let Some(snapshot) = output.snapshot {
            for client in connections.iter_mut() {
                let header = PacketHeader::new(client.next_sequence());
                sends.push((
                    client.addr,
                    Packet::new(header, PacketType::Snapshot(snapshot.clone())),
                ));
            }
        }

        sends
    }

    /// Drops idle connections, and connections whose entity is gone because
    /// its death notice was never routed.
    pub fn sweep(&self, connections: &mut ConnectionManager) {
        for client in connections.cleanup_timed_out() {
            self.session.with(|session| session.leave(client.entity_id));
            self.emit(ServerEvent::ClientLeft {
                client_id: client.client_id,
                entity_id: client.entity_id,
                reason: DisconnectReason::Timeout,
            });
        }

        let orphaned: Vec<EntityId> = self.session.with(|session| {
            connections
                .iter()
                .map(|client| client.entity_id)
                .filter(|&id| session.entity(id).is_none())
                .collect()
        });
        for entity_id in orphaned {
            if let Some(client) = connections.remove_by_entity(entity_id) {
                self.emit(ServerEvent::ClientLeft {
                    client_id: client.client_id,
                    entity_id,
                    reason: DisconnectReason::Died,
                });
            }
        }
    }

    async fn send(&self, socket: &UdpSocket, packet: &Packet, addr: SocketAddr) {
        let bytes = match packet.serialize() {
            Ok(bytes) => bytes,
            Err(err) => {
                self.emit(ServerEvent::Error {
                    message: format!("Failed to encode packet for {}: {}", addr, err),
                });
                return;
            }
        };

        match socket.send_to(&bytes, addr).await {
            Ok(sent) => self.counters.record_sent(sent),
            Err(err) => self.emit(ServerEvent::Error {
                message: format!("Failed to send to {}: {}", addr, err),
            }),
        }
    }

    /// Read-only view for the operator console. Call from a blocking thread.
    pub fn blocking_status(&self) -> ServerStatus {
        let (client_count, max_clients) = {
            let connections = self.connections.blocking_lock();
            (connections.len(), connections.max_clients())
        };

        self.session.with(|session| ServerStatus {
            tick: session.tick_count(),
            client_count,
            max_clients,
            entities: session
                .world()
                .entities()
                .map(|entity| EntityRow {
                    id: entity.id,
                    color: entity.color.name.clone(),
                    state: entity.state.as_str(),
                    position: entity.rect.position().into(),
                    partner: entity.grabbing.or(entity.held_by),
                })
                .collect(),
            camera_focus: session.camera().focus().into(),
            dropped_events: session.dropped_events(),
            network: self.counters.snapshot(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct EntityRow {
    pub id: EntityId,
    pub color: String,
    pub state: &'static str,
    pub position: [f32; 2],
    pub partner: Option<EntityId>,
}

#[derive(Debug, Clone)]
pub struct ServerStatus {
    pub tick: u32,
    pub client_count: usize,
    pub max_clients: usize,
    pub entities: Vec<EntityRow>,
    pub camera_focus: [f32; 2],
    pub dropped_events: u64,
    pub network: NetworkStats,
}

pub struct GameServer {
    socket: Arc<UdpSocket>,
    context: Arc<ServerContext>,
    running: Arc<AtomicBool>,
}

impl GameServer {
    pub async fn bind(
        bind_addr: &str,
        config: ServerConfig,
        session: Session,
        events: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<Self> {
        config.validate().context("invalid server config")?;
        let socket = UdpSocket::bind(bind_addr)
            .await
            .with_context(|| format!("binding UDP socket on {}", bind_addr))?;

        Ok(Self {
            socket: Arc::new(socket),
            context: Arc::new(ServerContext::new(config, session, events)),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.context)
    }

    /// Serves until the running flag is cleared, then stops the game loop and
    /// tells every client to disconnect.
    pub async fn run(self) -> Result<()> {
        let (outbound_tx, outbound_rx) = mpsc::channel(self.context.config.outbound_capacity);

        let game_loop = spawn_game_loop(
            Arc::clone(&self.context),
            Arc::clone(&self.running),
            outbound_tx,
        )?;
        let outbound = tokio::spawn(outbound_task(
            Arc::clone(&self.context),
            Arc::clone(&self.socket),
            outbound_rx,
        ));

        self.receive_loop().await;

        self.running.store(false, Ordering::SeqCst);
        let ticks = tokio::task::spawn_blocking(move || game_loop.join())
            .await
            .context("joining game loop")?
            .map_err(|_| anyhow::anyhow!("game loop thread panicked"))?;
        log::info!("Game loop ran {} ticks", ticks);

        // The loop thread owned the only sender; the outbound task drains
        // what is left and exits.
        outbound.await.context("joining outbound task")?;

        self.disconnect_all().await;
        Ok(())
    }

    async fn receive_loop(&self) {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let mut sweep = tokio::time::interval(SWEEP_INTERVAL);

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => match result {
                    Ok((len, addr)) => self.receive(&buf[..len], addr).await,
                    Err(err) => self.context.emit(ServerEvent::Error {
                        message: format!("Network error: {}", err),
                    }),
                },
                _ = sweep.tick() => {
                    let mut connections = self.context.connections.lock().await;
                    self.context.sweep(&mut connections);
                }
            }
        }
    }

    async fn receive(&self, data: &[u8], addr: SocketAddr) {
        self.context.counters.record_received(data.len());

        let packet = match Packet::deserialize(data) {
            Ok(packet) => packet,
            Err(err) => {
                self.context.counters.record_malformed();
                log::debug!("Malformed packet from {}: {}", addr, err);
                return;
            }
        };

        for reply in self.context.handle_packet(packet, addr).await {
            self.context.send(&self.socket, &reply, addr).await;
        }
    }

    async fn disconnect_all(&self) {
        let mut connections = self.context.connections.lock().await;
        if connections.is_empty() {
            return;
        }

        let sends: Vec<(SocketAddr, Packet)> = connections
            .iter_mut()
            .map(|client| {
                let header = PacketHeader::new(client.next_sequence());
                (client.addr, Packet::new(header, PacketType::Disconnect))
            })
            .collect();

        let ids: Vec<u32> = connections.iter().map(|client| client.client_id).collect();
        for client_id in ids {
            if let Some(client) = connections.remove(client_id) {
                self.context.emit(ServerEvent::ClientLeft {
                    client_id,
                    entity_id: client.entity_id,
                    reason: DisconnectReason::Shutdown,
                });
            }
        }
        drop(connections);

        for (addr, packet) in sends {
            self.context.send(&self.socket, &packet, addr).await;
        }
    }
}

fn spawn_game_loop(
    context: Arc<ServerContext>,
    running: Arc<AtomicBool>,
    outbound: mpsc::Sender<TickOutput>,
) -> Result<JoinHandle<u64>> {
    let handle = thread::Builder::new()
        .name("game-loop".to_string())
        .spawn(move || {
            let send_rate = context.config.snapshot_send_rate.max(1);
            let mut game_loop = GameLoop::new(context.config.tick_rate, running);

            game_loop.run(|_| {
                let output = context.session.with(|session| {
                    session.tick();
                    let tick = session.tick_count();
                    TickOutput {
                        tick,
                        events: session.drain_events(),
                        snapshot: (tick % send_rate == 0).then(|| session.publish_snapshot()),
                    }
                });

                if let Err(mpsc::error::TrySendError::Full(output)) = outbound.try_send(output) {
                    context.counters.record_dropped_batch();
                    log::warn!("Outbound queue full, dropping tick {}", output.tick);
                    context.emit(ServerEvent::OutboundDropped { tick: output.tick });
                }
            });

            game_loop.ticks()
        })
        .context("spawning game loop thread")?;

    Ok(handle)
}

async fn outbound_task(
    context: Arc<ServerContext>,
    socket: Arc<UdpSocket>,
    mut outbound: mpsc::Receiver<TickOutput>,
) {
    while let Some(output) = outbound.recv().await {
        let sends = {
            let mut connections = context.connections.lock().await;
            context.route(&mut connections, output)
        };

        for (addr, packet) in sends {
            context.send(&socket, &packet, addr).await;
        }
    }
}
