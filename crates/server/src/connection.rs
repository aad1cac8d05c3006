use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use frogpile::EntityId;

/// One joined client. Every connection owns exactly one entity.
#[derive(Debug)]
pub struct ClientConnection {
    pub addr: SocketAddr,
    pub client_id: u32,
    pub entity_id: EntityId,
    pub color: String,
    pub last_receive_time: Instant,
    pub send_sequence: u32,
}

impl ClientConnection {
    pub fn new(addr: SocketAddr, client_id: u32, entity_id: EntityId, color: String) -> Self {
        Self {
            addr,
            client_id,
            entity_id,
            color,
            last_receive_time: Instant::now(),
            send_sequence: 0,
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_receive_time.elapsed() > timeout
    }

    pub fn touch(&mut self) {
        self.last_receive_time = Instant::now();
    }

    /// Returns the sequence number for the next outgoing packet.
    pub fn next_sequence(&mut self) -> u32 {
        let sequence = self.send_sequence;
        self.send_sequence = self.send_sequence.wrapping_add(1);
        sequence
    }
}

#[derive(Debug)]
pub struct ConnectionManager {
    clients_by_addr: HashMap<SocketAddr, u32>,
    clients_by_entity: HashMap<EntityId, u32>,
    clients: HashMap<u32, ClientConnection>,
    next_client_id: u32,
    max_clients: usize,
    timeout: Duration,
}

impl ConnectionManager {
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients_by_addr: HashMap::new(),
            clients_by_entity: HashMap::new(),
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
            timeout,
        }
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    /// Registers a joined client. The caller checks [`Self::is_full`] and
    /// that `addr` is not already connected before spawning the entity.
    pub fn insert(&mut self, addr: SocketAddr, entity_id: EntityId, color: String) -> u32 {
        let client_id = self.next_client_id;
        self.next_client_id += 1;

        self.clients
            .insert(client_id, ClientConnection::new(addr, client_id, entity_id, color));
        self.clients_by_addr.insert(addr, client_id);
        self.clients_by_entity.insert(entity_id, client_id);
        client_id
    }

    pub fn get_by_addr(&self, addr: &SocketAddr) -> Option<&ClientConnection> {
        self.clients_by_addr
            .get(addr)
            .and_then(|id| self.clients.get(id))
    }

    pub fn get_by_addr_mut(&mut self, addr: &SocketAddr) -> Option<&mut ClientConnection> {
        let id = self.clients_by_addr.get(addr)?;
        self.clients.get_mut(id)
    }

    pub fn remove(&mut self, client_id: u32) -> Option<ClientConnection> {
        let conn = self.clients.remove(&client_id)?;
        self.clients_by_addr.remove(&conn.addr);
        self.clients_by_entity.remove(&conn.entity_id);
        Some(conn)
    }

    pub fn remove_by_addr(&mut self, addr: &SocketAddr) -> Option<ClientConnection> {
        let client_id = *self.clients_by_addr.get(addr)?;
        self.remove(client_id)
    }

    pub fn remove_by_entity(&mut self, entity_id: EntityId) -> Option<ClientConnection> {
        let client_id = *self.clients_by_entity.get(&entity_id)?;
        self.remove(client_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientConnection> {
        self.clients.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClientConnection> {
        self.clients.values_mut()
    }

    /// Drops idle connections and returns them so their entities can leave.
    pub fn cleanup_timed_out(&mut self) -> Vec<ClientConnection> {
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, c)| c.is_timed_out(self.timeout))
            .map(|(&id, _)| id)
            .collect();

        timed_out
            .into_iter()
            .filter_map(|id| self.remove(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
