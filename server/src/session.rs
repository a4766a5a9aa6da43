//! Session table: one record per remote address that has contacted the server
//!
//! Sessions are keyed by socket address for O(1) lookup while a separate list
//! remembers insertion order, so broadcast rosters come out the same way on
//! every run. Player slots are tracked here too: the table is the only place
//! that knows which address owns which slot, which is what keeps slot
//! ownership exclusive.

use log::info;
use shared::{ConnectionState, MAX_PLAYER_SLOTS};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// Server-side record of one remote client
#[derive(Debug, Clone)]
pub struct Session {
    /// Remote endpoint, the session's identity
    pub addr: SocketAddr,
    /// Display name from the latest handshake
    pub name: String,
    pub state: ConnectionState,
    /// 0 while spectating, otherwise 1..=MAX_PLAYER_SLOTS
    pub player_slot: u16,
    /// Last time any valid packet arrived from this address. Informational only.
    pub last_seen: Instant,
}

impl Session {
    pub fn new(addr: SocketAddr, name: String) -> Self {
        Self {
            addr,
            name,
            state: ConnectionState::Connecting,
            player_slot: 0,
            last_seen: Instant::now(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn refresh_last_seen(&mut self) {
        self.last_seen = Instant::now();
    }
}

/// All sessions known to the server, plus slot ownership
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<SocketAddr, Session>,
    /// Addresses in the order their sessions were created
    order: Vec<SocketAddr>,
    /// `slots[i]` owns player slot `i + 1`
    slots: [Option<SocketAddr>; MAX_PLAYER_SLOTS],
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&Session> {
        self.sessions.get(addr)
    }

    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut Session> {
        self.sessions.get_mut(addr)
    }

    /// Returns the session for `addr`, creating it in `Connecting` if unseen.
    ///
    /// The boolean is true when the session was created by this call. The name
    /// of an existing session is left untouched.
    pub fn get_or_create(&mut self, addr: SocketAddr, name: &str) -> (&mut Session, bool) {
        let is_new = !self.sessions.contains_key(&addr);
        if is_new {
            info!("New session from {} ({})", addr, name);
            self.order.push(addr);
        }
        let session = self
            .sessions
            .entry(addr)
            .or_insert_with(|| Session::new(addr, name.to_string()));
        (session, is_new)
    }

    /// Destroys a session, freeing its slot.
    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Session> {
        let session = self.sessions.remove(addr)?;
        self.order.retain(|a| a != addr);
        self.free_slot_of(addr);
        info!("Session {} removed", addr);
        Some(session)
    }

    /// Visits connected sessions in insertion order.
    pub fn for_each_connected<F>(&self, mut f: F)
    where
        F: FnMut(&Session),
    {
        for addr in &self.order {
            if let Some(session) = self.sessions.get(addr) {
                if session.is_connected() {
                    f(session);
                }
            }
        }
    }

    pub fn connected_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_connected()).count()
    }

    /// Addresses of connected sessions in insertion order.
    pub fn connected_addrs(&self) -> Vec<SocketAddr> {
        let mut addrs = Vec::new();
        self.for_each_connected(|session| addrs.push(session.addr));
        addrs
    }

    /// Gives the session the lowest free slot, or 0 if every slot is taken.
    ///
    /// A session that already holds a slot keeps it and gets it back, so
    /// repeated calls never allocate twice. Unknown addresses get 0.
    pub fn assign_slot(&mut self, addr: &SocketAddr) -> u16 {
        let Some(session) = self.sessions.get_mut(addr) else {
            return 0;
        };
        if session.player_slot != 0 {
            return session.player_slot;
        }

        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(*addr);
                session.player_slot = (index + 1) as u16;
                session.player_slot
            }
            None => 0,
        }
    }

    /// Returns the session's slot to the free pool and makes it a spectator.
    pub fn release_slot(&mut self, addr: &SocketAddr) {
        self.free_slot_of(addr);
        if let Some(session) = self.sessions.get_mut(addr) {
            session.player_slot = 0;
        }
    }

    fn free_slot_of(&mut self, addr: &SocketAddr) {
        for slot in self.slots.iter_mut() {
            if slot.as_ref() == Some(addr) {
                *slot = None;
            }
        }
    }

    /// Address currently holding `slot`, if any. Slot 0 never has an owner.
    pub fn slot_owner(&self, slot: u16) -> Option<SocketAddr> {
        let index = usize::from(slot).checked_sub(1)?;
        self.slots.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
