use log::debug;
use shared::{Position, RosterEntry, ServerPacket, MAX_PLAYER_SLOTS};

/// The client's latest view of the server's world
///
/// Server packets carry the server time; anything older than the newest
/// packet already applied arrived out of order and is discarded, so the view
/// never moves backward.
#[derive(Debug, Clone, Default)]
pub struct ClientGameState {
    last_server_time: Option<i64>,
    /// Slot granted by the last JoinGame reply, 0 while spectating
    pub player_slot: u16,
    pub positions: [Position; MAX_PLAYER_SLOTS],
    pub roster: Vec<RosterEntry>,
    pub stale_dropped: u64,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_server_time(&self) -> Option<i64> {
        self.last_server_time
    }

    /// Applies a server packet unless it is stale. Returns whether it was applied.
    pub fn apply_server_packet(&mut self, packet: &ServerPacket) -> bool {
        let server_time = packet.server_time();
        if let Some(last) = self.last_server_time {
            if server_time < last {
                debug!("Dropping stale packet ({} < {})", server_time, last);
                self.stale_dropped += 1;
                return false;
            }
        }
        self.last_server_time = Some(server_time);

        match packet {
            ServerPacket::Verification { .. } => {}
            ServerPacket::JoinGame { player_slot, .. } => {
                self.player_slot = *player_slot;
            }
            ServerPacket::World {
                positions, roster, ..
            } => {
                self.positions = *positions;
                self.roster = roster.clone();
            }
        }
        true
    }

    /// Forgets the own slot. The server does not confirm leaving one.
    pub fn release_slot(&mut self) {
        self.player_slot = 0;
    }

    /// Position of the slot we drive, if we hold one.
    pub fn own_position(&self) -> Option<Position> {
        let index = usize::from(self.player_slot).checked_sub(1)?;
        self.positions.get(index).copied()
    }
}
