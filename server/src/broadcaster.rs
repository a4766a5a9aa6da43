//! Send path: the periodic world snapshot
//!
//! One packet is encoded per tick and the same bytes go to every connected
//! session, so the cost of a tick grows with the number of sends only.

use crate::network::GameMessage;
use crate::state::ServerState;
use log::error;
use shared::{RosterEntry, ServerPacket};
use std::time::Duration;

/// Snapshot of the world and the connected roster, in insertion order.
pub fn build_world_packet(state: &ServerState) -> ServerPacket {
    let mut roster = Vec::new();
    state.sessions.for_each_connected(|session| {
        roster.push(RosterEntry {
            name: session.name.clone(),
            player_slot: session.player_slot,
        });
    });

    ServerPacket::World {
        server_time: state.world.server_time,
        positions: *state.world.positions(),
        roster,
    }
}

/// Runs one broadcast tick.
///
/// Refreshes the server clock from `elapsed` (time since start), then returns
/// the encoded snapshot addressed to every connected session. Returns `None`
/// when nobody is connected.
pub fn broadcast(state: &mut ServerState, elapsed: Duration) -> Option<GameMessage> {
    state.world.refresh_server_time(elapsed);

    let recipients = state.sessions.connected_addrs();
    if recipients.is_empty() {
        return None;
    }

    match build_world_packet(state).encode() {
        Ok(data) => Some(GameMessage::BroadcastPacket {
            data: data.into(),
            recipients,
        }),
        Err(e) => {
            error!("Failed to encode world state: {}", e);
            None
        }
    }
}
