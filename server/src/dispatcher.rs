//! Receive path: decode one datagram and advance its session's state machine
//!
//! Handshake: an unseen address is answered with a burst of Verification
//! packets and its session waits in `Connecting`; the client's own
//! Verification moves it to `Connected`, after which request packets are
//! dispatched. Once [`MAX_ROSTER_ENTRIES`] sessions are connected, further
//! Verifications are refused so the world snapshot stays one datagram. Anything that does not fit the session's current state is
//! dropped without a reply, so duplicated, reordered or garbled datagrams
//! cannot corrupt the table or the world.

use crate::network::GameMessage;
use crate::state::ServerState;
use log::{debug, error, info, warn};
use shared::{ClientPacket, ClientRequest, ConnectionState, ServerPacket, MAX_ROSTER_ENTRIES};
use std::net::SocketAddr;

/// Handles one inbound datagram, returning the reply to send, if any.
pub fn dispatch(state: &mut ServerState, data: &[u8], addr: SocketAddr) -> Option<GameMessage> {
    let packet = match ClientPacket::decode(data) {
        Ok(packet) => packet,
        Err(e) => {
            warn!("Dropping malformed packet from {}: {}", addr, e);
            return None;
        }
    };

    handle_packet(state, packet, addr)
}

fn handle_packet(
    state: &mut ServerState,
    packet: ClientPacket,
    addr: SocketAddr,
) -> Option<GameMessage> {
    let previous = {
        let (session, is_new) = state.sessions.get_or_create(addr, packet.name());
        session.refresh_last_seen();
        (!is_new).then_some(session.state)
    };

    let Some(current) = previous else {
        return send_verification(state, addr);
    };

    match (current, packet) {
        (current, ClientPacket::Connecting { name }) => {
            if let Some(session) = state.sessions.get_mut(&addr) {
                match current {
                    ConnectionState::Disconnected => {
                        info!("{} ({}) reconnecting", addr, name);
                        session.state = ConnectionState::Connecting;
                        session.name = name;
                    }
                    ConnectionState::Connecting => session.name = name,
                    // Late duplicate from the handshake: answer, change nothing
                    ConnectionState::Verification | ConnectionState::Connected => {}
                }
            }
            send_verification(state, addr)
        }

        (ConnectionState::Connecting, ClientPacket::Verification { .. }) => {
            // Every connected session is listed in each World packet
            if state.sessions.connected_count() >= MAX_ROSTER_ENTRIES {
                warn!("Server full, {} stays connecting", addr);
                return None;
            }
            if let Some(session) = state.sessions.get_mut(&addr) {
                session.state = ConnectionState::Connected;
                info!("{} ({}) connected", addr, session.name);
            }
            None
        }

        (ConnectionState::Connected, ClientPacket::Connected { request, .. }) => {
            handle_request(state, request, addr)
        }

        (current, packet) => {
            debug!(
                "Ignoring {:?} packet from {} in state {:?}",
                packet.state(),
                addr,
                current
            );
            None
        }
    }
}

fn handle_request(
    state: &mut ServerState,
    request: ClientRequest,
    addr: SocketAddr,
) -> Option<GameMessage> {
    match request {
        ClientRequest::None => None,

        ClientRequest::JoinGame => {
            let player_slot = state.sessions.assign_slot(&addr);
            if player_slot == 0 {
                info!("{} asked to play but all slots are taken", addr);
            } else {
                info!("{} plays in slot {}", addr, player_slot);
            }
            let reply = ServerPacket::JoinGame {
                server_time: state.world.server_time,
                player_slot,
            };
            encode_reply(&reply, addr, 1)
        }

        ClientRequest::JoinSpectators => {
            state.sessions.release_slot(&addr);
            info!("{} is spectating", addr);
            None
        }

        ClientRequest::Disconnect => {
            state.sessions.release_slot(&addr);
            if let Some(session) = state.sessions.get_mut(&addr) {
                session.state = ConnectionState::Disconnected;
                info!("{} ({}) disconnected", addr, session.name);
            }
            None
        }

        ClientRequest::MovePosition { move_up, move_down } => {
            let player_slot = state
                .sessions
                .get(&addr)
                .map_or(0, |session| session.player_slot);
            if player_slot == 0 {
                debug!("Ignoring move from spectator {}", addr);
                return None;
            }

            let direction = match (move_up, move_down) {
                (true, false) => 1.0,
                (false, true) => -1.0,
                _ => 0.0,
            };
            if direction != 0.0 {
                state
                    .world
                    .move_vertical(player_slot, direction * state.step_size);
            }
            None
        }
    }
}

fn send_verification(state: &ServerState, addr: SocketAddr) -> Option<GameMessage> {
    let reply = ServerPacket::Verification {
        server_time: state.world.server_time,
    };
    encode_reply(&reply, addr, state.handshake_repeat)
}

fn encode_reply(packet: &ServerPacket, addr: SocketAddr, repeat: u32) -> Option<GameMessage> {
    match packet.encode() {
        Ok(data) => Some(GameMessage::SendPacket {
            data: data.into(),
            addr,
            repeat,
        }),
        Err(e) => {
            error!("Failed to encode reply for {}: {}", addr, e);
            None
        }
    }
}
