//! Client half of the handshake
//!
//! Pure state machine: it decides which packets to send in reaction to
//! server packets, and leaves the socket to [`crate::network`].

use log::{debug, info};
use shared::{ClientPacket, ClientRequest, ConnectionState, ServerPacket};

/// A packet to send and how many copies of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub packet: ClientPacket,
    pub repeat: u32,
}

impl Outgoing {
    fn once(packet: ClientPacket) -> Self {
        Self { packet, repeat: 1 }
    }
}

#[derive(Debug)]
pub struct Connection {
    name: String,
    state: ConnectionState,
    handshake_repeat: u32,
}

impl Connection {
    pub fn new(name: &str, handshake_repeat: u32) -> Self {
        Self {
            name: name.to_string(),
            state: ConnectionState::Disconnected,
            handshake_repeat: handshake_repeat.max(1),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Starts or retries the handshake. Returns `None` once connected.
    pub fn connect(&mut self) -> Option<Outgoing> {
        if self.is_connected() {
            return None;
        }
        self.state = ConnectionState::Connecting;
        Some(Outgoing::once(ClientPacket::Connecting {
            name: self.name.clone(),
        }))
    }

    /// Advances the handshake on a server packet.
    ///
    /// The first server Verification after each Connecting is answered with a
    /// burst of our own; the rest of the server's burst is ignored. The first
    /// JoinGame or World packet proves the server considers us connected.
    pub fn handle_packet(&mut self, packet: &ServerPacket) -> Option<Outgoing> {
        match (self.state, packet) {
            (ConnectionState::Connecting, ServerPacket::Verification { .. }) => {
                self.state = ConnectionState::Verification;
                Some(Outgoing {
                    packet: ClientPacket::Verification {
                        name: self.name.clone(),
                    },
                    repeat: self.handshake_repeat,
                })
            }
            (
                ConnectionState::Connecting | ConnectionState::Verification,
                ServerPacket::JoinGame { .. } | ServerPacket::World { .. },
            ) => {
                info!("Connected as {}", self.name);
                self.state = ConnectionState::Connected;
                None
            }
            (state, packet) => {
                if state != ConnectionState::Connected {
                    debug!("Ignoring server packet {:?} in state {:?}", packet, state);
                }
                None
            }
        }
    }

    /// Wraps a request for sending. Only connected clients may send requests.
    pub fn request(&self, request: ClientRequest) -> Option<Outgoing> {
        if !self.is_connected() {
            return None;
        }
        Some(Outgoing::once(ClientPacket::Connected {
            name: self.name.clone(),
            request,
        }))
    }

    /// Leaves the session. Returns the Disconnect request if we were connected.
    pub fn disconnect(&mut self) -> Option<Outgoing> {
        let outgoing = self.request(ClientRequest::Disconnect);
        self.state = ConnectionState::Disconnected;
        outgoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Position, MAX_PLAYER_SLOTS};

    fn world() -> ServerPacket {
        ServerPacket::World {
            server_time: 10,
            positions: [Position::default(); MAX_PLAYER_SLOTS],
            roster: Vec::new(),
        }
    }

    #[test]
    fn test_starts_disconnected() {
        let connection = Connection::new("alice", 10);
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(connection.request(ClientRequest::JoinGame).is_none());
    }

    #[test]
    fn test_full_handshake() {
        let mut connection = Connection::new("alice", 4);

        let hello = connection.connect().unwrap();
        assert_eq!(hello.repeat, 1);
        assert_eq!(
            hello.packet,
            ClientPacket::Connecting {
                name: "alice".to_string()
            }
        );
        assert_eq!(connection.state(), ConnectionState::Connecting);

        let answer = connection
            .handle_packet(&ServerPacket::Verification { server_time: 0 })
            .unwrap();
        assert_eq!(answer.repeat, 4);
        assert_eq!(answer.packet.state(), ConnectionState::Verification);
        assert_eq!(connection.state(), ConnectionState::Verification);

        assert!(connection.handle_packet(&world()).is_none());
        assert!(connection.is_connected());
        assert!(connection.connect().is_none());
    }

    #[test]
    fn test_one_answer_per_connect_attempt() {
        let mut connection = Connection::new("erin", 10);
        connection.connect();
        assert!(connection
            .handle_packet(&ServerPacket::Verification { server_time: 0 })
            .is_some());
        assert!(connection
            .handle_packet(&ServerPacket::Verification { server_time: 0 })
            .is_none());

        // A retry re-arms the answer
        connection.connect();
        assert!(connection
            .handle_packet(&ServerPacket::Verification { server_time: 0 })
            .is_some());
    }

    #[test]
    fn test_duplicate_verifications_after_connect_ignored() {
        let mut connection = Connection::new("bob", 10);
        connection.connect();
        connection.handle_packet(&ServerPacket::Verification { server_time: 0 });
        connection.handle_packet(&world());

        for _ in 0..9 {
            assert!(connection
                .handle_packet(&ServerPacket::Verification { server_time: 0 })
                .is_none());
        }
        assert!(connection.is_connected());
    }

    #[test]
    fn test_unsolicited_packets_ignored_when_disconnected() {
        let mut connection = Connection::new("carol", 10);
        assert!(connection
            .handle_packet(&ServerPacket::Verification { server_time: 0 })
            .is_none());
        assert!(connection.handle_packet(&world()).is_none());
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_request_and_disconnect() {
        let mut connection = Connection::new("dave", 10);
        connection.connect();
        connection.handle_packet(&ServerPacket::JoinGame {
            server_time: 0,
            player_slot: 1,
        });

        let join = connection.request(ClientRequest::JoinGame).unwrap();
        assert_eq!(
            join.packet,
            ClientPacket::Connected {
                name: "dave".to_string(),
                request: ClientRequest::JoinGame
            }
        );

        let bye = connection.disconnect().unwrap();
        assert!(matches!(
            bye.packet,
            ClientPacket::Connected {
                request: ClientRequest::Disconnect,
                ..
            }
        ));
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(connection.disconnect().is_none());
    }
}
