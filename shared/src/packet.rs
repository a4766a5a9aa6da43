//! Packet layouts for both directions of the session protocol
//!
//! Client packets lead with the sender's connection state and name; server
//! packets lead with the server time so clients can drop stale arrivals.

use crate::codec::{CodecError, WireReader, WireResult, WireWriter, POSITION_WIRE_SIZE};
use crate::{Position, MAX_DATAGRAM_SIZE, MAX_NAME_LEN, MAX_PLAYER_SLOTS};

/// Connection state codes carried in every packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Verification = 2,
    Connected = 3,
}

impl TryFrom<u16> for ConnectionState {
    type Error = CodecError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Disconnected),
            1 => Ok(Self::Connecting),
            2 => Ok(Self::Verification),
            3 => Ok(Self::Connected),
            other => Err(CodecError::UnknownConnectionState(other)),
        }
    }
}

/// Request codes following the header of `Connected` packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Request {
    None = 0,
    Disconnect = 1,
    JoinGame = 2,
    JoinSpectators = 3,
    MovePosition = 4,
}

impl TryFrom<u16> for Request {
    type Error = CodecError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Disconnect),
            2 => Ok(Self::JoinGame),
            3 => Ok(Self::JoinSpectators),
            4 => Ok(Self::MovePosition),
            other => Err(CodecError::UnknownRequest(other)),
        }
    }
}

/// A request from a connected client, with its body decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    None,
    Disconnect,
    JoinGame,
    JoinSpectators,
    MovePosition { move_up: bool, move_down: bool },
}

impl ClientRequest {
    pub fn code(&self) -> Request {
        match self {
            Self::None => Request::None,
            Self::Disconnect => Request::Disconnect,
            Self::JoinGame => Request::JoinGame,
            Self::JoinSpectators => Request::JoinSpectators,
            Self::MovePosition { .. } => Request::MovePosition,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    Connecting { name: String },
    Verification { name: String },
    Connected { name: String, request: ClientRequest },
}

impl ClientPacket {
    pub fn name(&self) -> &str {
        match self {
            Self::Connecting { name } | Self::Verification { name } | Self::Connected { name, .. } => {
                name
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self {
            Self::Connecting { .. } => ConnectionState::Connecting,
            Self::Verification { .. } => ConnectionState::Verification,
            Self::Connected { .. } => ConnectionState::Connected,
        }
    }

    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.write_u16(self.state() as u16)?;
        writer.write_bounded_str(self.name(), MAX_NAME_LEN)?;

        if let Self::Connected { request, .. } = self {
            writer.write_u16(request.code() as u16)?;
            if let ClientRequest::MovePosition { move_up, move_down } = request {
                writer.write_bool(*move_up)?;
                writer.write_bool(*move_down)?;
            }
        }

        Ok(writer.into_bytes())
    }

    /// Decodes a whole client datagram. Trailing bytes are ignored.
    ///
    /// Names longer than [`MAX_NAME_LEN`] make the whole packet malformed.
    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut reader = WireReader::new(data);
        let state = ConnectionState::try_from(reader.read_u16()?)?;
        let name = reader.read_bounded_str(MAX_NAME_LEN)?;

        match state {
            ConnectionState::Connecting => Ok(Self::Connecting { name }),
            ConnectionState::Verification => Ok(Self::Verification { name }),
            ConnectionState::Connected => {
                let request = match Request::try_from(reader.read_u16()?)? {
                    Request::None => ClientRequest::None,
                    Request::Disconnect => ClientRequest::Disconnect,
                    Request::JoinGame => ClientRequest::JoinGame,
                    Request::JoinSpectators => ClientRequest::JoinSpectators,
                    Request::MovePosition => ClientRequest::MovePosition {
                        move_up: reader.read_bool()?,
                        move_down: reader.read_bool()?,
                    },
                };
                Ok(Self::Connected { name, request })
            }
            ConnectionState::Disconnected => Err(CodecError::Unexpected("disconnected state")),
        }
    }
}

/// One connected session as listed in a world packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub player_slot: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerPacket {
    Verification {
        server_time: i64,
    },
    JoinGame {
        server_time: i64,
        player_slot: u16,
    },
    World {
        server_time: i64,
        positions: [Position; MAX_PLAYER_SLOTS],
        roster: Vec<RosterEntry>,
    },
}

/// Smallest possible roster entry: empty name plus slot.
const MIN_ROSTER_ENTRY_SIZE: usize = 4 + 2;
/// Largest possible roster entry: longest name plus slot.
const MAX_ROSTER_ENTRY_SIZE: usize = 4 + MAX_NAME_LEN + 2;
/// World packet without its roster entries.
const WORLD_HEADER_SIZE: usize = 8 + 2 + 2 + MAX_PLAYER_SLOTS * POSITION_WIRE_SIZE + 4;

/// Most roster entries a World packet may carry. At this count, with every
/// name at [`MAX_NAME_LEN`], the packet still fits in [`MAX_DATAGRAM_SIZE`].
pub const MAX_ROSTER_ENTRIES: usize =
    (MAX_DATAGRAM_SIZE - WORLD_HEADER_SIZE) / MAX_ROSTER_ENTRY_SIZE;

fn check_roster_len(len: usize) -> WireResult<()> {
    if len > MAX_ROSTER_ENTRIES {
        return Err(CodecError::LimitExceeded {
            kind: "roster size",
            len,
            max: MAX_ROSTER_ENTRIES,
        });
    }
    Ok(())
}

impl ServerPacket {
    pub fn server_time(&self) -> i64 {
        match self {
            Self::Verification { server_time }
            | Self::JoinGame { server_time, .. }
            | Self::World { server_time, .. } => *server_time,
        }
    }

    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.write_i64(self.server_time())?;

        match self {
            Self::Verification { .. } => {
                writer.write_u16(ConnectionState::Verification as u16)?;
            }
            Self::JoinGame { player_slot, .. } => {
                writer.write_u16(ConnectionState::Connected as u16)?;
                writer.write_u16(Request::JoinGame as u16)?;
                writer.write_u16(*player_slot)?;
            }
            Self::World {
                positions, roster, ..
            } => {
                writer.write_u16(ConnectionState::Connected as u16)?;
                writer.write_u16(Request::None as u16)?;
                for position in positions {
                    writer.write_position(position)?;
                }
                check_roster_len(roster.len())?;
                let count = i32::try_from(roster.len())
                    .map_err(|_| CodecError::Unexpected("roster size"))?;
                writer.write_i32(count)?;
                for entry in roster {
                    writer.write_bounded_str(&entry.name, MAX_NAME_LEN)?;
                    writer.write_u16(entry.player_slot)?;
                }
            }
        }

        Ok(writer.into_bytes())
    }

    /// Decodes a whole server datagram. Trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> WireResult<Self> {
        let mut reader = WireReader::new(data);
        let server_time = reader.read_i64()?;

        match ConnectionState::try_from(reader.read_u16()?)? {
            ConnectionState::Verification => Ok(Self::Verification { server_time }),
            ConnectionState::Connected => match Request::try_from(reader.read_u16()?)? {
                Request::JoinGame => Ok(Self::JoinGame {
                    server_time,
                    player_slot: reader.read_u16()?,
                }),
                Request::None => {
                    let mut positions = [Position::default(); MAX_PLAYER_SLOTS];
                    for position in positions.iter_mut() {
                        *position = reader.read_position()?;
                    }

                    let count = reader.read_i32()?;
                    let count = usize::try_from(count).map_err(|_| CodecError::NegativeCount(count))?;
                    check_roster_len(count)?;
                    let needed = count.saturating_mul(MIN_ROSTER_ENTRY_SIZE);
                    if needed > reader.remaining() {
                        return Err(CodecError::Truncated {
                            needed,
                            available: reader.remaining(),
                        });
                    }

                    let mut roster = Vec::with_capacity(count);
                    for _ in 0..count {
                        let name = reader.read_bounded_str(MAX_NAME_LEN)?;
                        let player_slot = reader.read_u16()?;
                        roster.push(RosterEntry { name, player_slot });
                    }

                    Ok(Self::World {
                        server_time,
                        positions,
                        roster,
                    })
                }
                _ => Err(CodecError::Unexpected("request from server")),
            },
            _ => Err(CodecError::Unexpected("server connection state")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    fn world_packet() -> ServerPacket {
        ServerPacket::World {
            server_time: 42,
            positions: [
                Position::new(0.0, 0.0, 0.0),
                Position::new(1.5, f32::MAX, -3.0),
                Position::new(f32::NEG_INFINITY, 0.01, f32::INFINITY),
            ],
            roster: vec![
                RosterEntry {
                    name: "alice".to_string(),
                    player_slot: 1,
                },
                RosterEntry {
                    name: String::new(),
                    player_slot: 0,
                },
            ],
        }
    }

    #[test]
    fn test_enum_codes() {
        assert_eq!(ConnectionState::Connected as u16, 3);
        assert_eq!(Request::MovePosition as u16, 4);
        assert_eq!(ConnectionState::try_from(2).unwrap(), ConnectionState::Verification);
        assert!(matches!(
            ConnectionState::try_from(4),
            Err(CodecError::UnknownConnectionState(4))
        ));
        assert!(matches!(Request::try_from(9), Err(CodecError::UnknownRequest(9))));
    }

    #[test]
    fn test_client_connecting_layout() {
        let packet = ClientPacket::Connecting {
            name: "bob".to_string(),
        };
        let data = packet.encode().unwrap();
        assert_eq!(data, vec![1, 0, 3, 0, 0, 0, b'b', b'o', b'b']);
        assert_eq!(ClientPacket::decode(&data).unwrap(), packet);
    }

    #[test]
    fn test_client_move_layout() {
        let packet = ClientPacket::Connected {
            name: "a".to_string(),
            request: ClientRequest::MovePosition {
                move_up: true,
                move_down: false,
            },
        };
        let data = packet.encode().unwrap();
        assert_eq!(data, vec![3, 0, 1, 0, 0, 0, b'a', 4, 0, 1, 0]);
        assert_eq!(ClientPacket::decode(&data).unwrap(), packet);
    }

    #[test]
    fn test_client_requests_decode() {
        for request in [
            ClientRequest::None,
            ClientRequest::Disconnect,
            ClientRequest::JoinGame,
            ClientRequest::JoinSpectators,
            ClientRequest::MovePosition {
                move_up: true,
                move_down: true,
            },
        ] {
            let packet = ClientPacket::Connected {
                name: "carol".to_string(),
                request,
            };
            let decoded = ClientPacket::decode(&packet.encode().unwrap()).unwrap();
            assert_eq!(decoded, packet);
            assert_eq!(decoded.state(), ConnectionState::Connected);
            assert_eq!(decoded.name(), "carol");
        }
    }

    #[test]
    fn test_client_decode_rejects_bad_codes() {
        assert_err!(ClientPacket::decode(&[0, 0, 0, 0, 0, 0]));
        assert_err!(ClientPacket::decode(&[7, 0, 0, 0, 0, 0]));
        assert_err!(ClientPacket::decode(&[3, 0, 0, 0, 0, 0, 5, 0]));
        assert_err!(ClientPacket::decode(&[]));
    }

    #[test]
    fn test_truncated_move_body() {
        let packet = ClientPacket::Connected {
            name: "dave".to_string(),
            request: ClientRequest::MovePosition {
                move_up: true,
                move_down: false,
            },
        };
        let data = packet.encode().unwrap();
        for len in 0..data.len() {
            assert_err!(ClientPacket::decode(&data[..len]));
        }
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let packet = ClientPacket::Verification {
            name: "eve".to_string(),
        };
        let mut data = packet.encode().unwrap();
        data.extend_from_slice(&[0; 16]);
        assert_eq!(ClientPacket::decode(&data).unwrap(), packet);
    }

    #[test]
    fn test_server_verification_layout() {
        let packet = ServerPacket::Verification { server_time: 1 };
        let data = packet.encode().unwrap();
        assert_eq!(data, vec![1, 0, 0, 0, 0, 0, 0, 0, 2, 0]);
        assert_eq!(ServerPacket::decode(&data).unwrap(), packet);
    }

    #[test]
    fn test_server_join_game_layout() {
        let packet = ServerPacket::JoinGame {
            server_time: 0,
            player_slot: 2,
        };
        let data = packet.encode().unwrap();
        assert_eq!(&data[8..], &[3, 0, 2, 0, 2, 0]);
        assert_eq!(ServerPacket::decode(&data).unwrap(), packet);
    }

    #[test]
    fn test_world_packet_decodes() {
        let packet = world_packet();
        let data = packet.encode().unwrap();
        assert_eq!(data.len(), 8 + 2 + 2 + 36 + 4 + (4 + 5 + 2) + (4 + 2));
        assert_eq!(ServerPacket::decode(&data).unwrap(), packet);
    }

    #[test]
    fn test_world_packet_truncations() {
        let data = world_packet().encode().unwrap();
        for len in 0..data.len() {
            assert_err!(ServerPacket::decode(&data[..len]));
        }
    }

    #[test]
    fn test_world_packet_huge_count() {
        let mut writer = WireWriter::new();
        writer.write_i64(0).unwrap();
        writer.write_u16(ConnectionState::Connected as u16).unwrap();
        writer.write_u16(Request::None as u16).unwrap();
        for _ in 0..MAX_PLAYER_SLOTS {
            writer.write_position(&Position::default()).unwrap();
        }
        let header = writer.into_bytes();

        let mut huge = header.clone();
        huge.extend_from_slice(&i32::MAX.to_le_bytes());
        assert!(matches!(
            ServerPacket::decode(&huge),
            Err(CodecError::LimitExceeded { .. })
        ));

        // Within the limit but with no entries behind it
        let mut empty = header;
        empty.extend_from_slice(&(MAX_ROSTER_ENTRIES as i32).to_le_bytes());
        assert!(matches!(
            ServerPacket::decode(&empty),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_name_at_max_length() {
        let name = "n".repeat(MAX_NAME_LEN);
        let packet = ClientPacket::Connected {
            name: name.clone(),
            request: ClientRequest::JoinGame,
        };
        let data = packet.encode().unwrap();
        assert_eq!(data.len(), 2 + 4 + MAX_NAME_LEN + 2);
        assert_eq!(ClientPacket::decode(&data).unwrap().name(), name);
    }

    #[test]
    fn test_name_over_max_length_rejected() {
        let name = "n".repeat(MAX_NAME_LEN + 1);
        assert_err!(ClientPacket::Connecting { name: name.clone() }.encode());

        // Hand-built datagram with the long name
        let mut writer = WireWriter::new();
        writer.write_u16(ConnectionState::Connecting as u16).unwrap();
        writer.write_str(&name).unwrap();
        assert!(matches!(
            ClientPacket::decode(&writer.into_bytes()),
            Err(CodecError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_largest_world_packet_fits_datagram() {
        let packet = ServerPacket::World {
            server_time: i64::MAX,
            positions: [Position::new(f32::MAX, f32::MIN, f32::INFINITY); MAX_PLAYER_SLOTS],
            roster: (0..MAX_ROSTER_ENTRIES)
                .map(|i| RosterEntry {
                    name: "w".repeat(MAX_NAME_LEN),
                    player_slot: (i % (MAX_PLAYER_SLOTS + 1)) as u16,
                })
                .collect(),
        };
        let data = packet.encode().unwrap();
        assert!(data.len() <= MAX_DATAGRAM_SIZE);
        assert_eq!(ServerPacket::decode(&data).unwrap(), packet);
    }

    #[test]
    fn test_world_roster_over_limit_not_encoded() {
        let packet = ServerPacket::World {
            server_time: 0,
            positions: [Position::default(); MAX_PLAYER_SLOTS],
            roster: vec![
                RosterEntry {
                    name: "x".to_string(),
                    player_slot: 0,
                };
                MAX_ROSTER_ENTRIES + 1
            ],
        };
        assert!(matches!(
            packet.encode(),
            Err(CodecError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_server_decode_rejects_client_states() {
        let mut writer = WireWriter::new();
        writer.write_i64(5).unwrap();
        writer.write_u16(ConnectionState::Connecting as u16).unwrap();
        assert_err!(ServerPacket::decode(&writer.into_bytes()));
    }
}
