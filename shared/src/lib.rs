//! Protocol definitions shared by the session server and its clients
//!
//! Both sides agree on the packet layouts in [`packet`], the primitive
//! encoding in [`codec`] and the constants below. Nothing here touches a
//! socket.

use serde::{Deserialize, Serialize};

pub mod codec;
pub mod packet;

pub use codec::{CodecError, WireReader, WireResult, WireWriter};
pub use packet::{
    ClientPacket, ClientRequest, ConnectionState, Request, RosterEntry, ServerPacket,
    MAX_ROSTER_ENTRIES,
};

/// Number of world-position slots a player can own. Slot 0 means spectating.
pub const MAX_PLAYER_SLOTS: usize = 3;
pub const DEFAULT_PORT: u16 = 5000;
/// How many copies of each handshake reply are sent.
pub const DEFAULT_HANDSHAKE_REPEAT: u32 = 10;
/// Vertical distance applied by one `MovePosition` request.
pub const DEFAULT_STEP_SIZE: f32 = 0.01;
pub const DEFAULT_TICK_MS: u64 = 16;
/// Server time resolution: 100 ns per tick.
pub const SERVER_TIME_TICKS_PER_SECOND: i64 = 10_000_000;
/// Largest datagram either side expects to receive.
pub const MAX_DATAGRAM_SIZE: usize = 2048;
/// Longest session name, in bytes, either side will encode or accept.
pub const MAX_NAME_LEN: usize = 32;

/// A point in the shared 3-D world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}
