use shared::{Position, MAX_PLAYER_SLOTS, SERVER_TIME_TICKS_PER_SECOND};
use std::time::Duration;

/// Authoritative world: one position per player slot plus the server clock
///
/// Positions belong to slots, not sessions, so a slot keeps its position when
/// its owner leaves and the next owner picks up from there.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    positions: [Position; MAX_PLAYER_SLOTS],
    /// 100 ns ticks since server start, never decreasing
    pub server_time: i64,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of a 1-based slot. Slot 0 and out-of-range slots have none.
    pub fn position(&self, slot: u16) -> Option<&Position> {
        let index = usize::from(slot).checked_sub(1)?;
        self.positions.get(index)
    }

    pub fn positions(&self) -> &[Position; MAX_PLAYER_SLOTS] {
        &self.positions
    }

    /// Adds `offset` to the slot's Y coordinate. Returns false for invalid slots.
    pub fn move_vertical(&mut self, slot: u16, offset: f32) -> bool {
        let Some(index) = usize::from(slot).checked_sub(1) else {
            return false;
        };
        match self.positions.get_mut(index) {
            Some(position) => {
                position.y += offset;
                true
            }
            None => false,
        }
    }

    /// Sets the clock from time elapsed since start, keeping it monotonic.
    pub fn refresh_server_time(&mut self, elapsed: Duration) -> i64 {
        let ticks = elapsed.as_nanos() / (1_000_000_000 / SERVER_TIME_TICKS_PER_SECOND as u128);
        let ticks = i64::try_from(ticks).unwrap_or(i64::MAX);
        self.server_time = self.server_time.max(ticks);
        self.server_time
    }
}
