use crate::config::ServerConfig;
use crate::session::SessionTable;
use crate::world::WorldState;

/// Everything the receive path and the broadcast tick mutate
///
/// Owned by exactly one task; handlers borrow it explicitly.
#[derive(Debug)]
pub struct ServerState {
    pub sessions: SessionTable,
    pub world: WorldState,
    pub handshake_repeat: u32,
    pub step_size: f32,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            sessions: SessionTable::new(),
            world: WorldState::new(),
            handshake_repeat: config.handshake_repeat.max(1),
            step_size: config.step_size,
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}
