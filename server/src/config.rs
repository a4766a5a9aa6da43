use shared::{DEFAULT_HANDSHAKE_REPEAT, DEFAULT_PORT, DEFAULT_STEP_SIZE, DEFAULT_TICK_MS};
use std::time::Duration;

/// Runtime settings for one server instance
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Period of the world broadcast
    pub tick_duration: Duration,
    /// Copies sent of each handshake reply
    pub handshake_repeat: u32,
    /// Y offset applied per MovePosition request
    pub step_size: f32,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            tick_duration: Duration::from_millis(DEFAULT_TICK_MS),
            handshake_repeat: DEFAULT_HANDSHAKE_REPEAT,
            step_size: DEFAULT_STEP_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.tick_duration, Duration::from_millis(16));
        assert_eq!(config.handshake_repeat, 10);
        assert_eq!(config.step_size, 0.01);
    }
}
