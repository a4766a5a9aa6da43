use crate::connection::{Connection, Outgoing};
use crate::game::ClientGameState;
use log::{debug, info, warn};
use shared::{
    ClientRequest, ConnectionState, ServerPacket, DEFAULT_HANDSHAKE_REPEAT, MAX_DATAGRAM_SIZE,
    MAX_NAME_LEN,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};

pub type ClientResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Headless client driving one session over UDP
#[derive(Debug)]
pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    connection: Connection,
    game_state: ClientGameState,
    /// How long to wait for the handshake before sending Connecting again
    retry_interval: Duration,
}

impl Client {
    pub async fn new(server_addr: &str, name: &str) -> ClientResult<Self> {
        let server_addr: SocketAddr = server_addr.parse()?;
        let bind_addr = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        if name.len() > MAX_NAME_LEN || !name.is_ascii() {
            return Err(format!("name must be ASCII and at most {} bytes", MAX_NAME_LEN).into());
        }
        let socket = UdpSocket::bind(bind_addr).await?;
        debug!("Client socket bound to {}", socket.local_addr()?);

        Ok(Client {
            socket,
            server_addr,
            connection: Connection::new(name, DEFAULT_HANDSHAKE_REPEAT),
            game_state: ClientGameState::new(),
            retry_interval: Duration::from_millis(250),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    async fn send(&self, outgoing: &Outgoing) -> ClientResult<()> {
        let data = outgoing.packet.encode()?;
        for _ in 0..outgoing.repeat {
            self.socket.send_to(&data, self.server_addr).await?;
        }
        Ok(())
    }

    /// Runs the handshake, resending Connecting until the server lets us in.
    pub async fn connect(&mut self, deadline: Duration) -> ClientResult<()> {
        let give_up = Instant::now() + deadline;
        info!("Connecting to {} as {}", self.server_addr, self.connection.name());

        while let Some(hello) = self.connection.connect() {
            if Instant::now() >= give_up {
                return Err(format!("no answer from {} within {:?}", self.server_addr, deadline).into());
            }
            self.send(&hello).await?;
            let wait_until = (Instant::now() + self.retry_interval).min(give_up);
            self.receive_until(wait_until, true).await?;
        }

        Ok(())
    }

    /// Sends a request. Returns false without sending unless connected.
    ///
    /// Leaving a slot is never confirmed by the server, so the own slot is
    /// dropped as soon as a JoinSpectators or Disconnect request goes out.
    pub async fn send_request(&mut self, request: ClientRequest) -> ClientResult<bool> {
        let Some(outgoing) = self.connection.request(request) else {
            return Ok(false);
        };
        self.send(&outgoing).await?;
        if matches!(request, ClientRequest::JoinSpectators | ClientRequest::Disconnect) {
            self.game_state.release_slot();
        }
        if request == ClientRequest::Disconnect {
            self.connection.disconnect();
        }
        Ok(true)
    }

    /// Receives and applies server packets for `wait`, returning how many were applied.
    pub async fn poll(&mut self, wait: Duration) -> ClientResult<usize> {
        self.receive_until(Instant::now() + wait, false).await
    }

    pub async fn disconnect(&mut self) -> ClientResult<()> {
        self.game_state.release_slot();
        if let Some(outgoing) = self.connection.disconnect() {
            self.send(&outgoing).await?;
            info!("Disconnected from {}", self.server_addr);
        }
        Ok(())
    }

    async fn receive_until(&mut self, deadline: Instant, stop_when_connected: bool) -> ClientResult<usize> {
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        let mut applied = 0;

        while !(stop_when_connected && self.connection.is_connected()) {
            let (len, from) = match timeout_at(deadline, self.socket.recv_from(&mut buffer)).await {
                Ok(received) => received?,
                Err(_) => break,
            };
            if from != self.server_addr {
                debug!("Ignoring datagram from {}", from);
                continue;
            }

            match ServerPacket::decode(&buffer[..len]) {
                Ok(packet) => {
                    if self.handle_packet(&packet).await? {
                        applied += 1;
                    }
                }
                Err(e) => warn!("Dropping malformed packet from server: {}", e),
            }
        }

        Ok(applied)
    }

    async fn handle_packet(&mut self, packet: &ServerPacket) -> ClientResult<bool> {
        if !self.game_state.apply_server_packet(packet) {
            return Ok(false);
        }
        if let Some(outgoing) = self.connection.handle_packet(packet) {
            self.send(&outgoing).await?;
        }
        Ok(true)
    }
}
