//! Server network layer: UDP transport and the single-owner event loop

use crate::broadcaster::broadcast;
use crate::config::ServerConfig;
use crate::dispatcher::dispatch;
use crate::state::ServerState;
use log::{debug, error, info, warn};
use shared::MAX_DATAGRAM_SIZE;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { data: Vec<u8>, addr: SocketAddr },
    Shutdown,
}

/// Outbound work for the sender task. Bytes are encoded once and shared.
#[derive(Debug, Clone)]
pub enum GameMessage {
    /// Send `data` to one address `repeat` times
    SendPacket {
        data: Arc<[u8]>,
        addr: SocketAddr,
        repeat: u32,
    },
    /// Send `data` once to each recipient
    BroadcastPacket {
        data: Arc<[u8]>,
        recipients: Vec<SocketAddr>,
    },
}

/// Cloneable handle for stopping a running [`Server`]
#[derive(Debug, Clone)]
pub struct ServerHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ServerHandle {
    /// Asks the server loop to stop. Returns false if it already has.
    pub fn shutdown(&self) -> bool {
        self.server_tx.send(ServerMessage::Shutdown).is_ok()
    }
}

/// Session server: owns the socket and all shared state
pub struct Server {
    socket: Arc<UdpSocket>,
    state: ServerState,
    tick_duration: Duration,
    started_at: Instant,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let socket = Arc::new(UdpSocket::bind(config.bind_addr()).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            state: ServerState::new(&config),
            tick_duration: config.tick_duration,
            started_at: Instant::now(),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let message = ServerMessage::PacketReceived {
                            data: buffer[..len].to_vec(),
                            addr,
                        };
                        if server_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Spawns task that processes outgoing packet queue until it is closed
    fn spawn_network_sender(
        &self,
        mut game_rx: mpsc::UnboundedReceiver<GameMessage>,
    ) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                deliver(&socket, &message).await;
            }
        })
    }

    /// Main server loop: the only place `ServerState` is touched
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (game_tx, game_rx) = mpsc::unbounded_channel();
        let receiver = self.spawn_network_receiver();
        let sender = self.spawn_network_sender(game_rx);

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks: u64 = 0;

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { data, addr }) => {
                            if let Some(reply) = dispatch(&mut self.state, &data, addr) {
                                queue(&game_tx, reply);
                            }
                        }
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    if let Some(snapshot) = broadcast(&mut self.state, self.started_at.elapsed()) {
                        queue(&game_tx, snapshot);
                    }

                    ticks += 1;
                    if ticks % 300 == 0 {
                        debug!(
                            "Tick {}: {} sessions, {} connected",
                            ticks,
                            self.state.sessions.len(),
                            self.state.sessions.connected_addrs().len()
                        );
                    }
                },
            }
        }

        receiver.abort();
        drop(game_tx);
        if let Err(e) = sender.await {
            error!("Sender task failed: {}", e);
        }

        Ok(())
    }
}

fn queue(game_tx: &mpsc::UnboundedSender<GameMessage>, message: GameMessage) {
    if let Err(e) = game_tx.send(message) {
        error!("Failed to queue outbound packet: {}", e);
    }
}

/// Performs the sends for one outbound message, returning how many failed.
///
/// A failing recipient is logged and skipped; the rest still get the packet.
pub async fn deliver(socket: &UdpSocket, message: &GameMessage) -> usize {
    let mut failures = 0;

    match message {
        GameMessage::SendPacket { data, addr, repeat } => {
            for _ in 0..*repeat {
                if let Err(e) = socket.send_to(data, *addr).await {
                    error!("Failed to send packet to {}: {}", addr, e);
                    failures += 1;
                }
            }
        }
        GameMessage::BroadcastPacket { data, recipients } => {
            for addr in recipients {
                if let Err(e) = socket.send_to(data, *addr).await {
                    error!("Failed to send world state to {}: {}", addr, e);
                    failures += 1;
                }
            }
        }
    }

    failures
}
