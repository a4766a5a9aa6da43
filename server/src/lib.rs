//! # Session Server Library
//!
//! Connectionless multiplayer session server. Clients talk to it over UDP
//! using the packet formats in the `shared` crate; the server tracks one
//! session per remote address, arbitrates three player slots and their
//! positions, and broadcasts an authoritative world snapshot on a fixed tick.
//!
//! ## Architecture Design
//!
//! ### Single-Owner Event Loop
//! All mutable state lives in one [`state::ServerState`] owned by the loop in
//! [`network::Server::run`]. Inbound datagrams (forwarded by a receiver task)
//! and broadcast ticks are multiplexed with `tokio::select!` and handled one
//! at a time, so handlers never race. Encoded packets are handed to a sender
//! task, which performs the actual socket writes outside the loop.
//!
//! ### Best-Effort Protocol
//! There are no acknowledgments or retransmissions. Handshake replies are
//! sent several times in a row; every handler is idempotent or guarded by the
//! session's current state so duplicated, reordered or lost datagrams never
//! corrupt the session table or the world.
//!
//! ## Module Organization
//!
//! - [`session`]: session records keyed by address, slot ownership
//! - [`world`]: slot positions and the server clock
//! - [`dispatcher`]: the per-session handshake and request state machine
//! - [`broadcaster`]: the per-tick world snapshot
//! - [`network`]: socket tasks, outbound queue and the main loop
//! - [`config`]: runtime settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut server = Server::new(ServerConfig::default()).await?;
//!     let handle = server.handle();
//!
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         handle.shutdown();
//!     });
//!
//!     server.run().await
//! }
//! ```

pub mod broadcaster;
pub mod config;
pub mod dispatcher;
pub mod network;
pub mod session;
pub mod state;
pub mod world;
