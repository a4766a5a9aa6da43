//! # Session Client Library
//!
//! Headless client for the session server. It speaks the packet formats from
//! the `shared` crate and is used both by the `client` bot binary and by the
//! workspace integration tests.
//!
//! ## Module Organization
//!
//! ### Connection Module (`connection`)
//! The client side of the handshake as a pure state machine:
//! - `Connecting` is sent until the server answers with Verification
//! - each server Verification is answered with a burst of our own
//! - the first JoinGame or World packet marks the session connected
//!
//! ### Game Module (`game`)
//! The latest world snapshot, roster and own slot. Packets older than the
//! newest one applied are discarded so the view never moves backward.
//!
//! ### Network Module (`network`)
//! Tokio UDP socket handling: handshake retries, request sending and polling.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use shared::ClientRequest;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut client = Client::new("127.0.0.1:5000", "alice").await?;
//!     client.connect(Duration::from_secs(5)).await?;
//!
//!     client.send_request(ClientRequest::JoinGame).await?;
//!     client.poll(Duration::from_millis(100)).await?;
//!     println!("Playing in slot {}", client.game_state().player_slot);
//!
//!     client.disconnect().await
//! }
//! ```

pub mod connection;
pub mod game;
pub mod network;
