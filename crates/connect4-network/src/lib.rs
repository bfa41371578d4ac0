//! Network layer of the Connect 4 client.
//!
//! This crate owns the TCP session with the game server. A [`GameClient`]
//! runs two background tasks:
//!
//! - the **liveness monitor**, which connects, sends the nick and probes the
//!   server with `PING`, reconnecting when a probe goes unanswered;
//! - the **dispatcher**, which reads frames, validates them and applies them
//!   to the [`Session`](connect4_session::Session).
//!
//! Notifications reach the caller as [`ClientEvent`]s on a single channel, in
//! the order the server sent the underlying messages.
//!
//! # Example
//!
//! ```no_run
//! use connect4_network::{ClientConfig, ClientEvent, GameClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, mut events) = GameClient::connect(ClientConfig::default(), "127.0.0.1", "53333", "alice")?;
//!
//! while let Some(event) = events.recv().await {
//!     if let ClientEvent::ChallengeReceived { from } = &event {
//!         client.accept_challenge(from.as_str()).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connection;
mod dispatcher;
mod heartbeat;

pub use client::GameClient;
pub use config::{BackoffConfig, ClientConfig, ViolationPolicy};
pub use connection::{FrameReader, FrameWriter, Link, open};
pub use connect4_session::{ClientEvent, SessionState};
