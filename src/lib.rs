//! WebRTC 1:1 signaling relay
//!
//! An in-memory signaling server that pairs exactly two browser peers in a
//! room and relays opaque session descriptions (offers, answers,
//! renegotiation messages) between them by connection identity. SDP
//! payloads pass through untouched; media negotiation itself happens in
//! the browsers' WebRTC engines.
//!
//! # Architecture
//!
//! ```text
//!   WebSocket clients
//!         │ JSON frames {"event", "data"}
//!         ▼
//!   server::RelayServer ── one task per connection
//!         │ ClientEvent
//!         ▼
//!   router::SignalingRouter ── join/leave/relay state machine
//!         │ join / leave / occupancy
//!         ▼
//!   registry::RoomRegistry ── room → occupants (capacity 2)
//! ```
//!
//! The router returns addressed events rather than writing to sockets, so
//! the whole membership and relay state machine is testable without a
//! live transport.
//!
//! # Example
//!
//! ```no_run
//! use signaling_rs::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> signaling_rs::Result<()> {
//!     let config = ServerConfig::default().bind("127.0.0.1:8000".parse().unwrap());
//!     RelayServer::new(config).run().await
//! }
//! ```

pub mod error;
pub mod registry;
pub mod router;
pub mod server;

pub use error::{Error, Result};
pub use registry::{RoomRegistry, ROOM_CAPACITY};
pub use router::SignalingRouter;
pub use server::{RelayServer, ServerConfig};
