//! WebSocket server binding
//!
//! Accepts client connections, feeds decoded events to the router, and
//! delivers its addressed output. All room and relay semantics live in
//! [`crate::registry`] and [`crate::router`]; this layer only does I/O.

pub mod config;
pub mod connection;
pub mod listener;
pub mod peers;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::RelayServer;
pub use peers::{EventSender, PeerMap};
