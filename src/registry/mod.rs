//! Room registry for 1:1 call pairing
//!
//! The registry is the single owner of room membership state: which
//! connections occupy which room, and which declared identity each
//! connection carries. Rooms hold at most two occupants, are created
//! lazily on first join, and are deleted the instant they drain.
//!
//! # Architecture
//!
//! ```text
//!                       RoomRegistry
//!                ┌──────────────────────────┐
//!                │ occupants: Room → {Conn} │
//!                │ members:   Conn → (Room, │
//!                │                    email)│
//!                └────────────┬─────────────┘
//!                             │ join / leave / occupancy
//!                             ▼
//!                      SignalingRouter
//!            addresses peer notifications and relays
//!            by the ConnIds the registry hands back
//! ```
//!
//! The two tables are views over the same facts and are only ever mutated
//! together, under one lock, so they cannot diverge.

pub mod room;
pub mod store;

pub use room::{
    ConnId, Departure, JoinOutcome, Membership, RoomId, RoomPhase, RoomStatus,
    GENERATED_ID_LEN, ROOM_CAPACITY,
};
pub use store::RoomRegistry;
