//! Signaling router
//!
//! Consumes connection-identified client events, mutates the room
//! registry, and emits outbound events addressed to specific connection
//! ids. The router performs no I/O: delivery (and dropping events whose
//! target has disconnected) is the transport layer's job, which keeps the
//! whole state machine unit-testable without a live socket.
//!
//! Each handler runs to completion against the registry before the next
//! event for the same room can observe its effects; a disconnect fully
//! unwinds a connection's membership before any later event referencing
//! it is processed.

pub mod event;

pub use event::{ClientEvent, ServerEvent};

use crate::registry::{ConnId, Departure, JoinOutcome, RoomRegistry, ROOM_CAPACITY};

/// Rejection text sent with `room:full`.
const ROOM_FULL_MESSAGE: &str = "Room is full. Maximum 2 users allowed.";

/// An outbound event addressed to one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// Target connection id
    pub to: ConnId,
    /// Event to deliver
    pub event: ServerEvent,
}

impl Outbound {
    fn new(to: ConnId, event: ServerEvent) -> Self {
        Self { to, event }
    }
}

/// Event dispatcher for the signaling relay
///
/// Owns the [`RoomRegistry`]; all membership mutation flows through
/// [`handle`](Self::handle) and [`disconnect`](Self::disconnect).
pub struct SignalingRouter {
    registry: RoomRegistry,
}

impl SignalingRouter {
    /// Create a router with an empty registry
    pub fn new() -> Self {
        Self {
            registry: RoomRegistry::new(),
        }
    }

    /// Read access to the registry (occupancy queries, tests)
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Handle one inbound event
    ///
    /// `conn` is the verified identity of the sending connection. Relayed
    /// events are stamped with it; a sender claimed inside the payload is
    /// never trusted.
    pub async fn handle(&self, conn: ConnId, event: ClientEvent) -> Vec<Outbound> {
        match event {
            ClientEvent::GenerateRoom {} => {
                let room_id = self.registry.generate_room_id().await;
                tracing::info!(conn, room = %room_id, "Generated room id");
                vec![Outbound::new(conn, ServerEvent::RoomGenerated { room_id })]
            }

            ClientEvent::RoomJoin { email, room } => self.handle_join(conn, email, room).await,

            ClientEvent::UserCall { to, offer } => {
                tracing::debug!(from = conn, to, "Forwarding call offer");
                vec![Outbound::new(to, ServerEvent::IncomingCall { from: conn, offer })]
            }

            ClientEvent::CallAccepted { to, ans } => {
                tracing::debug!(from = conn, to, "Forwarding call answer");
                vec![Outbound::new(to, ServerEvent::CallAccepted { from: conn, ans })]
            }

            ClientEvent::NegoNeeded { to, offer } => {
                tracing::debug!(from = conn, to, "Forwarding renegotiation offer");
                vec![Outbound::new(to, ServerEvent::NegoNeeded { from: conn, offer })]
            }

            ClientEvent::NegoDone { to, ans } => {
                tracing::debug!(from = conn, to, "Forwarding renegotiation answer");
                vec![Outbound::new(to, ServerEvent::NegoFinal { from: conn, ans })]
            }

            ClientEvent::RoomInfo { room } => {
                let status = self.registry.occupancy(&room).await;
                vec![Outbound::new(
                    conn,
                    ServerEvent::RoomInfo {
                        room,
                        current_users: status.current_users,
                        max_users: ROOM_CAPACITY,
                        is_full: status.is_full,
                        can_join: status.can_join,
                    },
                )]
            }
        }
    }

    /// Unwind a disconnected connection's room membership
    ///
    /// Must run before any later event referencing the connection; the
    /// remaining occupant (if any) is told the peer left and gets an
    /// updated occupancy broadcast.
    pub async fn disconnect(&self, conn: ConnId) -> Vec<Outbound> {
        tracing::info!(conn, "Connection disconnected");
        match self.registry.leave(conn).await {
            Some(departure) => departure_events(conn, &departure),
            None => Vec::new(),
        }
    }

    async fn handle_join(&self, conn: ConnId, email: String, room: String) -> Vec<Outbound> {
        tracing::info!(conn, email = %email, room = %room, "Join requested");

        match self.registry.join(conn, &room, &email).await {
            JoinOutcome::AlreadyJoined { occupants } => {
                // Same confirmation event as a fresh join, per the client contract.
                vec![Outbound::new(
                    conn,
                    ServerEvent::RoomJoin {
                        email,
                        room,
                        current_users: occupants,
                        max_users: ROOM_CAPACITY,
                    },
                )]
            }

            JoinOutcome::Full { occupants } => {
                vec![Outbound::new(
                    conn,
                    ServerEvent::RoomFull {
                        message: ROOM_FULL_MESSAGE.to_string(),
                        current_users: occupants,
                        max_users: ROOM_CAPACITY,
                    },
                )]
            }

            JoinOutcome::Joined {
                occupants,
                peers,
                vacated,
            } => {
                let mut out = Vec::new();

                // A join that moved the connection is a leave for the old room.
                if let Some(ref departure) = vacated {
                    out.extend(departure_events(conn, departure));
                }

                for peer in &peers {
                    out.push(Outbound::new(
                        *peer,
                        ServerEvent::UserJoined {
                            email: email.clone(),
                            id: conn,
                        },
                    ));
                }

                // Occupancy broadcast to everyone, the new occupant included.
                for target in peers.iter().copied().chain(std::iter::once(conn)) {
                    out.push(Outbound::new(
                        target,
                        ServerEvent::RoomStatusUpdate {
                            current_users: occupants,
                            max_users: ROOM_CAPACITY,
                            room_id: room.clone(),
                        },
                    ));
                }

                out.push(Outbound::new(
                    conn,
                    ServerEvent::RoomJoin {
                        email,
                        room,
                        current_users: occupants,
                        max_users: ROOM_CAPACITY,
                    },
                ));

                out
            }
        }
    }
}

impl Default for SignalingRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifications for the occupants a departure left behind.
fn departure_events(conn: ConnId, departure: &Departure) -> Vec<Outbound> {
    let mut out = Vec::new();

    for peer in &departure.remaining {
        out.push(Outbound::new(
            *peer,
            ServerEvent::UserLeft {
                email: departure.email.clone(),
                id: conn,
            },
        ));
    }
    for peer in &departure.remaining {
        out.push(Outbound::new(
            *peer,
            ServerEvent::RoomStatusUpdate {
                current_users: departure.remaining.len(),
                max_users: ROOM_CAPACITY,
                room_id: departure.room.clone(),
            },
        ));
    }

    out
}
