//! Room membership types
//!
//! This module defines the per-room facts stored in the registry and the
//! result types its operations return.

/// Identifier for one live transport connection, assigned by the listener.
///
/// Owned by the transport layer; the registry only references it.
pub type ConnId = u64;

/// Opaque room key (caller-supplied or generated).
pub type RoomId = String;

/// Fixed room capacity.
///
/// This is a 1:1 calling model, not a conference: relay addressing assumes
/// exactly one counterpart per occupant, so the capacity is a constant
/// rather than a configuration knob.
pub const ROOM_CAPACITY: usize = 2;

/// Length of registry-generated room ids.
pub const GENERATED_ID_LEN: usize = 8;

/// Pairing state of a live room
///
/// A room with zero occupants does not exist, so there is no empty phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// One occupant, waiting for a counterpart
    Waiting,
    /// Two occupants, the call can proceed
    Paired,
}

/// What a connection is currently a member of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Room the connection occupies
    pub room: RoomId,
    /// Display identifier declared on join
    pub email: String,
}

/// Result of a join attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Connection was added to the room
    Joined {
        /// Occupant count after the join
        occupants: usize,
        /// Occupants that were already present (peer-joined notifications go here)
        peers: Vec<ConnId>,
        /// Membership vacated if the connection was in another room
        vacated: Option<Departure>,
    },
    /// Connection was already an occupant of this room; nothing changed
    AlreadyJoined {
        /// Current occupant count
        occupants: usize,
    },
    /// Room is at capacity; nothing changed
    Full {
        /// Current occupant count
        occupants: usize,
    },
}

/// Result of a leave or disconnect unwind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Room that was vacated
    pub room: RoomId,
    /// Display identifier of the leaving participant
    pub email: String,
    /// Occupants still in the room (empty means the room was deleted)
    pub remaining: Vec<ConnId>,
}

/// Read-only occupancy snapshot of a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomStatus {
    /// Current occupant count (0 for an absent room)
    pub current_users: usize,
    /// Whether the room is at capacity
    pub is_full: bool,
    /// Whether another connection could join
    pub can_join: bool,
    /// Pairing phase (`None` for an absent room)
    pub phase: Option<RoomPhase>,
}

impl RoomStatus {
    pub(super) fn for_count(count: usize) -> Self {
        Self {
            current_users: count,
            is_full: count >= ROOM_CAPACITY,
            can_join: count < ROOM_CAPACITY,
            phase: match count {
                0 => None,
                1 => Some(RoomPhase::Waiting),
                _ => Some(RoomPhase::Paired),
            },
        }
    }
}
