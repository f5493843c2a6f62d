//! Room registry implementation
//!
//! The central registry that tracks which connections occupy which rooms,
//! enforces the two-occupant capacity, and evicts rooms the moment they
//! drain.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use tokio::sync::RwLock;

use super::room::{
    ConnId, Departure, JoinOutcome, Membership, RoomId, RoomStatus, GENERATED_ID_LEN,
    ROOM_CAPACITY,
};

/// Charset for generated room ids (base36, uppercased).
const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The membership tables, two views over the same facts
///
/// Every connection in a room's occupant set has a matching `members`
/// entry naming that room, and vice versa. All mutation goes through
/// methods that update both views together.
#[derive(Default)]
struct Tables {
    /// Room key to occupant set
    occupants: HashMap<RoomId, HashSet<ConnId>>,
    /// Connection to its room and declared identity
    members: HashMap<ConnId, Membership>,
}

impl Tables {
    /// Remove a connection from both views, evicting the room if it drains.
    fn remove_member(&mut self, conn: ConnId) -> Option<Departure> {
        let membership = self.members.remove(&conn)?;

        let mut remaining = Vec::new();
        let emptied = match self.occupants.get_mut(&membership.room) {
            Some(set) => {
                set.remove(&conn);
                remaining.extend(set.iter().copied());
                set.is_empty()
            }
            None => false,
        };
        if emptied {
            self.occupants.remove(&membership.room);
        }

        Some(Departure {
            room: membership.room,
            email: membership.email,
            remaining,
        })
    }
}

/// Central registry mapping rooms to their occupants
///
/// Thread-safe via an internal `RwLock`; every public operation takes the
/// lock once and completes atomically, so a join and a concurrent
/// disconnect can never interleave mid-update.
pub struct RoomRegistry {
    tables: RwLock<Tables>,
}

impl RoomRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Produce a room id that is not a currently-live room key
    ///
    /// Collisions in an 8-character base36 space are unlikely, but the
    /// contract is guaranteed uniqueness, so generation retries until the
    /// id is free.
    pub async fn generate_room_id(&self) -> RoomId {
        let tables = self.tables.read().await;
        let mut rng = rand::thread_rng();

        loop {
            let id: RoomId = (0..GENERATED_ID_LEN)
                .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
                .collect();

            if !tables.occupants.contains_key(&id) {
                return id;
            }
        }
    }

    /// Add a connection to a room
    ///
    /// Creates the room lazily on first join. A repeat join by a connection
    /// already in the room is idempotent. A join against a full room
    /// mutates nothing. A connection occupies at most one room, so joining
    /// a new room vacates the old one; the vacated departure is returned so
    /// the caller can notify that room's remaining occupant.
    pub async fn join(&self, conn: ConnId, room: &str, email: &str) -> JoinOutcome {
        let mut tables = self.tables.write().await;

        if let Some(set) = tables.occupants.get(room) {
            if set.contains(&conn) {
                tracing::debug!(room = %room, conn, "Duplicate join, no change");
                return JoinOutcome::AlreadyJoined {
                    occupants: set.len(),
                };
            }
            if set.len() >= ROOM_CAPACITY {
                tracing::info!(
                    room = %room,
                    conn,
                    email = %email,
                    occupants = set.len(),
                    "Join rejected, room full"
                );
                return JoinOutcome::Full {
                    occupants: set.len(),
                };
            }
        }

        let vacated = tables.remove_member(conn);
        if let Some(ref dep) = vacated {
            tracing::info!(
                old_room = %dep.room,
                new_room = %room,
                conn,
                "Connection moved between rooms"
            );
        }

        let created = !tables.occupants.contains_key(room);
        let set = tables.occupants.entry(room.to_string()).or_default();
        let peers: Vec<ConnId> = set.iter().copied().collect();
        set.insert(conn);
        let occupants = set.len();

        tables.members.insert(
            conn,
            Membership {
                room: room.to_string(),
                email: email.to_string(),
            },
        );

        if created {
            tracing::info!(room = %room, "Room created");
        }
        tracing::info!(
            room = %room,
            conn,
            email = %email,
            occupants,
            capacity = ROOM_CAPACITY,
            "Participant joined"
        );

        JoinOutcome::Joined {
            occupants,
            peers,
            vacated,
        }
    }

    /// Remove a connection from whatever room it occupies
    ///
    /// Returns `None` when the connection was in no room. An emptied room
    /// is deleted, not retained.
    pub async fn leave(&self, conn: ConnId) -> Option<Departure> {
        let mut tables = self.tables.write().await;
        let departure = tables.remove_member(conn)?;

        if departure.remaining.is_empty() {
            tracing::info!(room = %departure.room, conn, "Participant left, room deleted (empty)");
        } else {
            tracing::info!(
                room = %departure.room,
                conn,
                occupants = departure.remaining.len(),
                capacity = ROOM_CAPACITY,
                "Participant left"
            );
        }

        Some(departure)
    }

    /// Occupancy snapshot of a room; an absent room reports zero occupants.
    pub async fn occupancy(&self, room: &str) -> RoomStatus {
        let tables = self.tables.read().await;
        let count = tables.occupants.get(room).map_or(0, HashSet::len);
        RoomStatus::for_count(count)
    }

    /// Occupants of a room other than `excluding` (broadcast addressing)
    pub async fn peers_of(&self, room: &str, excluding: ConnId) -> Vec<ConnId> {
        let tables = self.tables.read().await;
        tables
            .occupants
            .get(room)
            .map(|set| set.iter().copied().filter(|c| *c != excluding).collect())
            .unwrap_or_default()
    }

    /// Current membership of a connection, if any
    pub async fn membership(&self, conn: ConnId) -> Option<Membership> {
        self.tables.read().await.members.get(&conn).cloned()
    }

    /// Number of live rooms
    pub async fn room_count(&self) -> usize {
        self.tables.read().await.occupants.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::room::RoomPhase;

    #[tokio::test]
    async fn test_first_join_creates_room() {
        let registry = RoomRegistry::new();

        let outcome = registry.join(1, "ABC123XY", "a@x.com").await;
        assert_eq!(
            outcome,
            JoinOutcome::Joined {
                occupants: 1,
                peers: vec![],
                vacated: None,
            }
        );
        assert_eq!(registry.room_count().await, 1);

        let status = registry.occupancy("ABC123XY").await;
        assert_eq!(status.current_users, 1);
        assert!(status.can_join);
        assert!(!status.is_full);
        assert_eq!(status.phase, Some(RoomPhase::Waiting));
    }

    #[tokio::test]
    async fn test_second_join_pairs_room() {
        let registry = RoomRegistry::new();
        registry.join(1, "ABC123XY", "a@x.com").await;

        let outcome = registry.join(2, "ABC123XY", "b@y.com").await;
        assert_eq!(
            outcome,
            JoinOutcome::Joined {
                occupants: 2,
                peers: vec![1],
                vacated: None,
            }
        );

        let status = registry.occupancy("ABC123XY").await;
        assert_eq!(status.current_users, 2);
        assert!(status.is_full);
        assert!(!status.can_join);
        assert_eq!(status.phase, Some(RoomPhase::Paired));
    }

    #[tokio::test]
    async fn test_full_room_rejects_without_mutation() {
        let registry = RoomRegistry::new();
        registry.join(1, "ROOM", "a@x.com").await;
        registry.join(2, "ROOM", "b@y.com").await;

        // Retried rejections never mutate state.
        for _ in 0..5 {
            let outcome = registry.join(3, "ROOM", "c@z.com").await;
            assert_eq!(outcome, JoinOutcome::Full { occupants: 2 });
        }

        assert_eq!(registry.occupancy("ROOM").await.current_users, 2);
        assert!(registry.membership(3).await.is_none());
        assert_eq!(registry.membership(1).await.unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn test_duplicate_join_is_idempotent() {
        let registry = RoomRegistry::new();
        registry.join(1, "ROOM", "a@x.com").await;

        for _ in 0..5 {
            let outcome = registry.join(1, "ROOM", "a@x.com").await;
            assert_eq!(outcome, JoinOutcome::AlreadyJoined { occupants: 1 });
        }

        assert_eq!(registry.occupancy("ROOM").await.current_users, 1);
        assert_eq!(registry.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_leave_keeps_room_until_drained() {
        let registry = RoomRegistry::new();
        registry.join(1, "ROOM", "a@x.com").await;
        registry.join(2, "ROOM", "b@y.com").await;

        let departure = registry.leave(2).await.unwrap();
        assert_eq!(departure.room, "ROOM");
        assert_eq!(departure.email, "b@y.com");
        assert_eq!(departure.remaining, vec![1]);

        // Room persists with the other occupant.
        assert_eq!(registry.room_count().await, 1);
        assert_eq!(registry.occupancy("ROOM").await.current_users, 1);

        let departure = registry.leave(1).await.unwrap();
        assert!(departure.remaining.is_empty());

        // Drained room is deleted, not retained empty.
        assert_eq!(registry.room_count().await, 0);
        assert_eq!(registry.occupancy("ROOM").await.current_users, 0);
    }

    #[tokio::test]
    async fn test_leave_unknown_connection_is_noop() {
        let registry = RoomRegistry::new();
        assert!(registry.leave(42).await.is_none());
    }

    #[tokio::test]
    async fn test_join_moves_connection_between_rooms() {
        let registry = RoomRegistry::new();
        registry.join(1, "OLD", "a@x.com").await;
        registry.join(2, "OLD", "b@y.com").await;

        let outcome = registry.join(2, "NEW", "b@y.com").await;
        match outcome {
            JoinOutcome::Joined {
                vacated: Some(dep), ..
            } => {
                assert_eq!(dep.room, "OLD");
                assert_eq!(dep.remaining, vec![1]);
            }
            other => panic!("expected move with vacated departure, got {:?}", other),
        }

        assert_eq!(registry.occupancy("OLD").await.current_users, 1);
        assert_eq!(registry.occupancy("NEW").await.current_users, 1);
        assert_eq!(registry.membership(2).await.unwrap().room, "NEW");
    }

    #[tokio::test]
    async fn test_peers_of_excludes_caller() {
        let registry = RoomRegistry::new();
        registry.join(1, "ROOM", "a@x.com").await;
        registry.join(2, "ROOM", "b@y.com").await;

        assert_eq!(registry.peers_of("ROOM", 1).await, vec![2]);
        assert_eq!(registry.peers_of("ROOM", 2).await, vec![1]);
        assert!(registry.peers_of("ABSENT", 1).await.is_empty());
    }

    #[tokio::test]
    async fn test_absent_room_reports_zero() {
        let registry = RoomRegistry::new();
        let status = registry.occupancy("NOPE").await;

        assert_eq!(status.current_users, 0);
        assert!(!status.is_full);
        assert!(status.can_join);
        assert_eq!(status.phase, None);
    }

    #[tokio::test]
    async fn test_generated_id_format() {
        let registry = RoomRegistry::new();

        for _ in 0..100 {
            let id = registry.generate_room_id().await;
            assert_eq!(id.len(), GENERATED_ID_LEN);
            assert!(id.bytes().all(|b| ID_CHARSET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn test_generated_id_avoids_live_rooms() {
        let registry = RoomRegistry::new();

        // Seed many live rooms, then generate repeatedly: no generated id
        // may equal a live key.
        for i in 0..500u64 {
            registry
                .join(i, &format!("SEED{:04}", i), "seed@x.com")
                .await;
        }
        assert_eq!(registry.room_count().await, 500);

        for _ in 0..200 {
            let id = registry.generate_room_id().await;
            assert_eq!(registry.occupancy(&id).await.current_users, 0);
        }
    }
}
