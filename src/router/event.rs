//! Signaling event surface
//!
//! Wire frames are JSON text of the form `{"event": <name>, "data":
//! <payload>}`. Event names and payload field names are contractual:
//! the browser client matches on them verbatim, including the
//! `incomming:call` spelling. Offer and answer payloads are opaque
//! `serde_json::Value`s and are never inspected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{ConnId, RoomId};

/// Events received from a client connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Request a collision-free room id
    #[serde(rename = "generate:room")]
    GenerateRoom {},

    /// Join (or lazily create) a room
    #[serde(rename = "room:join")]
    RoomJoin { email: String, room: RoomId },

    /// Start a call: forward an offer to the peer connection
    #[serde(rename = "user:call")]
    UserCall { to: ConnId, offer: Value },

    /// Answer a call
    #[serde(rename = "call:accepted")]
    CallAccepted { to: ConnId, ans: Value },

    /// Renegotiation offer
    #[serde(rename = "peer:nego:needed")]
    NegoNeeded { to: ConnId, offer: Value },

    /// Renegotiation answer
    #[serde(rename = "peer:nego:done")]
    NegoDone { to: ConnId, ans: Value },

    /// Occupancy query
    #[serde(rename = "room:info")]
    RoomInfo { room: RoomId },
}

/// Events emitted to client connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Reply to `generate:room`
    #[serde(rename = "room:generated", rename_all = "camelCase")]
    RoomGenerated { room_id: RoomId },

    /// Join confirmation, also reused for the duplicate-join case
    #[serde(rename = "room:join", rename_all = "camelCase")]
    RoomJoin {
        email: String,
        room: RoomId,
        current_users: usize,
        max_users: usize,
    },

    /// Join rejection against a room at capacity
    #[serde(rename = "room:full", rename_all = "camelCase")]
    RoomFull {
        message: String,
        current_users: usize,
        max_users: usize,
    },

    /// Occupancy broadcast to every occupant on join or leave
    #[serde(rename = "room:status:update", rename_all = "camelCase")]
    RoomStatusUpdate {
        current_users: usize,
        max_users: usize,
        room_id: RoomId,
    },

    /// Second occupant arrived; sent to the pre-existing occupant only
    #[serde(rename = "user:joined")]
    UserJoined { email: String, id: ConnId },

    /// Peer left or disconnected; sent to the remaining occupant only
    #[serde(rename = "user:left")]
    UserLeft { email: String, id: ConnId },

    /// Relayed call offer; misspelling is part of the client contract
    #[serde(rename = "incomming:call")]
    IncomingCall { from: ConnId, offer: Value },

    /// Relayed call answer
    #[serde(rename = "call:accepted")]
    CallAccepted { from: ConnId, ans: Value },

    /// Relayed renegotiation offer
    #[serde(rename = "peer:nego:needed")]
    NegoNeeded { from: ConnId, offer: Value },

    /// Relayed renegotiation answer
    #[serde(rename = "peer:nego:final")]
    NegoFinal { from: ConnId, ans: Value },

    /// Reply to `room:info`; absent rooms report zero occupancy
    #[serde(rename = "room:info", rename_all = "camelCase")]
    RoomInfo {
        room: RoomId,
        current_users: usize,
        max_users: usize,
        is_full: bool,
        can_join: bool,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_client_event_wire_names() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "room:join",
            "data": { "email": "a@x.com", "room": "ABC123XY" }
        }))
        .unwrap();

        assert_eq!(
            event,
            ClientEvent::RoomJoin {
                email: "a@x.com".into(),
                room: "ABC123XY".into(),
            }
        );
    }

    #[test]
    fn test_generate_room_takes_empty_payload() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "generate:room",
            "data": {}
        }))
        .unwrap();

        assert_eq!(event, ClientEvent::GenerateRoom {});
    }

    #[test]
    fn test_relay_payload_is_opaque() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "user:call",
            "data": { "to": 7, "offer": { "type": "offer", "sdp": "v=0..." } }
        }))
        .unwrap();

        match event {
            ClientEvent::UserCall { to, offer } => {
                assert_eq!(to, 7);
                assert_eq!(offer, json!({ "type": "offer", "sdp": "v=0..." }));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_join_confirmation_field_names() {
        let event = ServerEvent::RoomJoin {
            email: "a@x.com".into(),
            room: "ABC123XY".into(),
            current_users: 1,
            max_users: 2,
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "room:join",
                "data": {
                    "email": "a@x.com",
                    "room": "ABC123XY",
                    "currentUsers": 1,
                    "maxUsers": 2
                }
            })
        );
    }

    #[test]
    fn test_status_update_field_names() {
        let event = ServerEvent::RoomStatusUpdate {
            current_users: 2,
            max_users: 2,
            room_id: "ABC123XY".into(),
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "room:status:update",
                "data": { "currentUsers": 2, "maxUsers": 2, "roomId": "ABC123XY" }
            })
        );
    }

    #[test]
    fn test_incoming_call_keeps_contract_spelling() {
        let event = ServerEvent::IncomingCall {
            from: 3,
            offer: json!({ "sdp": "v=0..." }),
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "incomming:call",
                "data": { "from": 3, "offer": { "sdp": "v=0..." } }
            })
        );
    }

    #[test]
    fn test_nego_done_maps_to_nego_final() {
        let event = ServerEvent::NegoFinal {
            from: 5,
            ans: json!({ "type": "answer" }),
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "peer:nego:final",
                "data": { "from": 5, "ans": { "type": "answer" } }
            })
        );
    }

    #[test]
    fn test_room_info_field_names() {
        let event = ServerEvent::RoomInfo {
            room: "NOPE".into(),
            current_users: 0,
            max_users: 2,
            is_full: false,
            can_join: true,
        };

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "room:info",
                "data": {
                    "room": "NOPE",
                    "currentUsers": 0,
                    "maxUsers": 2,
                    "isFull": false,
                    "canJoin": true
                }
            })
        );
    }
}
