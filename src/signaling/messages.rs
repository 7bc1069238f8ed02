use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{ConnId, RoomName};

/// Messages sent from client to server. Fields are optional at the wire
/// level; [`validate`] decides what reaches the dispatcher.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join a room (default room when omitted)
    #[serde(rename = "join")]
    Join {
        #[serde(default)]
        room: Option<String>,
    },

    /// Leave a room
    #[serde(rename = "leave")]
    Leave {
        #[serde(default)]
        room: Option<String>,
    },

    /// Session description offer, relayed opaquely
    #[serde(rename = "offer")]
    Offer {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        sdp: Option<Value>,
    },

    /// Session description answer, relayed opaquely
    #[serde(rename = "answer")]
    Answer {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        sdp: Option<Value>,
    },

    /// ICE candidate, relayed opaquely
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        candidate: Option<Value>,
    },
}

/// Messages sent from server to client
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Join acknowledged; `sid` tells the client its own connection id
    #[serde(rename = "joined")]
    Joined {
        room: RoomName,
        count: usize,
        sid: ConnId,
    },

    /// Room already has two members
    #[serde(rename = "full")]
    Full { room: RoomName },

    /// Both members present; the named initiator starts the handshake
    #[serde(rename = "ready")]
    Ready { room: RoomName, initiator: ConnId },

    /// The other member left or disconnected
    #[serde(rename = "peer-left")]
    PeerLeft { room: RoomName },

    /// Relayed offer (room target stripped)
    #[serde(rename = "offer")]
    Offer { sdp: Value },

    /// Relayed answer
    #[serde(rename = "answer")]
    Answer { sdp: Value },

    /// Relayed ICE candidate
    #[serde(rename = "ice-candidate")]
    IceCandidate { candidate: Value },
}

/// A validated inbound event, ready for the dispatcher.
#[derive(Debug)]
pub(crate) enum ClientEvent {
    Join { room: RoomName },
    Leave { room: RoomName },
    Relay { room: RoomName, payload: RelayPayload },
}

/// Opaque negotiation payload carried by a relay event.
#[derive(Debug)]
pub(crate) enum RelayPayload {
    Offer(Value),
    Answer(Value),
    Candidate(Value),
}

impl RelayPayload {
    /// Relayed events keep their inbound event type.
    pub(crate) fn into_server_message(self) -> ServerMessage {
        match self {
            RelayPayload::Offer(sdp) => ServerMessage::Offer { sdp },
            RelayPayload::Answer(sdp) => ServerMessage::Answer { sdp },
            RelayPayload::Candidate(candidate) => ServerMessage::IceCandidate { candidate },
        }
    }
}

/// Single validation point for the permissive silent-drop policy: `None`
/// means the event is discarded without notifying the sender. Only `join`
/// substitutes the default room; every other event requires an explicit
/// room, and relay events additionally require their payload.
pub(crate) fn validate(msg: ClientMessage) -> Option<ClientEvent> {
    match msg {
        ClientMessage::Join { room } => Some(ClientEvent::Join {
            room: RoomName::or_default(room),
        }),
        ClientMessage::Leave { room } => Some(ClientEvent::Leave {
            room: required_room(room)?,
        }),
        ClientMessage::Offer { room, sdp } => Some(ClientEvent::Relay {
            room: required_room(room)?,
            payload: RelayPayload::Offer(sdp?),
        }),
        ClientMessage::Answer { room, sdp } => Some(ClientEvent::Relay {
            room: required_room(room)?,
            payload: RelayPayload::Answer(sdp?),
        }),
        ClientMessage::IceCandidate { room, candidate } => Some(ClientEvent::Relay {
            room: required_room(room)?,
            payload: RelayPayload::Candidate(candidate?),
        }),
    }
}

fn required_room(raw: Option<String>) -> Option<RoomName> {
    match raw {
        Some(s) if !s.is_empty() => Some(RoomName::new(s)),
        _ => None,
    }
}
