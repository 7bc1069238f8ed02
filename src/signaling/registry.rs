use std::collections::HashMap;

use tokio::sync::mpsc;

use super::messages::ServerMessage;
use super::types::{ConnId, OutboundMessage};

/// Index from connection id to its outbound transport channel. Read-mostly;
/// the dispatcher consults it to deliver targeted and relayed events.
#[derive(Debug, Default)]
pub(crate) struct ConnectionRegistry {
    conns: HashMap<ConnId, mpsc::UnboundedSender<OutboundMessage>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            conns: HashMap::new(),
        }
    }

    pub fn insert(&mut self, conn: ConnId, tx: mpsc::UnboundedSender<OutboundMessage>) {
        self.conns.insert(conn, tx);
    }

    pub fn remove(&mut self, conn: ConnId) {
        self.conns.remove(&conn);
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    /// Best-effort targeted send; a closed channel means the peer is
    /// mid-disconnect and is ignored.
    pub fn send(&self, conn: ConnId, msg: &ServerMessage) {
        let Some(tx) = self.conns.get(&conn) else {
            return;
        };
        let _ = tx.send(encode(msg));
    }

    /// Send to every listed member except `exclude`. The message is
    /// serialized once; OutboundMessage clones are O(1).
    pub fn broadcast(&self, members: &[ConnId], exclude: Option<ConnId>, msg: &ServerMessage) {
        let encoded = encode(msg);
        for member in members {
            if Some(*member) == exclude {
                continue;
            }
            if let Some(tx) = self.conns.get(member) {
                let _ = tx.send(encoded.clone());
            }
        }
    }
}

fn encode(msg: &ServerMessage) -> OutboundMessage {
    let json =
        serde_json::to_string(msg).expect("ServerMessage serialization should never fail");
    OutboundMessage::from(json)
}
