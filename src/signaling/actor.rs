use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::messages::{ClientEvent, ServerMessage};
use super::registry::ConnectionRegistry;
use super::rooms::{JoinOutcome, ROOM_CAPACITY, RoomTable};
use super::types::{ConnId, OutboundMessage, RoomName, SignalError};

const COMMAND_QUEUE_DEPTH: usize = 1024;

/// Commands sent to the dispatcher actor
pub(crate) enum DispatchCommand {
    Connect {
        conn: ConnId,
        tx: mpsc::UnboundedSender<OutboundMessage>,
    },
    Event {
        conn: ConnId,
        event: ClientEvent,
    },
    Disconnect {
        conn: ConnId,
    },
    MemberCount {
        room: RoomName,
        reply: oneshot::Sender<usize>,
    },
}

/// Owns the room table and connection registry. Commands are processed one
/// at a time, so each event's read-modify-emit sequence is atomic with
/// respect to every other connection; in particular `ready` is emitted
/// inside the same step that moved the member count to two.
pub(crate) async fn dispatcher_actor(mut rx: mpsc::Receiver<DispatchCommand>) {
    let mut rooms = RoomTable::new();
    let mut registry = ConnectionRegistry::new();

    while let Some(cmd) = rx.recv().await {
        match cmd {
            DispatchCommand::Connect { conn, tx } => {
                registry.insert(conn, tx);
                info!("Connection registered: {} ({} live)", conn, registry.len());
            }

            DispatchCommand::Event { conn, event } => {
                handle_event(&mut rooms, &registry, conn, event);
            }

            DispatchCommand::Disconnect { conn } => {
                registry.remove(conn);
                for room in rooms.remove_from_all(conn) {
                    let remaining = rooms.members(&room);
                    if remaining.is_empty() {
                        info!("Room {} removed (empty)", room);
                    }
                    registry.broadcast(&remaining, None, &ServerMessage::PeerLeft { room });
                }
                info!("Connection closed: {}", conn);
            }

            DispatchCommand::MemberCount { room, reply } => {
                let _ = reply.send(rooms.member_count(&room));
            }
        }
    }
}

fn handle_event(
    rooms: &mut RoomTable,
    registry: &ConnectionRegistry,
    conn: ConnId,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Join { room } => match rooms.join(&room, conn) {
            JoinOutcome::Full => {
                debug!("Join rejected, room {} is full", room);
                registry.send(conn, &ServerMessage::Full { room });
            }
            JoinOutcome::Admitted { count } => {
                info!("Peer {} joined room {} ({}/{})", conn, room, count, ROOM_CAPACITY);
                registry.send(conn, &ServerMessage::Joined {
                    room: room.clone(),
                    count,
                    sid: conn,
                });
                if count == ROOM_CAPACITY {
                    // second joiner starts the handshake
                    registry.broadcast(&rooms.members(&room), None, &ServerMessage::Ready {
                        room: room.clone(),
                        initiator: conn,
                    });
                }
            }
        },

        ClientEvent::Leave { room } => {
            if rooms.leave(&room, conn) {
                info!("Peer {} left room {}", conn, room);
            }
            // notify whoever is still in the room, member or not
            let remaining = rooms.members(&room);
            registry.broadcast(&remaining, None, &ServerMessage::PeerLeft { room });
        }

        ClientEvent::Relay { room, payload } => {
            let members = rooms.members(&room);
            registry.broadcast(&members, Some(conn), &payload.into_server_message());
        }
    }
}

/// Handle to communicate with the dispatcher actor
#[derive(Clone)]
pub struct DispatcherHandle {
    pub(crate) tx: mpsc::Sender<DispatchCommand>,
}

impl DispatcherHandle {
    /// Spawn a fresh dispatcher and return its handle.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<DispatchCommand>(COMMAND_QUEUE_DEPTH);
        tokio::spawn(dispatcher_actor(rx));
        Self { tx }
    }

    /// Register a new transport connection and its outbound channel.
    pub async fn connect(&self, conn: ConnId, tx: mpsc::UnboundedSender<OutboundMessage>) {
        let _ = self.tx.send(DispatchCommand::Connect { conn, tx }).await;
    }

    /// Tear down a connection: removes it from every room and notifies any
    /// remaining peers.
    pub async fn disconnect(&self, conn: ConnId) {
        let _ = self.tx.send(DispatchCommand::Disconnect { conn }).await;
    }

    pub(crate) async fn dispatch(&self, conn: ConnId, event: ClientEvent) {
        let _ = self.tx.send(DispatchCommand::Event { conn, event }).await;
    }

    /// Current member count of a room (0 if absent).
    pub async fn member_count(&self, room: RoomName) -> Result<usize, SignalError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self
            .tx
            .send(DispatchCommand::MemberCount {
                room,
                reply: reply_tx,
            })
            .await;
        reply_rx
            .await
            .map_err(|_| SignalError::Internal("actor channel closed".to_string()))
    }
}
