//! WebSocket signaling relay for two-peer P2P negotiation

mod actor;
mod messages;
mod registry;
mod rooms;
mod server;
mod types;

pub use actor::DispatcherHandle;
pub use messages::{ClientMessage, ServerMessage};
pub use rooms::{JoinOutcome, ROOM_CAPACITY, RoomTable};
pub use server::{DEFAULT_SIGNALING_PORT, SignalingServer};
pub use types::{ConnId, DEFAULT_ROOM, OutboundMessage, RoomName, SignalError};
