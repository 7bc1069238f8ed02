//! Nova signaling relay: a WebSocket server brokering WebRTC connection
//! setup between exactly two peers per room. The relay never inspects the
//! negotiation payloads it forwards.

pub mod signaling;
