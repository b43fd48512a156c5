//! Delivery mechanisms: the REST surface and the OCPP WebSocket transport.

pub mod http;
pub mod ws;
