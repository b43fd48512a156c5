//! The OCPP WebSocket transport (Transport Gateway, component A).

pub mod gateway;

pub use gateway::{router, GatewayState};
