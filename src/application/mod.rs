//! Application layer: the Connection Registry (B), Action Dispatcher (C),
//! Domain Handlers (D), and the Session Lifecycle & Payment Bridge (E).

pub mod dispatcher;
pub mod handlers;
pub mod registry;
pub mod services;

pub use registry::{ConnectionRegistry, SharedConnectionRegistry, Transport};
pub use services::payment_bridge::PaymentBridge;
