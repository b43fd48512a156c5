//! Application services: currently the Payment Bridge (component E) and
//! its Stripe-facing outbound client.

pub mod payment_bridge;
pub mod stripe_client;

pub use payment_bridge::PaymentBridge;
pub use stripe_client::{CheckoutSession, PaymentProviderClient, PaymentProviderError, StripeClient};
