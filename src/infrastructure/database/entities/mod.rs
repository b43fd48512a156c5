//! Database entities module

pub mod charge_point;
pub mod charge_session;
pub mod charging_intent;
pub mod location;
pub mod meter_sample;

pub use charge_point::Entity as ChargePoint;
pub use charge_session::Entity as ChargeSession;
pub use charging_intent::Entity as ChargingIntent;
pub use location::Entity as Location;
pub use meter_sample::Entity as MeterSample;
