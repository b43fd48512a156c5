//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_charge_points;
mod m20240101_000002_create_charging_intents;
mod m20240101_000003_create_charge_sessions;
mod m20240101_000004_create_meter_samples;
mod m20240101_000005_create_locations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_charge_points::Migration),
            Box::new(m20240101_000002_create_charging_intents::Migration),
            Box::new(m20240101_000003_create_charge_sessions::Migration),
            Box::new(m20240101_000004_create_meter_samples::Migration),
            Box::new(m20240101_000005_create_locations::Migration),
        ]
    }
}
