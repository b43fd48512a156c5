//! SeaORM implementations of the `domain::ports` repository traits.

pub mod intent_repository;
pub mod meter_sample_repository;
pub mod repository_provider;
pub mod session_repository;
pub mod station_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
