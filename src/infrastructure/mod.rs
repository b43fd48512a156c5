//! Infrastructure layer — external concerns (persistence).

pub mod database;

pub use database::{init_database, DatabaseConfig};
pub use database::repositories::SeaOrmRepositoryProvider;
