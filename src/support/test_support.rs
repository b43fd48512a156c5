//! Shared test fixture: an in-memory SQLite `RepositoryProvider` with
//! migrations applied, matching the teacher's own sqlite-first setup.

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;

pub async fn test_repos() -> SeaOrmRepositoryProvider {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite connection");
    Migrator::up(&db, None).await.expect("run migrations");
    SeaOrmRepositoryProvider::new(db)
}
