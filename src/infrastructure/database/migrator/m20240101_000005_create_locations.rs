//! Create locations table.
//!
//! Forward-reserved per spec §6's persisted layout: no domain entity writes
//! to it (no location-scoped behavior is specified), but its presence keeps
//! the schema aligned with the REST surface's eventual station-grouping
//! needs (see SPEC_FULL.md §3).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Locations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Locations::Name).string().not_null())
                    .col(ColumnDef::new(Locations::Address).string())
                    .col(ColumnDef::new(Locations::Latitude).double())
                    .col(ColumnDef::new(Locations::Longitude).double())
                    .col(
                        ColumnDef::new(Locations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Locations {
    Table,
    Id,
    Name,
    Address,
    Latitude,
    Longitude,
    CreatedAt,
}
