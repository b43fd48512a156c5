//! Create charge_points table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChargePoints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChargePoints::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChargePoints::Identity).string().not_null())
                    .col(ColumnDef::new(ChargePoints::Vendor).string())
                    .col(ColumnDef::new(ChargePoints::Model).string())
                    .col(ColumnDef::new(ChargePoints::SerialNumber).string())
                    .col(ColumnDef::new(ChargePoints::FirmwareVersion).string())
                    .col(
                        ColumnDef::new(ChargePoints::Status)
                            .string()
                            .not_null()
                            .default("unknown"),
                    )
                    .col(
                        ColumnDef::new(ChargePoints::LastSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_charge_points_identity")
                    .table(ChargePoints::Table)
                    .col(ChargePoints::Identity)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChargePoints::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ChargePoints {
    Table,
    Id,
    Identity,
    Vendor,
    Model,
    SerialNumber,
    FirmwareVersion,
    Status,
    LastSeenAt,
}
