//! Create charging_intents table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_charge_points::ChargePoints;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChargingIntents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChargingIntents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChargingIntents::StationId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChargingIntents::ConnectorId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChargingIntents::Email).string().not_null())
                    .col(
                        ColumnDef::new(ChargingIntents::Status)
                            .string()
                            .not_null()
                            .default("pending_payment"),
                    )
                    .col(
                        ColumnDef::new(ChargingIntents::HoldAmountHuf)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChargingIntents::Currency)
                            .string()
                            .not_null()
                            .default("HUF"),
                    )
                    .col(ColumnDef::new(ChargingIntents::PaymentProvider).string())
                    .col(ColumnDef::new(ChargingIntents::PaymentProviderRef).string())
                    .col(
                        ColumnDef::new(ChargingIntents::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChargingIntents::LastError).string())
                    .col(
                        ColumnDef::new(ChargingIntents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChargingIntents::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_charging_intents_station")
                            .from(ChargingIntents::Table, ChargingIntents::StationId)
                            .to(ChargePoints::Table, ChargePoints::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_charging_intents_provider_ref")
                    .table(ChargingIntents::Table)
                    .col(ChargingIntents::PaymentProviderRef)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_charging_intents_provider")
                    .table(ChargingIntents::Table)
                    .col(ChargingIntents::PaymentProvider)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_charging_intents_expires_at")
                    .table(ChargingIntents::Table)
                    .col(ChargingIntents::ExpiresAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_charging_intents_status")
                    .table(ChargingIntents::Table)
                    .col(ChargingIntents::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_charging_intents_email")
                    .table(ChargingIntents::Table)
                    .col(ChargingIntents::Email)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChargingIntents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ChargingIntents {
    Table,
    Id,
    StationId,
    ConnectorId,
    Email,
    Status,
    HoldAmountHuf,
    Currency,
    PaymentProvider,
    PaymentProviderRef,
    ExpiresAt,
    LastError,
    CreatedAt,
    UpdatedAt,
}
