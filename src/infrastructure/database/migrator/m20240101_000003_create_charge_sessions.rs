//! Create charge_sessions table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_charge_points::ChargePoints;
use super::m20240101_000002_create_charging_intents::ChargingIntents;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChargeSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChargeSessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChargeSessions::StationId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChargeSessions::ConnectorId).integer())
                    .col(ColumnDef::new(ChargeSessions::TransactionId).string())
                    .col(ColumnDef::new(ChargeSessions::Email).string())
                    .col(ColumnDef::new(ChargeSessions::IntentId).integer())
                    .col(ColumnDef::new(ChargeSessions::UserTag).string())
                    .col(
                        ColumnDef::new(ChargeSessions::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChargeSessions::FinishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ChargeSessions::MeterStartWh).double())
                    .col(ColumnDef::new(ChargeSessions::MeterStopWh).double())
                    .col(ColumnDef::new(ChargeSessions::EnergyKwh).double())
                    .col(ColumnDef::new(ChargeSessions::CostHuf).double())
                    .col(ColumnDef::new(ChargeSessions::StopCodeHash).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_charge_sessions_station")
                            .from(ChargeSessions::Table, ChargeSessions::StationId)
                            .to(ChargePoints::Table, ChargePoints::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_charge_sessions_intent")
                            .from(ChargeSessions::Table, ChargeSessions::IntentId)
                            .to(ChargingIntents::Table, ChargingIntents::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_charge_sessions_transaction_id")
                    .table(ChargeSessions::Table)
                    .col(ChargeSessions::TransactionId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChargeSessions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ChargeSessions {
    Table,
    Id,
    StationId,
    ConnectorId,
    TransactionId,
    Email,
    IntentId,
    UserTag,
    StartedAt,
    FinishedAt,
    MeterStartWh,
    MeterStopWh,
    EnergyKwh,
    CostHuf,
    StopCodeHash,
}
