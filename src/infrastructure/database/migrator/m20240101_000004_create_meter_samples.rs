//! Create meter_samples table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_charge_points::ChargePoints;
use super::m20240101_000003_create_charge_sessions::ChargeSessions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MeterSamples::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MeterSamples::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MeterSamples::StationId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MeterSamples::SessionId).integer())
                    .col(ColumnDef::new(MeterSamples::ConnectorId).integer())
                    .col(
                        ColumnDef::new(MeterSamples::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MeterSamples::EnergyWhTotal).double())
                    .col(ColumnDef::new(MeterSamples::PowerW).double())
                    .col(ColumnDef::new(MeterSamples::CurrentA).double())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meter_samples_station")
                            .from(MeterSamples::Table, MeterSamples::StationId)
                            .to(ChargePoints::Table, ChargePoints::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_meter_samples_session")
                            .from(MeterSamples::Table, MeterSamples::SessionId)
                            .to(ChargeSessions::Table, ChargeSessions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MeterSamples::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum MeterSamples {
    Table,
    Id,
    StationId,
    SessionId,
    ConnectorId,
    Timestamp,
    EnergyWhTotal,
    PowerW,
    CurrentA,
}
