//! `meter_samples` SeaORM entity — persisted form of `domain::MeterSample`.
//! Append-only: no `update`/`delete` is ever issued against this table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "meter_samples")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub station_id: i32,
    #[sea_orm(nullable)]
    pub session_id: Option<i32>,
    #[sea_orm(nullable)]
    pub connector_id: Option<i32>,

    pub timestamp: DateTimeUtc,

    #[sea_orm(nullable)]
    pub energy_wh_total: Option<f64>,
    #[sea_orm(nullable)]
    pub power_w: Option<f64>,
    #[sea_orm(nullable)]
    pub current_a: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::charge_point::Entity",
        from = "Column::StationId",
        to = "super::charge_point::Column::Id"
    )]
    Station,
    #[sea_orm(
        belongs_to = "super::charge_session::Entity",
        from = "Column::SessionId",
        to = "super::charge_session::Column::Id"
    )]
    Session,
}

impl Related<super::charge_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Station.def()
    }
}

impl Related<super::charge_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
