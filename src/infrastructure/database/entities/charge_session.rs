//! `charge_sessions` SeaORM entity — persisted form of `domain::Session`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "charge_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub station_id: i32,
    #[sea_orm(nullable)]
    pub connector_id: Option<i32>,
    #[sea_orm(nullable, unique)]
    pub transaction_id: Option<String>,
    #[sea_orm(nullable)]
    pub email: Option<String>,
    #[sea_orm(nullable)]
    pub intent_id: Option<i32>,
    #[sea_orm(nullable)]
    pub user_tag: Option<String>,

    pub started_at: DateTimeUtc,
    #[sea_orm(nullable)]
    pub finished_at: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub meter_start_wh: Option<f64>,
    #[sea_orm(nullable)]
    pub meter_stop_wh: Option<f64>,
    #[sea_orm(nullable)]
    pub energy_kwh: Option<f64>,
    #[sea_orm(nullable)]
    pub cost_huf: Option<f64>,

    #[sea_orm(nullable)]
    pub stop_code_hash: Option<String>,
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
        belongs_to = "super::charging_intent::Entity",
        from = "Column::IntentId",
        to = "super::charging_intent::Column::Id"
    )]
    Intent,
    #[sea_orm(has_many = "super::meter_sample::Entity")]
    MeterSamples,
}

impl Related<super::charge_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Station.def()
    }
}

impl Related<super::charging_intent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Intent.def()
    }
}

impl Related<super::meter_sample::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterSamples.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
