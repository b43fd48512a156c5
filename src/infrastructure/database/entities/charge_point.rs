//! `charge_points` SeaORM entity — persisted form of `domain::Station`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "charge_points")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub identity: String,

    #[sea_orm(nullable)]
    pub vendor: Option<String>,
    #[sea_orm(nullable)]
    pub model: Option<String>,
    #[sea_orm(nullable)]
    pub serial_number: Option<String>,
    #[sea_orm(nullable)]
    pub firmware_version: Option<String>,

    pub status: String,
    pub last_seen_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::charging_intent::Entity")]
    ChargingIntents,
    #[sea_orm(has_many = "super::charge_session::Entity")]
    ChargeSessions,
    #[sea_orm(has_many = "super::meter_sample::Entity")]
    MeterSamples,
}

impl Related<super::charging_intent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChargingIntents.def()
    }
}

impl Related<super::charge_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChargeSessions.def()
    }
}

impl Related<super::meter_sample::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MeterSamples.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
