//! `charging_intents` SeaORM entity — persisted form of `domain::Intent`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "charging_intents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub station_id: i32,
    pub connector_id: i32,
    pub email: String,
    pub status: String,
    pub hold_amount_huf: i32,
    pub currency: String,

    #[sea_orm(nullable)]
    pub payment_provider: Option<String>,
    #[sea_orm(nullable)]
    pub payment_provider_ref: Option<String>,

    pub expires_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub last_error: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::charge_point::Entity",
        from = "Column::StationId",
        to = "super::charge_point::Column::Id"
    )]
    Station,
    #[sea_orm(has_one = "super::charge_session::Entity")]
    ChargeSession,
}

impl Related<super::charge_point::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Station.def()
    }
}

impl Related<super::charge_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChargeSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
