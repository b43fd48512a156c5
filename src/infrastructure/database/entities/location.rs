//! `locations` SeaORM entity. Forward-reserved, currently unpopulated by
//! the core — see `domain/mod.rs` module docs and SPEC_FULL.md §3.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(nullable)]
    pub address: Option<String>,
    #[sea_orm(nullable)]
    pub latitude: Option<f64>,
    #[sea_orm(nullable)]
    pub longitude: Option<f64>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
