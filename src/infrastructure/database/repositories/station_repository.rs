//! SeaORM implementation of `StationRepository`.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info};

use crate::domain::ports::StationRepository;
use crate::domain::station::{Station, StationStatus};
use crate::infrastructure::database::entities::charge_point;
use crate::support::errors::DomainResult;

pub struct SeaOrmStationRepository {
    db: DatabaseConnection,
}

impl SeaOrmStationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn from_model(model: charge_point::Model) -> Station {
    Station {
        id: model.id,
        identity: model.identity,
        vendor: model.vendor,
        model: model.model,
        serial_number: model.serial_number,
        firmware_version: model.firmware_version,
        status: StationStatus::from(model.status.as_str()),
        last_seen_at: model.last_seen_at,
    }
}

#[async_trait]
impl StationRepository for SeaOrmStationRepository {
    async fn find_by_identity(&self, identity: &str) -> DomainResult<Option<Station>> {
        let model = charge_point::Entity::find()
            .filter(charge_point::Column::Identity.eq(identity))
            .one(&self.db)
            .await?;
        Ok(model.map(from_model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Station>> {
        let model = charge_point::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(from_model))
    }

    async fn list_all(&self) -> DomainResult<Vec<Station>> {
        let models = charge_point::Entity::find().all(&self.db).await?;
        Ok(models.into_iter().map(from_model).collect())
    }

    async fn upsert_on_boot(
        &self,
        identity: &str,
        vendor: &str,
        model: &str,
        serial_number: Option<&str>,
        firmware_version: Option<&str>,
    ) -> DomainResult<Station> {
        let now = Utc::now();
        let existing = charge_point::Entity::find()
            .filter(charge_point::Column::Identity.eq(identity))
            .one(&self.db)
            .await?;

        let saved = if let Some(existing) = existing {
            debug!(identity, "BootNotification: updating existing station");
            let mut am: charge_point::ActiveModel = existing.into();
            am.vendor = Set(Some(vendor.to_string()));
            am.model = Set(Some(model.to_string()));
            am.serial_number = Set(serial_number.map(str::to_string));
            am.firmware_version = Set(firmware_version.map(str::to_string));
            am.status = Set(StationStatus::Available.as_str().to_string());
            am.last_seen_at = Set(now);
            am.update(&self.db).await?
        } else {
            info!(identity, "BootNotification: registering new station");
            let am = charge_point::ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                identity: Set(identity.to_string()),
                vendor: Set(Some(vendor.to_string())),
                model: Set(Some(model.to_string())),
                serial_number: Set(serial_number.map(str::to_string)),
                firmware_version: Set(firmware_version.map(str::to_string)),
                status: Set(StationStatus::Available.as_str().to_string()),
                last_seen_at: Set(now),
            };
            am.insert(&self.db).await?
        };

        Ok(from_model(saved))
    }

    async fn touch_last_seen(&self, id: i32) -> DomainResult<()> {
        if let Some(existing) = charge_point::Entity::find_by_id(id).one(&self.db).await? {
            let mut am: charge_point::ActiveModel = existing.into();
            am.last_seen_at = Set(Utc::now());
            am.update(&self.db).await?;
        }
        Ok(())
    }

    async fn update_status(&self, id: i32, status: StationStatus) -> DomainResult<()> {
        if let Some(existing) = charge_point::Entity::find_by_id(id).one(&self.db).await? {
            let mut am: charge_point::ActiveModel = existing.into();
            am.status = Set(status.as_str().to_string());
            am.update(&self.db).await?;
        }
        Ok(())
    }
}
