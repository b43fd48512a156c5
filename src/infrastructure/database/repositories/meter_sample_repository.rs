//! SeaORM implementation of `MeterSampleRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::meter_sample::MeterSample;
use crate::domain::ports::MeterSampleRepository;
use crate::infrastructure::database::entities::meter_sample;
use crate::support::errors::DomainResult;

pub struct SeaOrmMeterSampleRepository {
    db: DatabaseConnection,
}

impl SeaOrmMeterSampleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn from_model(model: meter_sample::Model) -> MeterSample {
    MeterSample {
        id: model.id,
        station_id: model.station_id,
        session_id: model.session_id,
        connector_id: model.connector_id,
        timestamp: model.timestamp,
        energy_wh_total: model.energy_wh_total,
        power_w: model.power_w,
        current_a: model.current_a,
    }
}

#[async_trait]
impl MeterSampleRepository for SeaOrmMeterSampleRepository {
    async fn create(&self, sample: MeterSample) -> DomainResult<MeterSample> {
        let am = meter_sample::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            station_id: Set(sample.station_id),
            session_id: Set(sample.session_id),
            connector_id: Set(sample.connector_id),
            timestamp: Set(sample.timestamp),
            energy_wh_total: Set(sample.energy_wh_total),
            power_w: Set(sample.power_w),
            current_a: Set(sample.current_a),
        };
        let saved = am.insert(&self.db).await?;
        Ok(from_model(saved))
    }

    async fn energy_readings_for_session(
        &self,
        session_id: i32,
    ) -> DomainResult<Vec<(DateTime<Utc>, f64)>> {
        let models = meter_sample::Entity::find()
            .filter(meter_sample::Column::SessionId.eq(session_id))
            .filter(meter_sample::Column::EnergyWhTotal.is_not_null())
            .order_by_asc(meter_sample::Column::Timestamp)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|m| m.energy_wh_total.map(|e| (m.timestamp, e)))
            .collect())
    }
}
