//! SeaORM implementation of `SessionRepository`.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::ports::SessionRepository;
use crate::domain::session::Session;
use crate::infrastructure::database::entities::charge_session;
use crate::support::errors::{DomainError, DomainResult};

pub struct SeaOrmSessionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSessionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn from_model(model: charge_session::Model) -> Session {
    Session {
        id: model.id,
        station_id: model.station_id,
        connector_id: model.connector_id,
        transaction_id: model.transaction_id,
        email: model.email,
        intent_id: model.intent_id,
        user_tag: model.user_tag,
        started_at: model.started_at,
        finished_at: model.finished_at,
        meter_start_wh: model.meter_start_wh,
        meter_stop_wh: model.meter_stop_wh,
        energy_kwh: model.energy_kwh,
        cost_huf: model.cost_huf,
        stop_code_hash: model.stop_code_hash,
    }
}

fn to_active_model(session: &Session) -> charge_session::ActiveModel {
    charge_session::ActiveModel {
        id: Set(session.id),
        station_id: Set(session.station_id),
        connector_id: Set(session.connector_id),
        transaction_id: Set(session.transaction_id.clone()),
        email: Set(session.email.clone()),
        intent_id: Set(session.intent_id),
        user_tag: Set(session.user_tag.clone()),
        started_at: Set(session.started_at),
        finished_at: Set(session.finished_at),
        meter_start_wh: Set(session.meter_start_wh),
        meter_stop_wh: Set(session.meter_stop_wh),
        energy_kwh: Set(session.energy_kwh),
        cost_huf: Set(session.cost_huf),
        stop_code_hash: Set(session.stop_code_hash.clone()),
    }
}

#[async_trait]
impl SessionRepository for SeaOrmSessionRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Session>> {
        let model = charge_session::Entity::find_by_id(id)
            .one(&self.db)
            .await?;
        Ok(model.map(from_model))
    }

    async fn find_by_intent_id(&self, intent_id: i32) -> DomainResult<Option<Session>> {
        let model = charge_session::Entity::find()
            .filter(charge_session::Column::IntentId.eq(intent_id))
            .one(&self.db)
            .await?;
        Ok(model.map(from_model))
    }

    async fn find_open_by_transaction_id(
        &self,
        station_id: i32,
        transaction_id: &str,
    ) -> DomainResult<Option<Session>> {
        // Stations sometimes echo the transaction id back as the Session's
        // own primary key rather than the string we handed them; try both
        // (spec §9 open question: "the spec fixes both lookup paths").
        let by_tx = charge_session::Entity::find()
            .filter(charge_session::Column::StationId.eq(station_id))
            .filter(charge_session::Column::TransactionId.eq(transaction_id))
            .filter(charge_session::Column::FinishedAt.is_null())
            .one(&self.db)
            .await?;
        if let Some(model) = by_tx {
            return Ok(Some(from_model(model)));
        }

        if let Ok(pk) = transaction_id.parse::<i32>() {
            let by_pk = charge_session::Entity::find()
                .filter(charge_session::Column::StationId.eq(station_id))
                .filter(charge_session::Column::Id.eq(pk))
                .filter(charge_session::Column::FinishedAt.is_null())
                .one(&self.db)
                .await?;
            return Ok(by_pk.map(from_model));
        }

        Ok(None)
    }

    async fn find_open_by_station_connector(
        &self,
        station_id: i32,
        connector_id: i32,
    ) -> DomainResult<Option<Session>> {
        let model = charge_session::Entity::find()
            .filter(charge_session::Column::StationId.eq(station_id))
            .filter(charge_session::Column::ConnectorId.eq(connector_id))
            .filter(charge_session::Column::FinishedAt.is_null())
            .order_by_desc(charge_session::Column::StartedAt)
            .one(&self.db)
            .await?;
        Ok(model.map(from_model))
    }

    async fn find_open_any_on_station(&self, station_id: i32) -> DomainResult<Option<Session>> {
        let model = charge_session::Entity::find()
            .filter(charge_session::Column::StationId.eq(station_id))
            .filter(charge_session::Column::FinishedAt.is_null())
            .order_by_desc(charge_session::Column::StartedAt)
            .one(&self.db)
            .await?;
        Ok(model.map(from_model))
    }

    async fn find_by_email_and_stop_code_hash(
        &self,
        email: &str,
        stop_code_hash: &str,
    ) -> DomainResult<Option<Session>> {
        let model = charge_session::Entity::find()
            .filter(charge_session::Column::Email.eq(email))
            .filter(charge_session::Column::StopCodeHash.eq(stop_code_hash))
            .one(&self.db)
            .await?;
        Ok(model.map(from_model))
    }

    async fn list_all(&self) -> DomainResult<Vec<Session>> {
        let models = charge_session::Entity::find()
            .order_by_desc(charge_session::Column::StartedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(from_model).collect())
    }

    async fn list_active_by_station(&self, station_id: i32) -> DomainResult<Vec<Session>> {
        let models = charge_session::Entity::find()
            .filter(charge_session::Column::StationId.eq(station_id))
            .filter(charge_session::Column::FinishedAt.is_null())
            .order_by_desc(charge_session::Column::StartedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(from_model).collect())
    }

    async fn create(&self, session: Session) -> DomainResult<Session> {
        let mut am = to_active_model(&session);
        am.id = sea_orm::ActiveValue::NotSet;
        let saved = am.insert(&self.db).await?;
        Ok(from_model(saved))
    }

    async fn update(&self, session: &Session) -> DomainResult<()> {
        charge_session::Entity::find_by_id(session.id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::SessionNotFound(session.id))?;

        to_active_model(session).update(&self.db).await?;
        Ok(())
    }
}
