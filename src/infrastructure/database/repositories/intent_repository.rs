//! SeaORM implementation of `IntentRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::intent::{Intent, IntentStatus};
use crate::domain::ports::IntentRepository;
use crate::infrastructure::database::entities::charging_intent;
use crate::support::errors::{DomainError, DomainResult};

pub struct SeaOrmIntentRepository {
    db: DatabaseConnection,
}

impl SeaOrmIntentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn from_model(model: charging_intent::Model) -> Intent {
    Intent {
        id: model.id,
        station_id: model.station_id,
        connector_id: model.connector_id,
        email: model.email,
        status: IntentStatus::from(model.status.as_str()),
        hold_amount_huf: model.hold_amount_huf,
        currency: model.currency,
        payment_provider: model.payment_provider,
        payment_provider_ref: model.payment_provider_ref,
        expires_at: model.expires_at,
        last_error: model.last_error,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Non-terminal = not yet `expired`/`cancelled`/`failed`. `paid` is also
/// excluded: once paid, the intent has settled and a new one may be opened
/// for the same (station, connector).
fn is_non_terminal(status: &str) -> bool {
    status == IntentStatus::PendingPayment.as_str()
}

#[async_trait]
impl IntentRepository for SeaOrmIntentRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Intent>> {
        let model = charging_intent::Entity::find_by_id(id)
            .one(&self.db)
            .await?;
        Ok(model.map(from_model))
    }

    async fn find_non_terminal_for_station_connector(
        &self,
        station_id: i32,
        connector_id: i32,
    ) -> DomainResult<Option<Intent>> {
        let models = charging_intent::Entity::find()
            .filter(charging_intent::Column::StationId.eq(station_id))
            .filter(charging_intent::Column::ConnectorId.eq(connector_id))
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .find(|m| is_non_terminal(&m.status))
            .map(from_model))
    }

    async fn create(
        &self,
        station_id: i32,
        connector_id: i32,
        email: &str,
        hold_amount_huf: i32,
        expires_at: DateTime<Utc>,
    ) -> DomainResult<Intent> {
        let now = Utc::now();
        let am = charging_intent::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            station_id: Set(station_id),
            connector_id: Set(connector_id),
            email: Set(email.to_string()),
            status: Set(IntentStatus::PendingPayment.as_str().to_string()),
            hold_amount_huf: Set(hold_amount_huf),
            currency: Set("HUF".to_string()),
            payment_provider: Set(None),
            payment_provider_ref: Set(None),
            expires_at: Set(expires_at),
            last_error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let saved = am.insert(&self.db).await?;
        Ok(from_model(saved))
    }

    async fn update(&self, intent: &Intent) -> DomainResult<()> {
        let existing = charging_intent::Entity::find_by_id(intent.id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::IntentNotFound(intent.id))?;

        let mut am: charging_intent::ActiveModel = existing.into();
        am.status = Set(intent.status.as_str().to_string());
        am.payment_provider = Set(intent.payment_provider.clone());
        am.payment_provider_ref = Set(intent.payment_provider_ref.clone());
        am.last_error = Set(intent.last_error.clone());
        am.updated_at = Set(Utc::now());
        am.update(&self.db).await?;
        Ok(())
    }
}
