//! SeaORM-backed `RepositoryProvider` — one connection pool, one accessor
//! per aggregate.

use sea_orm::DatabaseConnection;

use crate::domain::ports::{
    IntentRepository, MeterSampleRepository, RepositoryProvider, SessionRepository,
    StationRepository,
};

use super::intent_repository::SeaOrmIntentRepository;
use super::meter_sample_repository::SeaOrmMeterSampleRepository;
use super::session_repository::SeaOrmSessionRepository;
use super::station_repository::SeaOrmStationRepository;

pub struct SeaOrmRepositoryProvider {
    stations: SeaOrmStationRepository,
    intents: SeaOrmIntentRepository,
    sessions: SeaOrmSessionRepository,
    meter_samples: SeaOrmMeterSampleRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            stations: SeaOrmStationRepository::new(db.clone()),
            intents: SeaOrmIntentRepository::new(db.clone()),
            sessions: SeaOrmSessionRepository::new(db.clone()),
            meter_samples: SeaOrmMeterSampleRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn stations(&self) -> &dyn StationRepository {
        &self.stations
    }

    fn intents(&self) -> &dyn IntentRepository {
        &self.intents
    }

    fn sessions(&self) -> &dyn SessionRepository {
        &self.sessions
    }

    fn meter_samples(&self) -> &dyn MeterSampleRepository {
        &self.meter_samples
    }
}
