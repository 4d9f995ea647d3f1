use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{IdentityService, SqliteIdentity, SqliteTrips, TripCollection},
    session::SessionManager,
    trips::TripStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub identity: Arc<dyn IdentityService>,
    pub trips: Arc<dyn TripCollection>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let identity = Arc::new(SqliteIdentity::new(db.clone(), config.session_ttl_hours));
        let trips = Arc::new(SqliteTrips::new(db.clone()));
        Self::with_backends(config, db, identity, trips)
    }

    pub fn with_backends(
        config: AppConfig,
        db: DbPool,
        identity: Arc<dyn IdentityService>,
        trips: Arc<dyn TripCollection>,
    ) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        Self {
            config,
            db,
            identity,
            trips,
            cookie_key,
        }
    }

    /// A fresh, signed-out session for one client.
    pub fn session_manager(&self) -> SessionManager {
        SessionManager::new(self.identity.clone())
    }

    pub fn trip_store(&self, session: &SessionManager) -> TripStore {
        TripStore::new(self.trips.clone(), session.clone())
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
