use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    error::AppError,
    models::trip::{filter_favorites, Trip, TripType},
    session::{SessionManager, SessionSubscription},
    trips::{Confirmation, TripStore},
};

/// Fields of the "new trip" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripDraft {
    pub title: String,
    pub kind: TripType,
}

/// State behind the dashboard: the last fetched list, the favorites toggle and
/// the draft. Every mutation is followed by a full re-fetch.
pub struct Dashboard {
    store: TripStore,
    trips: Vec<Trip>,
    favorites_only: bool,
    pub draft: TripDraft,
    signed_out: Arc<AtomicBool>,
    _session: SessionSubscription,
}

impl Dashboard {
    pub fn attach(session: &SessionManager, store: TripStore) -> Self {
        let signed_out = Arc::new(AtomicBool::new(true));
        let flag = signed_out.clone();
        let subscription = session.observe(move |current| {
            flag.store(current.is_none(), Ordering::SeqCst);
        });

        Self {
            store,
            trips: Vec::new(),
            favorites_only: false,
            draft: TripDraft::default(),
            signed_out,
            _session: subscription,
        }
    }

    /// True once the session is gone; the screen should send the user to log in.
    pub fn requires_login(&self) -> bool {
        self.signed_out.load(Ordering::SeqCst)
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn favorites_only(&self) -> bool {
        self.favorites_only
    }

    pub fn set_favorites_only(&mut self, favorites_only: bool) {
        self.favorites_only = favorites_only;
    }

    pub fn toggle_favorites_only(&mut self) {
        self.favorites_only = !self.favorites_only;
    }

    pub fn visible(&self) -> Vec<&Trip> {
        filter_favorites(&self.trips, self.favorites_only)
    }

    pub async fn refresh(&mut self) -> Result<(), AppError> {
        self.trips = self.store.list_trips().await?;
        Ok(())
    }

    /// Adds the drafted trip. The title is cleared on success, the type kept.
    pub async fn add_trip(&mut self) -> Result<(), AppError> {
        self.store
            .add_trip(&self.draft.title, self.draft.kind.clone())
            .await?;
        self.draft.title.clear();
        self.refresh().await
    }

    pub async fn toggle_favorite(&mut self, trip_id: &str) -> Result<(), AppError> {
        self.store.toggle_favorite(trip_id).await?;
        self.refresh().await
    }

    pub async fn delete_trip(
        &mut self,
        trip_id: &str,
        confirmation: Confirmation,
    ) -> Result<(), AppError> {
        if self.store.delete_trip(trip_id, confirmation).await? {
            self.refresh().await?;
        }
        Ok(())
    }
}
