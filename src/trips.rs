use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::AppError,
    models::trip::{NewTrip, Trip, TripPatch, TripType},
    services::collection::TripCollection,
    session::SessionManager,
};

/// Outcome of asking the user whether a destructive action should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_answer(answer: Option<&str>) -> Self {
        match answer.map(str::trim) {
            Some(a) if a.eq_ignore_ascii_case("yes") || a.eq_ignore_ascii_case("true") => {
                Confirmation::Confirmed
            }
            _ => Confirmation::Declined,
        }
    }
}

/// Trip CRUD scoped to whoever is signed in on `session`.
#[derive(Clone)]
pub struct TripStore {
    collection: Arc<dyn TripCollection>,
    session: SessionManager,
}

impl TripStore {
    pub fn new(collection: Arc<dyn TripCollection>, session: SessionManager) -> Self {
        Self {
            collection,
            session,
        }
    }

    pub async fn add_trip(&self, title: &str, kind: TripType) -> Result<String, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Please enter a trip title."));
        }
        if let TripType::Other(raw) = &kind {
            return Err(AppError::validation(format!("Unknown trip type \"{raw}\".")));
        }
        let user_id = self.session.user_id()?;

        let id = self
            .collection
            .insert(NewTrip::new(user_id.clone(), title, kind))
            .await
            .inspect_err(|err| warn!("adding trip failed: {err}"))?;
        info!(%user_id, trip_id = %id, "trip added");
        Ok(id)
    }

    /// All trips of the current user, in no particular order.
    pub async fn list_trips(&self) -> Result<Vec<Trip>, AppError> {
        let user_id = self.session.user_id()?;
        let trips = self
            .collection
            .query_by_owner(&user_id)
            .await
            .inspect_err(|err| warn!("loading trips failed: {err}"))?;
        Ok(trips
            .into_iter()
            .filter(|trip| trip.user_id == user_id)
            .collect())
    }

    /// Owner-scoped lookup; trips of other users read as missing.
    pub async fn find_trip(&self, trip_id: &str) -> Result<Trip, AppError> {
        let user_id = self.session.user_id()?;
        match self.collection.get(trip_id).await? {
            Some(trip) if trip.user_id == user_id => Ok(trip),
            _ => Err(AppError::NotFound),
        }
    }

    /// Flips the favorite flag and returns the new value.
    pub async fn toggle_favorite(&self, trip_id: &str) -> Result<bool, AppError> {
        let trip = self.find_trip(trip_id).await?;
        let favorite = !trip.favorite;
        self.collection
            .update(&trip.id, TripPatch::favorite(favorite))
            .await
            .inspect_err(|err| warn!("updating favorite failed: {err}"))?;
        info!(trip_id = %trip.id, favorite, "favorite toggled");
        Ok(favorite)
    }

    /// Returns whether a record was deleted. A declined confirmation never
    /// touches the collection.
    pub async fn delete_trip(
        &self,
        trip_id: &str,
        confirmation: Confirmation,
    ) -> Result<bool, AppError> {
        if confirmation == Confirmation::Declined {
            return Ok(false);
        }
        let trip = self.find_trip(trip_id).await?;
        self.collection
            .delete(&trip.id)
            .await
            .inspect_err(|err| warn!("deleting trip failed: {err}"))?;
        info!(trip_id = %trip.id, "trip deleted");
        Ok(true)
    }
}
