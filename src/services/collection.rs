use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::trip::{NewTrip, Trip, TripPatch, TripType},
};

/// Boundary to the document collection holding trip records.
#[async_trait]
pub trait TripCollection: Send + Sync {
    /// Stores a record and returns the id the collection assigned to it.
    async fn insert(&self, trip: NewTrip) -> Result<String, AppError>;
    async fn query_by_owner(&self, user_id: &str) -> Result<Vec<Trip>, AppError>;
    async fn get(&self, id: &str) -> Result<Option<Trip>, AppError>;
    /// Fails with `NotFound` when no record has this id.
    async fn update(&self, id: &str, patch: TripPatch) -> Result<(), AppError>;
    /// Fails with `NotFound` when no record has this id.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[derive(FromRow)]
struct TripRow {
    id: String,
    user_id: String,
    title: String,
    trip_type: String,
    favorite: bool,
    created_at: DateTime<Utc>,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id: row.id,
            title: row.title,
            kind: TripType::from(row.trip_type),
            user_id: row.user_id,
            favorite: row.favorite,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct SqliteTrips {
    db: DbPool,
}

impl SqliteTrips {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TripCollection for SqliteTrips {
    async fn insert(&self, trip: NewTrip) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO trips (id, user_id, title, trip_type, favorite, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&trip.user_id)
        .bind(&trip.title)
        .bind(trip.kind.as_str())
        .bind(trip.favorite)
        .bind(trip.created_at)
        .execute(&self.db)
        .await?;
        Ok(id)
    }

    async fn query_by_owner(&self, user_id: &str) -> Result<Vec<Trip>, AppError> {
        let rows = sqlx::query_as::<_, TripRow>(
            "SELECT id, user_id, title, trip_type, favorite, created_at FROM trips WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Trip::from).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Trip>, AppError> {
        let row = sqlx::query_as::<_, TripRow>(
            "SELECT id, user_id, title, trip_type, favorite, created_at FROM trips WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Trip::from))
    }

    async fn update(&self, id: &str, patch: TripPatch) -> Result<(), AppError> {
        let Some(favorite) = patch.favorite else {
            return match self.get(id).await? {
                Some(_) => Ok(()),
                None => Err(AppError::NotFound),
            };
        };
        let result = sqlx::query("UPDATE trips SET favorite = ? WHERE id = ?")
            .bind(favorite)
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
