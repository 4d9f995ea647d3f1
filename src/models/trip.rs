use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Kind of trip. Only the three named kinds can be written; anything else a
/// record carries is kept verbatim in `Other` and shown as a plain trip.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TripType {
    #[default]
    Adventure,
    Leisure,
    Work,
    Other(String),
}

impl TripType {
    pub const SELECTABLE: [TripType; 3] = [TripType::Adventure, TripType::Leisure, TripType::Work];

    pub fn as_str(&self) -> &str {
        match self {
            TripType::Adventure => "adventure",
            TripType::Leisure => "leisure",
            TripType::Work => "work",
            TripType::Other(raw) => raw,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TripType::Adventure => "Adventure",
            TripType::Leisure => "Leisure",
            TripType::Work => "Work",
            TripType::Other(_) => "Trip",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TripType::Adventure => "🏔️",
            TripType::Leisure => "☕",
            TripType::Work => "💼",
            TripType::Other(_) => "✈️",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            TripType::Adventure => "type-adventure",
            TripType::Leisure => "type-leisure",
            TripType::Work => "type-work",
            TripType::Other(_) => "type-generic",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strict parse used on the write path.
impl FromStr for TripType {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "adventure" => Ok(TripType::Adventure),
            "leisure" => Ok(TripType::Leisure),
            "work" => Ok(TripType::Work),
            other => Err(AppError::validation(format!("Unknown trip type \"{other}\"."))),
        }
    }
}

/// Lenient conversion used when reading stored records.
impl From<String> for TripType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "adventure" => TripType::Adventure,
            "leisure" => TripType::Leisure,
            "work" => TripType::Work,
            _ => TripType::Other(raw),
        }
    }
}

impl From<TripType> for String {
    fn from(kind: TripType) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TripType,
    pub user_id: String,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
}

/// A record as handed to the collection; the id is assigned on insert.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub title: String,
    pub kind: TripType,
    pub user_id: String,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl NewTrip {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, kind: TripType) -> Self {
        Self {
            title: title.into(),
            kind,
            user_id: user_id.into(),
            favorite: false,
            created_at: Utc::now(),
        }
    }

    pub fn into_trip(self, id: String) -> Trip {
        Trip {
            id,
            title: self.title,
            kind: self.kind,
            user_id: self.user_id,
            favorite: self.favorite,
            created_at: self.created_at,
        }
    }
}

/// Partial update of a stored record. Only the favorite flag is mutable.
#[derive(Debug, Clone, Default)]
pub struct TripPatch {
    pub favorite: Option<bool>,
}

impl TripPatch {
    pub fn favorite(value: bool) -> Self {
        Self {
            favorite: Some(value),
        }
    }
}

/// The favorites-only view over an already fetched list.
pub fn filter_favorites(trips: &[Trip], favorites_only: bool) -> Vec<&Trip> {
    trips
        .iter()
        .filter(|trip| !favorites_only || trip.favorite)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(id: &str, favorite: bool) -> Trip {
        let mut new = NewTrip::new("u1", id, TripType::Adventure);
        new.favorite = favorite;
        new.into_trip(id.to_string())
    }

    #[test]
    fn write_path_rejects_unknown_types() {
        assert_eq!("Leisure".parse::<TripType>().unwrap(), TripType::Leisure);
        assert_eq!("".parse::<TripType>().unwrap(), TripType::Adventure);
        assert!(matches!(
            "cruise".parse::<TripType>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn stored_unknown_types_fall_back_to_generic_presentation() {
        let kind = TripType::from("cruise".to_string());
        assert_eq!(kind, TripType::Other("cruise".into()));
        assert_eq!(kind.label(), "Trip");
        assert_eq!(kind.icon(), "✈️");
        assert_eq!(kind.as_str(), "cruise");
    }

    #[test]
    fn serializes_with_the_document_field_names() {
        let value = serde_json::to_value(trip("t1", true)).unwrap();
        assert_eq!(value["type"], "adventure");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["favorite"], true);
    }

    #[test]
    fn favorites_filter_is_a_pure_view() {
        let trips = vec![trip("a", false), trip("b", true), trip("c", false)];
        assert_eq!(filter_favorites(&trips, false).len(), 3);
        let only = filter_favorites(&trips, true);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].id, "b");
        assert_eq!(trips.len(), 3);
    }
}
