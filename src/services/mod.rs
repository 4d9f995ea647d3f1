pub mod collection;
pub mod identity;

pub use collection::{SqliteTrips, TripCollection};
pub use identity::{IdentityService, SqliteIdentity};
