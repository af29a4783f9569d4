/// Backend user identifiers are UUID strings issued by the identity provider.
pub type UserId = String;

/// Integer primary keys (notes, appointments, recommendations).
pub type RecordId = i64;

/// UUID keys of uploaded drawings.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
