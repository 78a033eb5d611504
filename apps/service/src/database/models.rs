use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Endpoint model - a named, uniquely-URLed target under monitoring.
///
/// Owned by the external registry; the engine only ever lists and reads
/// these. Deleting an endpoint cascades to its check records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub uuid: Uuid,
    pub name: String,
    pub url: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Endpoint {
    pub fn new(name: String, url: String, category: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            uuid: Uuid::new_v4(),
            name,
            url,
            category,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Timestamps are stored as Unix millis so ordering survives the round trip.
pub fn timestamp_to_i64(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

pub fn i64_to_timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trip_preserves_millis() {
        let now = Utc::now();
        let restored = i64_to_timestamp(timestamp_to_i64(now));
        assert_eq!(restored.timestamp_millis(), now.timestamp_millis());
    }
}
