use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

/// A reported smoking area as the domain sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub coordinate: Coordinate,
    pub is_indoor: bool,
    pub verification_count: i32,
    pub is_verified: bool,
    pub is_public_data: bool,
    pub public_data_source: Option<String>,
    pub public_data_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A point-in-time usability assessment of an area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub area_id: Uuid,
    /// Cleared when the author deletes their account.
    pub user_id: Option<Uuid>,
    pub cleanliness: i16,
    pub is_available: bool,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
