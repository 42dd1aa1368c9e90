use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request::{Card, ReadingRequest};

/// A finished reading kept by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub spread_id: String,
    pub cards: Vec<Card>,
    pub interpretation: String,
}

impl ReadingRecord {
    /// Build a record for a completed request, stamped now
    pub fn from_request(request: &ReadingRequest, interpretation: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            spread_id: request.spread_id.clone(),
            cards: request.cards.iter().map(|drawn| drawn.card.clone()).collect(),
            interpretation: interpretation.into(),
        }
    }
}
