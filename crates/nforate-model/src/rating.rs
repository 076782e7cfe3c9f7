use serde::Serialize;

use crate::error::ModelError;

/// A fetched rating: decimal value as published plus the exact vote count.
///
/// The value is kept as text so `"7.8"` is written back exactly as read,
/// without a float round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingRecord {
    value: String,
    votes: u64,
}

impl RatingRecord {
    pub fn new(value: impl Into<String>, votes: u64) -> Result<Self, ModelError> {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            return Err(ModelError::EmptyRatingValue);
        }
        Ok(Self {
            value: value.to_string(),
            votes,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn votes(&self) -> u64 {
        self.votes
    }
}
