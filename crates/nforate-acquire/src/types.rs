use async_trait::async_trait;
use nforate_model::{ModelError, RatingRecord, TitleId};
use thiserror::Error;

use crate::extract::ExtractStrategy;

/// Anything that can look up the rating for a title.
///
/// [`crate::ImdbClient`] is the real implementation; the update loop only
/// sees this trait.
#[async_trait]
pub trait RatingSource {
    async fn fetch_rating(&self, id: &TitleId) -> Result<FetchOutcome, FetchError>;
}

/// Result of a successful request: either a rating, or a page without one.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found {
        record: RatingRecord,
        strategy: ExtractStrategy,
    },
    /// The page was fetched but no strategy produced a rating.
    NoData { misses: Vec<StrategyMiss> },
}

/// Why one extraction strategy gave up on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyMiss {
    pub strategy: ExtractStrategy,
    pub reason: ExtractMiss,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractMiss {
    #[error("no structured-data block on the page")]
    NoStructuredData,

    #[error("structured-data block {index} is not valid JSON: {message}")]
    MalformedStructuredData { index: usize, message: String },

    #[error("no aggregateRating with both ratingValue and ratingCount")]
    NoAggregateRating,

    #[error("rendered element not found: {0}")]
    MissingElement(&'static str),

    #[error("rendered element is empty: {0}")]
    EmptyElement(&'static str),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Network-level failure; distinct from a page that simply had no rating.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// True when the request hit the client timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Request { source, .. } | FetchError::Body { source, .. } => {
                source.is_timeout()
            }
            _ => false,
        }
    }
}
