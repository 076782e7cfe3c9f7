use std::time::Duration;

use async_trait::async_trait;
use nforate_model::TitleId;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::extract::extract_rating;
use crate::types::{FetchError, FetchOutcome, RatingSource};

const BASE_URL: &str = "https://www.imdb.com/title";

/// Upper bound for one title page request, connect to last body byte.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// IMDb serves a stripped-down page (or a 403) to obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Canonical title page for an identifier.
pub fn title_url(id: &TitleId) -> String {
    format!("{BASE_URL}/{id}/")
}

/// Fetches IMDb title pages and extracts their rating.
///
/// One request per call, no retries and no caching.
pub struct ImdbClient {
    client: reqwest::Client,
}

impl ImdbClient {
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RatingSource for ImdbClient {
    async fn fetch_rating(&self, id: &TitleId) -> Result<FetchOutcome, FetchError> {
        let url = title_url(id);
        tracing::debug!(url = %url, "Fetching title page");

        let html = self.fetch_page(&url).await?;
        tracing::debug!(bytes = html.len(), "Received HTML");

        Ok(extract_rating(&html))
    }
}
