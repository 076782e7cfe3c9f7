use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use nforate_acquire::{ExtractStrategy, FetchError, FetchOutcome, RatingSource};
use nforate_model::{RatingRecord, TitleId};

pub(crate) enum Reply {
    Rating(&'static str, u64),
    NoData,
    Fail,
}

/// Canned replies per title id; remembers every id it was asked for.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    replies: HashMap<String, Reply>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub(crate) fn with(mut self, id: &str, reply: Reply) -> Self {
        self.replies.insert(id.to_string(), reply);
        self
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl RatingSource for ScriptedSource {
    async fn fetch_rating(&self, id: &TitleId) -> Result<FetchOutcome, FetchError> {
        self.requested.lock().unwrap().push(id.to_string());
        match self.replies.get(id.as_str()) {
            Some(Reply::Rating(value, votes)) => Ok(FetchOutcome::Found {
                record: RatingRecord::new(*value, *votes).unwrap(),
                strategy: ExtractStrategy::StructuredData,
            }),
            Some(Reply::Fail) => Err(FetchError::HttpStatus {
                status: 503,
                url: format!("https://www.imdb.com/title/{id}/"),
            }),
            Some(Reply::NoData) | None => Ok(FetchOutcome::NoData { misses: Vec::new() }),
        }
    }
}

pub(crate) fn unrated_nfo(id: &str) -> String {
    format!(
        "<movie>\n  <title>Untitled</title>\n  <uniqueid type=\"imdb\" default=\"true\">{id}</uniqueid>\n</movie>\n"
    )
}

pub(crate) fn rated_nfo(id: &str) -> String {
    format!(
        "<movie>\n  <uniqueid type=\"imdb\">{id}</uniqueid>\n  <ratings>\n    <rating name=\"imdb\" max=\"10\">\n      <value>6.6</value>\n      <votes>4321</votes>\n    </rating>\n  </ratings>\n</movie>\n"
    )
}
