// Tiered rating extraction from an IMDb title page.
//
// The JSON-LD block gives the exact rating and vote count but is not present
// on every rendering of the page; the rendered hero rating bar is the fallback
// and only shows abbreviated counts ("1.2M"). Strategies run in a fixed order
// and the first success wins.

use std::fmt;
use std::sync::LazyLock;

use nforate_model::votes::normalize_votes;
use nforate_model::{ModelError, RatingRecord};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ExtractMiss, FetchOutcome, StrategyMiss};

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector")
});
static SCORE_CONTAINER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[data-testid="hero-rating-bar__aggregate-rating__score"]"#)
        .expect("valid selector")
});
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").expect("valid selector"));

/// One way of pulling a rating out of a title page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractStrategy {
    /// `aggregateRating` inside a `<script type="application/ld+json">` block.
    StructuredData,
    /// The score and vote count shown in the page's rating bar.
    RenderedHtml,
}

impl ExtractStrategy {
    /// Strategies in the order they are tried.
    pub const ORDER: [ExtractStrategy; 2] = [Self::StructuredData, Self::RenderedHtml];

    pub fn name(self) -> &'static str {
        match self {
            Self::StructuredData => "structured-data",
            Self::RenderedHtml => "rendered-html",
        }
    }

    pub fn extract(self, document: &Html) -> Result<RatingRecord, ExtractMiss> {
        match self {
            Self::StructuredData => from_structured_data(document),
            Self::RenderedHtml => from_rendered_html(document),
        }
    }
}

impl fmt::Display for ExtractStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run every strategy in order against a page body.
pub fn extract_rating(html: &str) -> FetchOutcome {
    let document = Html::parse_document(html);
    let mut misses = Vec::new();

    for strategy in ExtractStrategy::ORDER {
        match strategy.extract(&document) {
            Ok(record) => {
                tracing::debug!(%strategy, value = record.value(), votes = record.votes(), "Extracted rating");
                return FetchOutcome::Found { record, strategy };
            }
            Err(reason) => {
                tracing::debug!(%strategy, %reason, "Extraction strategy missed");
                misses.push(StrategyMiss { strategy, reason });
            }
        }
    }

    FetchOutcome::NoData { misses }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LdNode {
    #[serde(default)]
    aggregate_rating: Option<LdAggregateRating>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LdAggregateRating {
    #[serde(default)]
    rating_value: Option<Value>,
    #[serde(default)]
    rating_count: Option<Value>,
}

fn from_structured_data(document: &Html) -> Result<RatingRecord, ExtractMiss> {
    let blocks: Vec<String> = document
        .select(&LD_JSON)
        .map(|script| script.text().collect())
        .collect();

    if blocks.is_empty() {
        return Err(ExtractMiss::NoStructuredData);
    }

    // Report the most specific failure if no block yields a rating.
    let mut miss = ExtractMiss::NoAggregateRating;

    for (index, block) in blocks.iter().enumerate() {
        let value: Value = match serde_json::from_str(block) {
            Ok(value) => value,
            Err(e) => {
                miss = ExtractMiss::MalformedStructuredData {
                    index,
                    message: e.to_string(),
                };
                continue;
            }
        };

        let candidates = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        for candidate in candidates {
            match aggregate_rating(candidate) {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => {}
                Err(e) => miss = ExtractMiss::Model(e),
            }
        }
    }

    Err(miss)
}

fn aggregate_rating(node: Value) -> Result<Option<RatingRecord>, ModelError> {
    let Ok(node) = serde_json::from_value::<LdNode>(node) else {
        return Ok(None);
    };
    let Some(rating) = node.aggregate_rating else {
        return Ok(None);
    };

    let value = rating.rating_value.as_ref().and_then(json_text);
    let count = rating.rating_count.as_ref().and_then(json_count);

    match (value, count) {
        (Some(value), Some(votes)) => RatingRecord::new(value, votes?).map(Some),
        _ => Ok(None),
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn json_count(value: &Value) -> Option<Result<u64, ModelError>> {
    match value {
        Value::Number(n) => Some(match (n.as_u64(), n.as_f64()) {
            (Some(count), _) => Ok(count),
            (None, Some(f)) if f.is_finite() && f >= 0.0 => Ok(f.trunc() as u64),
            _ => Err(ModelError::UnconvertibleVotes(n.to_string())),
        }),
        Value::String(s) if !s.trim().is_empty() => Some(normalize_votes(s)),
        _ => None,
    }
}

fn from_rendered_html(document: &Html) -> Result<RatingRecord, ExtractMiss> {
    let container = document
        .select(&SCORE_CONTAINER)
        .next()
        .ok_or(ExtractMiss::MissingElement("rating score"))?;

    let score = container
        .select(&SPAN)
        .next()
        .map(element_text)
        .ok_or(ExtractMiss::MissingElement("rating score value"))?;
    if score.is_empty() {
        return Err(ExtractMiss::EmptyElement("rating score value"));
    }

    // The vote count is rendered in a sibling right after the score block,
    // sometimes behind an empty spacer element.
    let siblings: Vec<ElementRef> = container
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .collect();
    if siblings.is_empty() {
        return Err(ExtractMiss::MissingElement("vote count"));
    }
    let votes_text = siblings
        .into_iter()
        .map(element_text)
        .find(|text| !text.is_empty())
        .ok_or(ExtractMiss::EmptyElement("vote count"))?;

    let votes = normalize_votes(&votes_text)?;
    Ok(RatingRecord::new(score, votes)?)
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
