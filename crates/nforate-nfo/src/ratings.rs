//! IMDb identifier lookup and the rating merge.
//!
//! Kodi-style layout:
//!
//! ```xml
//! <movie>
//!   <uniqueid type="imdb" default="true">tt0111161</uniqueid>
//!   <ratings>
//!     <rating name="imdb" default="true" max="10">
//!       <value>9.3</value>
//!       <votes>2900000</votes>
//!     </rating>
//!   </ratings>
//! </movie>
//! ```

use std::path::Path;

use nforate_model::{RatingRecord, RATING_SCALE_MAX, SOURCE_NAME};

use crate::document::NfoDocument;
use crate::element::{Element, Layout};
use crate::error::NfoError;

const UNIQUEID: &str = "uniqueid";
const RATINGS: &str = "ratings";
const RATING: &str = "rating";
const VALUE: &str = "value";
const VOTES: &str = "votes";

/// A rating entry as found in a document, fields trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRating {
    pub value: String,
    pub votes: String,
}

impl ExistingRating {
    pub fn is_complete(&self) -> bool {
        !self.value.is_empty() && !self.votes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    /// A `<ratings>` container had to be created.
    pub created_container: bool,
    /// Number of previous IMDb entries dropped.
    pub replaced: usize,
}

/// Text of the first `<uniqueid type="imdb">`, trimmed. Not validated.
pub fn imdb_identifier(doc: &NfoDocument) -> Option<String> {
    doc.root()
        .find_descendant(&|e: &Element| e.name() == UNIQUEID && is_imdb(e, "type"))
        .map(|e| e.text().trim().to_string())
}

/// The IMDb entry of the root's `<ratings>`, if any.
pub fn imdb_rating(doc: &NfoDocument) -> Option<ExistingRating> {
    let rating = doc
        .root()
        .find_child(RATINGS)?
        .child_elements()
        .find(|e| is_imdb_rating(e))?;

    let field = |name: &str| {
        rating
            .find_child(name)
            .map(|e| e.text().trim().to_string())
            .unwrap_or_default()
    };

    Some(ExistingRating {
        value: field(VALUE),
        votes: field(VOTES),
    })
}

/// True when the document already carries both an IMDb value and vote count.
pub fn has_complete_rating(doc: &NfoDocument) -> bool {
    imdb_rating(doc).is_some_and(|rating| rating.is_complete())
}

/// Put `record` into the document as its only IMDb rating entry.
///
/// Previous IMDb entries are removed whole and the new one is appended at the
/// end of `<ratings>`, which is created under the root if missing. New lines
/// follow the indentation already used around them.
pub fn merge_rating(doc: &mut NfoDocument, record: &RatingRecord) -> MergeSummary {
    let layout = doc.layout();
    let root = doc.root_mut();

    let created_container = root.find_child(RATINGS).is_none();
    // The root starts at column 0, so its children sit one unit in.
    let ratings_indent = root
        .child_indent_of(RATINGS)
        .or_else(|| root.child_indent())
        .map_or_else(|| layout.nested(""), str::to_string);
    let ratings = root.child_or_append(RATINGS, "", &layout);

    let replaced = ratings.remove_children(is_imdb_rating);
    let rating_indent = ratings
        .child_indent()
        .map_or_else(|| layout.nested(&ratings_indent), str::to_string);
    ratings.append_indented(rating_element(record, &rating_indent, &layout), &ratings_indent, &layout);

    MergeSummary {
        created_container,
        replaced,
    }
}

/// Merge `record` and write the document back to `path`.
///
/// Takes the document by value; if the write fails it is dropped and the file
/// on disk is left as it was.
pub fn write_rating(
    mut doc: NfoDocument,
    record: &RatingRecord,
    path: &Path,
) -> Result<MergeSummary, NfoError> {
    let summary = merge_rating(&mut doc, record);
    doc.save(path)?;
    Ok(summary)
}

fn rating_element(record: &RatingRecord, indent: &str, layout: &Layout) -> Element {
    let mut rating = Element::new(RATING)
        .with_attribute("name", SOURCE_NAME)
        .with_attribute("default", "true")
        .with_attribute("max", &RATING_SCALE_MAX.to_string());

    rating.append_indented(Element::new(VALUE).with_text(record.value()), indent, layout);
    rating.append_indented(
        Element::new(VOTES).with_text(&record.votes().to_string()),
        indent,
        layout,
    );
    rating
}

fn is_imdb_rating(element: &Element) -> bool {
    element.name() == RATING && is_imdb(element, "name")
}

fn is_imdb(element: &Element, attribute: &str) -> bool {
    element.attribute(attribute).as_deref() == Some(SOURCE_NAME)
}
