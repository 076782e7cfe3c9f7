pub mod error;
pub mod rating;
pub mod title;
pub mod votes;

pub use error::*;
pub use rating::*;
pub use title::*;

/// Source name used for the identifier (`uniqueid[type]`) and the rating
/// entry (`rating[name]`) inside NFO documents.
pub const SOURCE_NAME: &str = "imdb";

/// Upper bound of the rating scale written to the `max` attribute.
pub const RATING_SCALE_MAX: u32 = 10;
