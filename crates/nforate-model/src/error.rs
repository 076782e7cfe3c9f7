use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid title identifier: '{0}' (expected \"tt\" followed by digits)")]
    InvalidTitleId(String),

    #[error("vote count not convertible: '{0}'")]
    UnconvertibleVotes(String),

    #[error("rating value is empty")]
    EmptyRatingValue,
}
