pub mod extract;
pub mod imdb;
pub mod types;

pub use extract::ExtractStrategy;
pub use imdb::ImdbClient;
pub use types::*;
