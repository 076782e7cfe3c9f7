pub mod document;
pub mod element;
pub mod error;
pub mod ratings;

pub use document::{LineEnding, NfoDocument};
pub use element::{Element, Layout, Node};
pub use error::NfoError;
