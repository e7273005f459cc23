pub mod fragment;
mod model;
mod store;

pub use model::{Highlight, Region};
pub use store::HighlightStore;
