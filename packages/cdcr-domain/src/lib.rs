//! Core value types for imitation-learned clustering search.

pub mod beam;
pub mod document;
pub mod grid;
pub mod metrics;
pub mod parameter;
pub mod partition;
pub mod state;

mod error;

pub use beam::Beam;
pub use document::{Corpus, Document};
pub use error::{Error, Result};
pub use grid::descending_grid;
pub use metrics::{CorefScorer, Prf, Score, Scorer};
pub use parameter::Parameter;
pub use partition::{ClusterId, ItemId, Partition};
pub use state::{MergeAction, SearchState};
