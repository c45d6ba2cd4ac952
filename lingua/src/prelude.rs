//! Common imports for lingua usage.
//!
//! ```
//! use lingua::prelude::*;
//! ```

pub use crate::client::{Client, ClientBuilder};
pub use crate::config::ClientConfig;
pub use crate::errors::Error;

pub use lingua_extraction::prelude::*;
pub use lingua_learning_context::{
    ContextHints, ExerciseRecord, HistoryQuery, HistorySource, LanguagePair,
    LearningContextCandidate, WordSelection,
};
