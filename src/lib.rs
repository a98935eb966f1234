//! Zone-level semantic relevance and content gap analysis library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod llm;
pub mod output;

pub use error::{Result, ZoneGapError};
pub use config::Config;
pub use processing::document::{Document, Zone, ZoneValue};
pub use processing::embeddings::{EmbeddingProvider, HashingProvider};
pub use processing::gaps::{GapMiner, GapRecord, GapResult};
pub use processing::relevance::{RelevanceScorer, ZoneRelevance};
