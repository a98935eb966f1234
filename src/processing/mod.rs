//! Text processing, embeddings and zone analysis

pub mod document;
pub mod text_processor;
pub mod embeddings;
pub mod embedding_manager;
pub mod relevance;
pub mod gaps;
pub mod analyzer;
