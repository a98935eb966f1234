//! Document parsing from the supported file formats

use crate::error::{Result, ZoneGapError};
use crate::processing::document::Document;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

pub trait DocumentReader {
    fn read(&self, path: &Path) -> impl std::future::Future<Output = Result<Vec<Document>>> + Send;
}

/// One document per file, or a top-level array of documents
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocuments {
    Many(Vec<Document>),
    One(Document),
}

pub struct JsonReader;

impl DocumentReader for JsonReader {
    async fn read(&self, path: &Path) -> Result<Vec<Document>> {
        let content = fs::read_to_string(path).await?;
        let parsed: JsonDocuments = serde_json::from_str(&content).map_err(|e| {
            ZoneGapError::InvalidInput(format!("Failed to parse JSON document '{}': {}", path.display(), e))
        })?;

        Ok(match parsed {
            JsonDocuments::Many(docs) => docs,
            JsonDocuments::One(doc) => vec![doc],
        })
    }
}

pub struct TomlReader;

impl DocumentReader for TomlReader {
    async fn read(&self, path: &Path) -> Result<Vec<Document>> {
        let content = fs::read_to_string(path).await?;
        let doc: Document = toml::from_str(&content).map_err(|e| {
            ZoneGapError::InvalidInput(format!("Failed to parse TOML document '{}': {}", path.display(), e))
        })?;
        Ok(vec![doc])
    }
}

/// One keyword per line; blank lines are skipped
pub fn parse_keywords(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
