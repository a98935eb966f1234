//! Input manager for loading documents and keyword lists

use crate::error::{Result, ZoneGapError};
use crate::input::document_reader::{parse_keywords, DocumentReader, JsonReader, TomlReader};
use crate::input::file_detector::FileType;
use crate::processing::document::Document;
use log::info;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

pub struct InputManager {
    cache: HashMap<String, Vec<Document>>,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// All documents held by one file. Documents without a url are named after the file.
    pub async fn load_file(&mut self, path: &Path) -> Result<Vec<Document>> {
        let path_str = path.to_string_lossy().to_string();

        if let Some(cached) = self.cache.get(&path_str) {
            info!("Using cached documents for: {}", path.display());
            return Ok(cached.clone());
        }

        if !path.exists() {
            return Err(ZoneGapError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let mut docs = match self.detect_file_type(path)? {
            FileType::Json => {
                info!("Reading JSON documents: {}", path.display());
                JsonReader.read(path).await?
            }
            FileType::Toml => {
                info!("Reading TOML document: {}", path.display());
                TomlReader.read(path).await?
            }
            FileType::Unknown => {
                return Err(ZoneGapError::UnsupportedFormat(format!(
                    "Unsupported document type for: {}",
                    path.display()
                )));
            }
        };

        let several = docs.len() > 1;
        for (i, doc) in docs.iter_mut().enumerate() {
            if doc.url.is_none() {
                doc.url = Some(if several {
                    format!("{}#{}", path_str, i + 1)
                } else {
                    path_str.clone()
                });
            }
        }

        self.cache.insert(path_str, docs.clone());

        Ok(docs)
    }

    /// Exactly one document from `path`
    pub async fn load_document(&mut self, path: &Path) -> Result<Document> {
        let mut docs = self.load_file(path).await?;
        if docs.len() != 1 {
            return Err(ZoneGapError::InvalidInput(format!(
                "Expected one document in {}, found {}",
                path.display(),
                docs.len()
            )));
        }
        Ok(docs.remove(0))
    }

    /// Documents from every path, in order. Array files contribute all their entries.
    pub async fn load_documents<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for path in paths {
            docs.extend(self.load_file(path.as_ref()).await?);
        }
        Ok(docs)
    }

    pub async fn load_keywords(&self, path: &Path) -> Result<Vec<String>> {
        if !path.exists() {
            return Err(ZoneGapError::InvalidInput(format!(
                "Keyword file does not exist: {}",
                path.display()
            )));
        }

        let keywords = parse_keywords(&fs::read_to_string(path).await?);
        info!("Loaded {} keywords from {}", keywords.len(), path.display());
        Ok(keywords)
    }

    fn detect_file_type(&self, path: &Path) -> Result<FileType> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ZoneGapError::InvalidInput(format!("File has no extension: {}", path.display()))
            })?;

        Ok(FileType::from_extension(extension))
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
