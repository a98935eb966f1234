//! Embedding providers and chunk-and-pool text embedding

use crate::error::{Result, ZoneGapError};
use crate::processing::text_processor::{word_count, Chunker};
use log::debug;
use model2vec_rs::model::StaticModel;
use std::path::Path;
use std::time::Instant;

/// Default dimension of the hashing vectorizer
pub const DEFAULT_HASHING_DIMENSIONS: usize = 256;

/// Fixed-dimension text vector. Only comparable with vectors from the same provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Elementwise arithmetic mean
    pub fn mean(embeddings: &[Embedding]) -> Result<Embedding> {
        let first = embeddings.first().ok_or_else(|| {
            ZoneGapError::Embedding("Cannot average an empty set of embeddings".to_string())
        })?;

        let mut sum = vec![0.0f32; first.dimensions()];
        for embedding in embeddings {
            if embedding.dimensions() != sum.len() {
                return Err(ZoneGapError::DimensionMismatch {
                    left: sum.len(),
                    right: embedding.dimensions(),
                });
            }
            for (acc, value) in sum.iter_mut().zip(&embedding.values) {
                *acc += value;
            }
        }

        let count = embeddings.len() as f32;
        sum.iter_mut().for_each(|x| *x /= count);
        Ok(Embedding::new(sum))
    }
}

/// Cosine similarity in [-1, 1].
///
/// A zero-norm vector has no direction, so the comparison fails with
/// `DegenerateEmbedding` naming `label` instead of returning a made-up score.
pub fn cosine_similarity(a: &Embedding, b: &Embedding, label: &str) -> Result<f32> {
    if a.dimensions() != b.dimensions() {
        return Err(ZoneGapError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }

    let norm_a = a.norm();
    let norm_b = b.norm();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ZoneGapError::DegenerateEmbedding(label.to_string()));
    }

    let dot_product: f32 = a.values.iter().zip(&b.values).map(|(x, y)| x * y).sum();
    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Maps text to vectors. Implementations must be deterministic, and batching
/// must give the same vectors as encoding one text at a time.
pub trait EmbeddingProvider {
    fn model_name(&self) -> &str;

    fn encode_many(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    fn encode(&self, text: &str) -> Result<Embedding> {
        self.encode_many(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| ZoneGapError::Embedding("Provider returned no embedding".to_string()))
    }
}

/// Model2Vec static embeddings
pub struct Model2VecProvider {
    model: StaticModel,
    model_name: String,
}

impl Model2VecProvider {
    /// Load from a local model directory or a HuggingFace repo id.
    pub fn load<P: AsRef<Path>>(source: P, model_name: &str) -> Result<Self> {
        let start_time = Instant::now();
        log::info!("Loading Model2Vec embedding model from: {}", source.as_ref().display());

        let model = StaticModel::from_pretrained(
            source.as_ref(),
            None, // token
            None, // normalize
            None, // subfolder
        )?;

        log::info!("Model loaded successfully in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: model_name.to_string(),
        })
    }
}

impl EmbeddingProvider for Model2VecProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn encode_many(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self.model.encode(texts);
        if vectors.len() != texts.len() {
            return Err(ZoneGapError::Embedding(format!(
                "Model returned {} embeddings for {} texts",
                vectors.len(),
                texts.len()
            )));
        }
        if vectors.iter().any(Vec::is_empty) {
            return Err(ZoneGapError::Embedding("Model returned an empty vector".to_string()));
        }

        Ok(vectors.into_iter().map(Embedding::new).collect())
    }
}

/// Bag-of-words feature hashing: each alphanumeric token adds 1.0 to bucket
/// `crc32(token) % dimensions`. Needs no model files.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimensions: usize,
    model_name: String,
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_HASHING_DIMENSIONS,
            model_name: format!("hashing-{}", DEFAULT_HASHING_DIMENSIONS),
        }
    }
}

impl HashingProvider {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(ZoneGapError::Configuration(
                "hashing_dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            dimensions,
            model_name: format!("hashing-{}", dimensions),
        })
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let mut values = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = crc32fast::hash(token.to_lowercase().as_bytes()) as usize % self.dimensions;
            values[bucket] += 1.0;
        }
        Embedding::new(values)
    }
}

impl EmbeddingProvider for HashingProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn encode_many(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

/// Embeds normalized text through a provider, pooling long text over chunks.
pub struct TextEmbedder<'p> {
    provider: &'p dyn EmbeddingProvider,
    chunker: Chunker,
}

impl<'p> TextEmbedder<'p> {
    pub fn new(provider: &'p dyn EmbeddingProvider, max_tokens: usize) -> Result<Self> {
        Ok(Self {
            provider,
            chunker: Chunker::new(max_tokens)?,
        })
    }

    /// Embed one text. Text longer than `max_tokens` words is encoded chunk by
    /// chunk in a single batch and mean-pooled.
    pub fn embed(&self, text: &str) -> Result<Embedding> {
        if self.chunker.needs_chunking(text) {
            self.embed_chunked(text)
        } else {
            self.provider.encode(text)
        }
    }

    /// Embed several texts, batching the short ones into one provider call.
    /// Output order matches input order.
    pub fn embed_many(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut slots: Vec<Option<Embedding>> = vec![None; texts.len()];
        let mut short_indices = Vec::new();
        let mut short_texts = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            if self.chunker.needs_chunking(text) {
                slots[i] = Some(self.embed_chunked(text)?);
            } else {
                short_indices.push(i);
                short_texts.push(text.clone());
            }
        }

        if !short_texts.is_empty() {
            let encoded = self.provider.encode_many(&short_texts)?;
            if encoded.len() != short_texts.len() {
                return Err(ZoneGapError::Embedding(format!(
                    "Provider returned {} embeddings for {} texts",
                    encoded.len(),
                    short_texts.len()
                )));
            }
            for (i, embedding) in short_indices.into_iter().zip(encoded) {
                slots[i] = Some(embedding);
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| ZoneGapError::Embedding("Missing embedding in batch".to_string()))
            })
            .collect()
    }

    fn embed_chunked(&self, text: &str) -> Result<Embedding> {
        let chunks: Vec<String> = self.chunker.chunks(text).collect();
        debug!(
            "Pooling {} words over {} chunks of <= {} words",
            word_count(text),
            chunks.len(),
            self.chunker.max_tokens()
        );
        let embeddings = self.provider.encode_many(&chunks)?;
        Embedding::mean(&embeddings)
    }
}
