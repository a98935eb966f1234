//! Zone relevance: target zone vs. competitor centroid

use crate::error::Result;
use crate::processing::document::{Document, Zone};
use crate::processing::embeddings::{cosine_similarity, Embedding, EmbeddingProvider, TextEmbedder};
use crate::processing::text_processor::TextNormalizer;
use log::debug;
use std::collections::BTreeMap;

/// Zone name to cosine score. Zones without data on either side are omitted.
pub type ZoneRelevance = BTreeMap<Zone, f32>;

pub struct RelevanceScorer<'p> {
    embedder: TextEmbedder<'p>,
    normalizer: TextNormalizer,
    zones: Vec<Zone>,
}

impl<'p> RelevanceScorer<'p> {
    pub fn new(provider: &'p dyn EmbeddingProvider, zones: &[Zone], max_tokens: usize) -> Result<Self> {
        Ok(Self {
            embedder: TextEmbedder::new(provider, max_tokens)?,
            normalizer: TextNormalizer::new(),
            zones: zones.to_vec(),
        })
    }

    pub fn score(&self, target: &Document, competitors: &[Document]) -> Result<ZoneRelevance> {
        let mut results = ZoneRelevance::new();

        for &zone in &self.zones {
            let competitor_texts: Vec<String> = competitors
                .iter()
                .filter_map(|doc| doc.zone_text(zone))
                .map(|text| self.normalizer.normalize(&text))
                .collect();

            if competitor_texts.is_empty() {
                debug!("Skipping zone {}: no competitor data", zone);
                continue;
            }

            let Some(target_text) = target.zone_text(zone) else {
                debug!("Skipping zone {}: target has no data", zone);
                continue;
            };

            let competitor_embeddings = self.embedder.embed_many(&competitor_texts)?;
            let centroid = Embedding::mean(&competitor_embeddings)?;
            let target_embedding = self.embedder.embed(&self.normalizer.normalize(&target_text))?;

            let score = cosine_similarity(
                &target_embedding,
                &centroid,
                &format!("{}: target vs competitor centroid", zone),
            )?;
            debug!(
                "Zone {}: relevance {:.3} against {} competitors",
                zone,
                score,
                competitor_texts.len()
            );
            results.insert(zone, score);
        }

        Ok(results)
    }
}
