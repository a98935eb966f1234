//! Semantic gap mining over competitor fragments

use crate::error::{Result, ZoneGapError};
use crate::processing::document::{Document, Zone};
use crate::processing::embeddings::{cosine_similarity, Embedding, EmbeddingProvider, TextEmbedder};
use crate::processing::text_processor::TextNormalizer;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One competitor fragment that is close to the keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapRecord {
    /// Competitor identifier (URL when known)
    pub competitor: String,
    /// Normalized fragment text
    pub fragment: String,
    /// Fragment vs keywords
    pub keywords_sim: f32,
    /// Target's own zone vs keywords, 0.0 when the target lacks the zone
    pub my_doc_kw_sim: f32,
    /// Fragment vs target's own zone, 0.0 when the target lacks the zone
    pub my_doc_sim_zone: f32,
    /// Fragment vs the whole target document
    pub my_doc_sim_full: f32,
}

/// Per zone, at most `top_n` records sorted by descending `keywords_sim`.
pub type GapResult = BTreeMap<Zone, Vec<GapRecord>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapSettings {
    pub top_n: usize,
    pub min_sim: f32,
    pub max_tokens: usize,
}

impl Default for GapSettings {
    fn default() -> Self {
        Self {
            top_n: 3,
            min_sim: 0.3,
            max_tokens: 200,
        }
    }
}

pub struct GapMiner<'p> {
    embedder: TextEmbedder<'p>,
    normalizer: TextNormalizer,
    zones: Vec<Zone>,
    settings: GapSettings,
}

impl<'p> GapMiner<'p> {
    pub fn new(provider: &'p dyn EmbeddingProvider, zones: &[Zone], settings: GapSettings) -> Result<Self> {
        if !(-1.0..=1.0).contains(&settings.min_sim) {
            return Err(ZoneGapError::Configuration(format!(
                "min_sim must be within [-1, 1], got {}",
                settings.min_sim
            )));
        }

        Ok(Self {
            embedder: TextEmbedder::new(provider, settings.max_tokens)?,
            normalizer: TextNormalizer::new(),
            zones: zones.to_vec(),
            settings,
        })
    }

    pub fn mine(&self, target: &Document, competitors: &[Document], keywords: &[String]) -> Result<GapResult> {
        let mut results = GapResult::new();
        if competitors.is_empty() {
            return Ok(results);
        }

        let keyword_text = self.normalizer.normalize(&keywords.join(" "));
        if keyword_text.is_empty() {
            warn!("Keyword list is empty; no fragment can match, skipping gap mining");
            for &zone in &self.zones {
                results.insert(zone, Vec::new());
            }
            return Ok(results);
        }
        let keyword_embedding = self.embedder.embed(&keyword_text)?;

        let full_text = self.normalizer.normalize(&target.full_text(&self.zones));
        let target_doc_embedding = self.embedder.embed(&full_text)?;

        for &zone in &self.zones {
            let records = self.mine_zone(
                zone,
                target,
                competitors,
                &keyword_embedding,
                &target_doc_embedding,
            )?;
            debug!("Zone {}: {} gap candidates kept", zone, records.len());
            results.insert(zone, records);
        }

        Ok(results)
    }

    fn mine_zone(
        &self,
        zone: Zone,
        target: &Document,
        competitors: &[Document],
        keyword_embedding: &Embedding,
        target_doc_embedding: &Embedding,
    ) -> Result<Vec<GapRecord>> {
        let target_text = target.zone_text(zone).map(|text| self.normalizer.normalize(&text));
        // embedded on first surviving fragment only
        let mut target_zone: Option<(Embedding, f32)> = None;
        let mut records = Vec::new();

        for (position, competitor) in competitors.iter().enumerate() {
            let fragments: Vec<String> = competitor
                .zone_fragments(zone)
                .iter()
                .map(|fragment| self.normalizer.normalize(fragment))
                .collect();
            if fragments.is_empty() {
                continue;
            }

            let identifier = competitor.identifier(position);
            let fragment_embeddings = self.embedder.embed_many(&fragments)?;

            for (fragment, fragment_embedding) in fragments.into_iter().zip(fragment_embeddings) {
                let keywords_sim = cosine_similarity(
                    &fragment_embedding,
                    keyword_embedding,
                    &format!("{}: fragment of {} vs keywords", zone, identifier),
                )?;
                if keywords_sim < self.settings.min_sim {
                    continue;
                }

                let (my_doc_kw_sim, my_doc_sim_zone) = match &target_text {
                    Some(text) => {
                        let cached = match target_zone.take() {
                            Some(cached) => cached,
                            None => {
                                let embedding = self.embedder.embed(text)?;
                                let kw_sim = cosine_similarity(
                                    &embedding,
                                    keyword_embedding,
                                    &format!("{}: target zone vs keywords", zone),
                                )?;
                                (embedding, kw_sim)
                            }
                        };
                        let (zone_embedding, kw_sim) = &*target_zone.insert(cached);
                        let zone_sim = cosine_similarity(
                            &fragment_embedding,
                            zone_embedding,
                            &format!("{}: fragment of {} vs target zone", zone, identifier),
                        )?;
                        (*kw_sim, zone_sim)
                    }
                    None => (0.0, 0.0),
                };

                let my_doc_sim_full = cosine_similarity(
                    &fragment_embedding,
                    target_doc_embedding,
                    &format!("{}: fragment of {} vs target document", zone, identifier),
                )?;

                records.push(GapRecord {
                    competitor: identifier.clone(),
                    fragment,
                    keywords_sim,
                    my_doc_kw_sim,
                    my_doc_sim_zone,
                    my_doc_sim_full,
                });
            }
        }

        records.sort_by(|a, b| b.keywords_sim.total_cmp(&a.keywords_sim));
        records.truncate(self.settings.top_n);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::embeddings::HashingProvider;
    use std::collections::HashMap;

    /// Returns preset vectors for known texts and a fixed fallback otherwise.
    struct FixedProvider {
        vectors: HashMap<String, Vec<f32>>,
        fallback: Vec<f32>,
    }

    impl EmbeddingProvider for FixedProvider {
        fn model_name(&self) -> &str {
            "fixed"
        }

        fn encode_many(&self, texts: &[String]) -> Result<Vec<Embedding>> {
            Ok(texts
                .iter()
                .map(|t| Embedding::new(self.vectors.get(t).cloned().unwrap_or_else(|| self.fallback.clone())))
                .collect())
        }
    }

    /// Unit vector whose cosine with [1, 0] is `sim`
    fn at(sim: f32) -> Vec<f32> {
        vec![sim, (1.0 - sim * sim).sqrt()]
    }

    fn scenario_provider() -> FixedProvider {
        let mut vectors = HashMap::new();
        vectors.insert("running shoes".to_string(), vec![1.0, 0.0]);
        vectors.insert("high".to_string(), at(0.9));
        vectors.insert("low".to_string(), at(0.1));
        vectors.insert("mid".to_string(), at(0.5));
        FixedProvider {
            vectors,
            fallback: vec![0.0, 1.0],
        }
    }

    fn keywords() -> Vec<String> {
        vec!["Running".to_string(), "Shoes".to_string()]
    }

    #[test]
    fn test_threshold_and_top_n() {
        let provider = scenario_provider();
        let settings = GapSettings {
            top_n: 2,
            min_sim: 0.3,
            max_tokens: 200,
        };
        let miner = GapMiner::new(&provider, &[Zone::Subheadings], settings).unwrap();
        let target = Document::new("mine").with_zone(Zone::Title, "my page");
        let competitors = vec![
            Document::new("a").with_zone(Zone::Subheadings, vec!["High", "Low"]),
            Document::new("b").with_zone(Zone::Subheadings, "MID"),
        ];

        let result = miner.mine(&target, &competitors, &keywords()).unwrap();
        let records = &result[&Zone::Subheadings];

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fragment, "high");
        assert_eq!(records[0].competitor, "a");
        assert_eq!(records[1].fragment, "mid");
        assert_eq!(records[1].competitor, "b");
        assert!((records[0].keywords_sim - 0.9).abs() < 1e-5);
        assert!((records[1].keywords_sim - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_missing_target_zone_falls_back_to_zero() {
        let provider = scenario_provider();
        let miner = GapMiner::new(&provider, &[Zone::H1, Zone::Title], GapSettings::default()).unwrap();
        let target = Document::new("mine").with_zone(Zone::Title, "my page");
        let competitors = vec![Document::new("a").with_zone(Zone::H1, "high")];

        let result = miner.mine(&target, &competitors, &keywords()).unwrap();
        let record = &result[&Zone::H1][0];
        assert_eq!(record.my_doc_kw_sim, 0.0);
        assert_eq!(record.my_doc_sim_zone, 0.0);
        // target doc falls back to [0, 1]
        assert!((record.my_doc_sim_full - at(0.9)[1]).abs() < 1e-5);
        assert!(result[&Zone::Title].is_empty());
    }

    #[test]
    fn test_present_target_zone_scores() {
        let provider = scenario_provider();
        let miner = GapMiner::new(&provider, &[Zone::H1], GapSettings::default()).unwrap();
        let target = Document::new("mine").with_zone(Zone::H1, "Mid");
        let competitors = vec![Document::new("a").with_zone(Zone::H1, "high")];

        let result = miner.mine(&target, &competitors, &keywords()).unwrap();
        let record = &result[&Zone::H1][0];
        let high = at(0.9);
        let mid = at(0.5);
        assert!((record.my_doc_kw_sim - 0.5).abs() < 1e-5);
        assert!((record.my_doc_sim_zone - (high[0] * mid[0] + high[1] * mid[1])).abs() < 1e-5);
        // full text is just the h1
        assert!((record.my_doc_sim_full - record.my_doc_sim_zone).abs() < 1e-6);
    }

    #[test]
    fn test_every_zone_present_even_when_empty() {
        let provider = HashingProvider::default();
        let miner = GapMiner::new(&provider, &Zone::ALL, GapSettings::default()).unwrap();
        let target = Document::new("mine").with_zone(Zone::Title, "running shoes");
        let competitors = vec![Document::new("a").with_zone(Zone::Title, "running shoes for men")];

        let result = miner.mine(&target, &competitors, &keywords()).unwrap();
        assert_eq!(result.len(), Zone::ALL.len());
        assert_eq!(result[&Zone::Title].len(), 1);
        assert!(result[&Zone::Hrefs].is_empty());
    }

    #[test]
    fn test_ranking_invariants_hold() {
        let provider = HashingProvider::default();
        let settings = GapSettings {
            top_n: 3,
            min_sim: 0.1,
            max_tokens: 4,
        };
        let miner = GapMiner::new(&provider, &Zone::ALL, settings).unwrap();
        let target = Document::new("mine")
            .with_zone(Zone::Title, "trail running shoes")
            .with_zone(Zone::Text, "we sell shoes for road and trail running in every size");
        let competitors = vec![
            Document::new("a").with_zone(
                Zone::Subheadings,
                vec!["running shoes", "shoe sizes", "trail running", "returns policy", "shoes"],
            ),
            Document::new("b").with_zone(
                Zone::Structures,
                vec!["running shoes size chart for men and women", "free delivery"],
            ),
        ];

        let result = miner.mine(&target, &competitors, &keywords()).unwrap();
        for records in result.values() {
            assert!(records.len() <= settings.top_n);
            assert!(records.windows(2).all(|w| w[0].keywords_sim >= w[1].keywords_sim));
            for record in records {
                assert!(record.keywords_sim >= settings.min_sim);
                for score in [
                    record.keywords_sim,
                    record.my_doc_kw_sim,
                    record.my_doc_sim_zone,
                    record.my_doc_sim_full,
                ] {
                    assert!((-1.0..=1.0).contains(&score));
                }
            }
        }
        assert!(!result[&Zone::Subheadings].is_empty());
    }

    #[test]
    fn test_no_competitors_gives_empty_mapping() {
        let provider = HashingProvider::default();
        let miner = GapMiner::new(&provider, &Zone::ALL, GapSettings::default()).unwrap();
        let target = Document::new("mine").with_zone(Zone::Title, "running shoes");
        assert!(miner.mine(&target, &[], &keywords()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_keywords_is_not_an_error() {
        let provider = HashingProvider::default();
        let miner = GapMiner::new(&provider, &Zone::ALL, GapSettings::default()).unwrap();
        let target = Document::new("mine").with_zone(Zone::Title, "running shoes");
        let competitors = vec![Document::new("a").with_zone(Zone::Title, "running shoes")];

        let result = miner.mine(&target, &competitors, &[]).unwrap();
        assert_eq!(result.len(), Zone::ALL.len());
        assert!(result.values().all(Vec::is_empty));
    }

    #[test]
    fn test_min_sim_must_be_a_valid_cosine() {
        let provider = HashingProvider::default();
        for min_sim in [f32::NAN, 1.5, -1.01, f32::INFINITY] {
            let settings = GapSettings {
                min_sim,
                ..GapSettings::default()
            };
            let err = GapMiner::new(&provider, &Zone::ALL, settings).err();
            assert!(matches!(err, Some(ZoneGapError::Configuration(_))), "accepted {}", min_sim);
        }

        let settings = GapSettings {
            min_sim: -1.0,
            ..GapSettings::default()
        };
        assert!(GapMiner::new(&provider, &Zone::ALL, settings).is_ok());
    }

    #[test]
    fn test_long_fragments_and_zones_are_mean_pooled() {
        let provider = HashingProvider::default();
        let settings = GapSettings {
            top_n: 5,
            min_sim: -1.0,
            max_tokens: 2,
        };
        let miner = GapMiner::new(&provider, &[Zone::Subheadings], settings).unwrap();
        let target = Document::new("mine").with_zone(Zone::Subheadings, "Best Running Shoes Online");
        let competitors = vec![Document::new("a").with_zone(Zone::Subheadings, vec!["Trail Running Shoes Sale"])];

        let result = miner.mine(&target, &competitors, &keywords()).unwrap();
        let records = &result[&Zone::Subheadings];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fragment, "trail running shoes sale");

        let encode = |text: &str| provider.encode(text).unwrap();
        let keyword_embedding = encode("running shoes");
        let fragment_embedding = Embedding::mean(&[encode("trail running"), encode("shoes sale")]).unwrap();
        let zone_embedding = Embedding::mean(&[encode("best running"), encode("shoes online")]).unwrap();

        let expected_kw = cosine_similarity(&fragment_embedding, &keyword_embedding, "kw").unwrap();
        let expected_my_kw = cosine_similarity(&zone_embedding, &keyword_embedding, "my kw").unwrap();
        let expected_zone = cosine_similarity(&fragment_embedding, &zone_embedding, "zone").unwrap();

        assert!((records[0].keywords_sim - expected_kw).abs() < 1e-6);
        assert!((records[0].my_doc_kw_sim - expected_my_kw).abs() < 1e-6);
        assert!((records[0].my_doc_sim_zone - expected_zone).abs() < 1e-6);
        // single zone, so the whole document is the same pooled text
        assert!((records[0].my_doc_sim_full - expected_zone).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_fragment_is_fatal() {
        let provider = HashingProvider::default();
        let miner = GapMiner::new(&provider, &[Zone::Hrefs], GapSettings::default()).unwrap();
        let target = Document::new("mine").with_zone(Zone::Title, "running shoes");
        let competitors = vec![Document::new("a").with_zone(Zone::Hrefs, vec!["→ →"])];

        let err = miner.mine(&target, &competitors, &keywords()).unwrap_err();
        assert!(matches!(err, ZoneGapError::DegenerateEmbedding(_)));
    }
}
