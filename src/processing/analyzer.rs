//! Analysis engine running zone relevance and gap mining over one input set

use crate::config::{AnalysisConfig, Config, ProviderKind};
use crate::error::{Result, ZoneGapError};
use crate::output::report::{AnalysisReport, ReportMetadata, ZoneSummary};
use crate::processing::document::Document;
use crate::processing::embedding_manager::EmbeddingModelManager;
use crate::processing::embeddings::{EmbeddingProvider, HashingProvider, Model2VecProvider};
use crate::processing::gaps::{GapMiner, GapSettings};
use crate::processing::relevance::RelevanceScorer;
use log::info;
use std::time::Instant;

/// Owns the embedding provider for the lifetime of the caller's session.
pub struct AnalysisEngine {
    provider: Box<dyn EmbeddingProvider>,
    settings: AnalysisConfig,
}

impl AnalysisEngine {
    /// Build the provider named in the config. Model2Vec models are taken from
    /// the models directory when downloaded, otherwise fetched from the hub.
    pub async fn from_config(config: &Config, model_override: Option<&str>) -> Result<Self> {
        config.validate()?;

        let provider: Box<dyn EmbeddingProvider> = match config.models.provider {
            ProviderKind::Hashing => Box::new(HashingProvider::new(config.models.hashing_dimensions)?),
            ProviderKind::Model2Vec => {
                let model = model_override.unwrap_or(&config.models.default_embedding_model);
                let manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;
                let source = manager.model_source(model);
                let source_path = source.as_path().to_path_buf();
                let model_name = model.to_string();

                let provider = tokio::task::spawn_blocking(move || {
                    Model2VecProvider::load(&source_path, &model_name)
                })
                .await
                .map_err(|e| ZoneGapError::ModelLoading(format!("Model loading task failed: {}", e)))??;
                Box::new(provider)
            }
        };

        Ok(Self::with_provider(provider, config.analysis.clone()))
    }

    /// Use a caller-supplied provider
    pub fn with_provider(provider: Box<dyn EmbeddingProvider>, settings: AnalysisConfig) -> Self {
        Self { provider, settings }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Zone relevance and semantic gaps for `target` against `competitors`.
    pub fn analyze(
        &self,
        target: &Document,
        competitors: &[Document],
        keywords: &[String],
    ) -> Result<AnalysisReport> {
        let start_time = Instant::now();
        let settings = &self.settings;
        info!(
            "Analyzing {} zones against {} competitors with {}",
            settings.zones.len(),
            competitors.len(),
            self.provider.model_name()
        );

        let scorer = RelevanceScorer::new(self.provider.as_ref(), &settings.zones, settings.max_tokens)?;
        let zone_relevance = scorer.score(target, competitors)?;
        info!("Zone relevance computed for {} zones", zone_relevance.len());

        let miner = GapMiner::new(
            self.provider.as_ref(),
            &settings.zones,
            GapSettings {
                top_n: settings.top_n,
                min_sim: settings.min_sim,
                max_tokens: settings.max_tokens,
            },
        )?;
        let semantic_gaps = miner.mine(target, competitors, keywords)?;
        info!(
            "Semantic gaps mined: {} fragments kept",
            semantic_gaps.values().map(Vec::len).sum::<usize>()
        );

        let summary = ZoneSummary::from_relevance(&zone_relevance, &settings.zones);

        Ok(AnalysisReport {
            zone_relevance,
            semantic_gaps,
            summary,
            metadata: ReportMetadata {
                generated_at: chrono::Utc::now(),
                embedding_model: self.provider.model_name().to_string(),
                target: target.url.clone().unwrap_or_else(|| "target".to_string()),
                competitors: competitors.iter().enumerate().map(|(i, c)| c.identifier(i)).collect(),
                keywords: keywords.to_vec(),
                settings: settings.clone(),
                processing_time_ms: start_time.elapsed().as_millis() as u64,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::document::Zone;

    fn engine() -> AnalysisEngine {
        AnalysisEngine::with_provider(Box::new(HashingProvider::default()), AnalysisConfig::default())
    }

    #[test]
    fn test_analyze_end_to_end() {
        let target = Document::new("https://mine.example/shoes")
            .with_zone(Zone::Title, "Running shoes")
            .with_zone(Zone::H1, "Buy running shoes");
        let competitors = vec![
            Document::new("https://a.example")
                .with_zone(Zone::Title, "Running shoes for men and women")
                .with_zone(Zone::H1, "Buy running shoes")
                .with_zone(Zone::Subheadings, vec!["Trail running shoes", "Shoe size guide"]),
            Document::new("https://b.example").with_zone(Zone::Hrefs, vec!["running shoes sale"]),
        ];
        let keywords = vec!["running shoes".to_string()];

        let report = engine().analyze(&target, &competitors, &keywords).unwrap();

        assert!(report.zone_relevance.contains_key(&Zone::Title));
        assert!(report.zone_relevance.contains_key(&Zone::H1));
        assert!(!report.zone_relevance.contains_key(&Zone::Hrefs));
        assert!(!report.semantic_gaps[&Zone::Subheadings].is_empty());
        assert_eq!(report.metadata.competitors.len(), 2);
        assert_eq!(report.metadata.embedding_model, "hashing-256");
    }

    #[test]
    fn test_analyze_without_competitors() {
        let target = Document::new("mine").with_zone(Zone::Title, "running shoes");
        let report = engine()
            .analyze(&target, &[], &["running shoes".to_string()])
            .unwrap();
        assert!(report.zone_relevance.is_empty());
        assert!(report.semantic_gaps.is_empty());
    }

    #[tokio::test]
    async fn test_from_config_with_hashing_provider() {
        let mut config = Config::default();
        config.set_value("models.provider", "hashing").unwrap();
        config.set_value("models.hashing_dimensions", "64").unwrap();

        let engine = AnalysisEngine::from_config(&config, None).await.unwrap();
        assert_eq!(engine.model_name(), "hashing-64");
    }
}
