//! Report structures handed to formatters and to the recommendation prompt

use crate::config::AnalysisConfig;
use crate::processing::document::Zone;
use crate::processing::gaps::GapResult;
use crate::processing::relevance::ZoneRelevance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Zones at or above this relevance are reported as strong
pub const STRONG_ZONE_THRESHOLD: f32 = 0.75;
/// Zones below this relevance are reported as weak
pub const WEAK_ZONE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub zone_relevance: ZoneRelevance,
    pub semantic_gaps: GapResult,
    pub summary: ZoneSummary,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    /// Scored zones, weakest first
    pub ranked: Vec<(Zone, f32)>,
    pub strong_zones: Vec<Zone>,
    pub weak_zones: Vec<Zone>,
    /// Configured zones without a score (no data on one side)
    pub unscored_zones: Vec<Zone>,
    pub average_relevance: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub embedding_model: String,
    pub target: String,
    pub competitors: Vec<String>,
    pub keywords: Vec<String>,
    pub settings: AnalysisConfig,
    pub processing_time_ms: u64,
}

impl ZoneSummary {
    pub fn from_relevance(relevance: &ZoneRelevance, zones: &[Zone]) -> Self {
        let mut ranked: Vec<(Zone, f32)> = relevance.iter().map(|(zone, score)| (*zone, *score)).collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let strong_zones = ranked
            .iter()
            .rev()
            .filter(|(_, score)| *score >= STRONG_ZONE_THRESHOLD)
            .map(|(zone, _)| *zone)
            .collect();
        let weak_zones = ranked
            .iter()
            .filter(|(_, score)| *score < WEAK_ZONE_THRESHOLD)
            .map(|(zone, _)| *zone)
            .collect();
        let unscored_zones = zones
            .iter()
            .filter(|zone| !relevance.contains_key(zone))
            .copied()
            .collect();

        let average_relevance = if ranked.is_empty() {
            None
        } else {
            Some(ranked.iter().map(|(_, score)| score).sum::<f32>() / ranked.len() as f32)
        };

        Self {
            ranked,
            strong_zones,
            weak_zones,
            unscored_zones,
            average_relevance,
        }
    }
}
