//! Configuration management for the zone gap analyzer

use crate::error::{Result, ZoneGapError};
use crate::processing::document::{parse_zone_list, Zone};
use crate::processing::embeddings::DEFAULT_HASHING_DIMENSIONS;
use crate::processing::text_processor::DEFAULT_MAX_TOKENS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub provider: ProviderKind,
    pub default_embedding_model: String,
    pub hashing_dimensions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Model2Vec,
    Hashing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub zones: Vec<Zone>,
    pub max_tokens: usize,
    pub top_n: usize,
    pub min_sim: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            zones: Zone::ALL.to_vec(),
            max_tokens: DEFAULT_MAX_TOKENS,
            top_n: 3,
            min_sim: 0.3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".zonegap")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                provider: ProviderKind::Model2Vec,
                default_embedding_model: "potion-multilingual-128M".to_string(),
                hashing_dimensions: DEFAULT_HASHING_DIMENSIONS,
            },
            analysis: AnalysisConfig::default(),
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
                pretty_json: true,
            },
        }
    }
}

impl Config {
    /// Load from `config_path`, writing defaults on first use
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ZoneGapError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ZoneGapError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("zonegap")
            .join("config.toml")
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if analysis.zones.is_empty() {
            return Err(ZoneGapError::Configuration("analysis.zones must not be empty".to_string()));
        }
        if analysis.max_tokens == 0 {
            return Err(ZoneGapError::Configuration(
                "analysis.max_tokens must be greater than zero".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&analysis.min_sim) {
            return Err(ZoneGapError::Configuration(format!(
                "analysis.min_sim must be within [-1, 1], got {}",
                analysis.min_sim
            )));
        }
        if self.models.provider == ProviderKind::Hashing && self.models.hashing_dimensions == 0 {
            return Err(ZoneGapError::Configuration(
                "models.hashing_dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Set a value by dotted key, e.g. `analysis.top_n`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value.trim().parse().map_err(|_| {
                ZoneGapError::Configuration(format!("Invalid value for {}: {}", key, value))
            })
        }

        let mut updated = self.clone();
        match key {
            "models.models_dir" => updated.models.models_dir = PathBuf::from(value),
            "models.provider" => updated.models.provider = parse_provider(value)?,
            "models.default_embedding_model" => {
                updated.models.default_embedding_model = value.to_string()
            }
            "models.hashing_dimensions" => updated.models.hashing_dimensions = parse(key, value)?,
            "analysis.zones" => updated.analysis.zones = parse_zone_list(value)?,
            "analysis.max_tokens" => updated.analysis.max_tokens = parse(key, value)?,
            "analysis.top_n" => updated.analysis.top_n = parse(key, value)?,
            "analysis.min_sim" => updated.analysis.min_sim = parse(key, value)?,
            "output.format" => {
                updated.output.format = parse_output_format(value).map_err(ZoneGapError::Configuration)?
            }
            "output.detailed" => updated.output.detailed = parse(key, value)?,
            "output.color_output" => updated.output.color_output = parse(key, value)?,
            "output.pretty_json" => updated.output.pretty_json = parse(key, value)?,
            _ => {
                return Err(ZoneGapError::Configuration(format!(
                    "Unknown configuration key: {}",
                    key
                )))
            }
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

pub fn parse_provider(value: &str) -> Result<ProviderKind> {
    match value.trim().to_lowercase().as_str() {
        "model2vec" => Ok(ProviderKind::Model2Vec),
        "hashing" => Ok(ProviderKind::Hashing),
        other => Err(ZoneGapError::Configuration(format!(
            "Invalid provider: {}. Supported: model2vec, hashing",
            other
        ))),
    }
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> std::result::Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!(
            "Invalid output format: {}. Supported: console, json, markdown",
            format
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.zones, Zone::ALL.to_vec());
        assert_eq!(config.analysis.max_tokens, 200);
        assert_eq!(config.analysis.top_n, 3);
        assert_eq!(config.analysis.min_sim, 0.3);
    }

    #[test]
    fn test_load_creates_then_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let mut changed = created.clone();
        changed.set_value("analysis.top_n", "5").unwrap();
        changed.set_value("analysis.zones", "h1,title").unwrap();
        changed.set_value("models.provider", "hashing").unwrap();
        changed.save_to(&path).unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, changed);
        assert_eq!(reloaded.analysis.zones, vec![Zone::H1, Zone::Title]);
        assert_eq!(reloaded.models.provider, ProviderKind::Hashing);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        assert!(config.set_value("analysis.min_sim", "1.5").is_err());
        assert!(config.set_value("analysis.max_tokens", "0").is_err());
        assert!(config.set_value("analysis.top_n", "many").is_err());
        assert!(config.set_value("analysis.zones", "footer").is_err());
        assert!(config.set_value("scoring.weight", "1").is_err());
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("MD").unwrap(), OutputFormat::Markdown);
        assert_eq!(parse_output_format("json").unwrap(), OutputFormat::Json);
        assert!(parse_output_format("pdf").is_err());
    }
}
