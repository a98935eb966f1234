//! CLI interface for the zone gap analyzer

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "zonegap")]
#[command(about = "Zone-level semantic relevance and content gap analysis")]
#[command(long_about = "Compare a page's zones (title, h1, subheadings, links, body text...) with top-ranking competitor pages using embeddings, and mine competitor fragments that match your keywords")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a page against competitor pages
    Analyze {
        /// Path to the target document (JSON, TOML)
        #[arg(short, long)]
        target: PathBuf,

        /// Competitor document; repeat for several, JSON arrays hold several pages
        #[arg(short = 'C', long = "competitor", required = true)]
        competitors: Vec<PathBuf>,

        /// Keyword file, one keyword per line
        #[arg(long)]
        keywords: Option<PathBuf>,

        /// Keyword given inline; may be repeated
        #[arg(short = 'k', long = "keyword")]
        keyword: Vec<String>,

        /// Comma separated zones to analyze
        #[arg(short, long)]
        zones: Option<String>,

        /// Fragments kept per zone
        #[arg(long)]
        top_n: Option<usize>,

        /// Minimum keyword similarity for a fragment
        #[arg(long, allow_negative_numbers = true)]
        min_sim: Option<f32>,

        /// Words per chunk before long texts are split
        #[arg(long)]
        max_tokens: Option<usize>,

        /// Embedding model to use
        #[arg(short, long)]
        embedding: Option<String>,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Write the recommendation prompt to this file ("-" for stdout)
        #[arg(short, long)]
        prompt: Option<PathBuf>,

        /// Ask for an ideal document structure in the prompt
        #[arg(long)]
        structure: bool,
    },

    /// Render a brief for a new page from competitor pages
    Brief {
        /// Competitor document; may be repeated
        #[arg(short = 'C', long = "competitor", required = true)]
        competitors: Vec<PathBuf>,

        /// Keyword file, one keyword per line
        #[arg(long)]
        keywords: Option<PathBuf>,

        /// Keyword given inline; may be repeated
        #[arg(short = 'k', long = "keyword")]
        keyword: Vec<String>,

        /// Write the brief to a file instead of stdout
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available embedding models
    List,

    /// Download a model
    Download {
        /// Model id, repo id or display name
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a downloaded model
    Remove {
        /// Model name to remove
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "analysis.top_n")
        key: String,

        /// Configuration value
        value: String,
    },
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::parse_from([
            "zonegap", "-v", "analyze", "--target", "me.json", "-C", "a.json", "-C", "b.json",
            "-k", "running shoes", "--min-sim", "-0.2", "--zones", "title,h1",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Analyze { competitors, keyword, min_sim, zones, .. } => {
                assert_eq!(competitors.len(), 2);
                assert_eq!(keyword, vec!["running shoes"]);
                assert_eq!(min_sim, Some(-0.2));
                assert_eq!(zones.as_deref(), Some("title,h1"));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("a.JSON"), &["json", "toml"]).is_ok());
        assert!(validate_file_extension(Path::new("a.pdf"), &["json", "toml"]).is_err());
        assert!(validate_file_extension(Path::new("noext"), &["json"]).is_err());
    }
}
