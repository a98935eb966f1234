//! zonegap: zone-level semantic relevance and content gap analysis

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use zonegap::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use zonegap::config::{parse_output_format, AnalysisConfig, Config, ProviderKind};
use zonegap::input::InputManager;
use zonegap::llm::prompts::PromptTemplates;
use zonegap::output::formatter::{save_report_to_file, ReportGenerator};
use zonegap::processing::analyzer::AnalysisEngine;
use zonegap::processing::document::parse_zone_list;
use zonegap::processing::embedding_manager::EmbeddingModelManager;
use zonegap::{Result, ZoneGapError};

const DOCUMENT_EXTENSIONS: [&str; 2] = ["json", "toml"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

/// CLI overrides applied on top of the configured analysis settings
struct AnalysisOverrides {
    zones: Option<String>,
    top_n: Option<usize>,
    min_sim: Option<f32>,
    max_tokens: Option<usize>,
}

fn apply_overrides(settings: &mut AnalysisConfig, overrides: AnalysisOverrides) -> Result<()> {
    if let Some(zones) = overrides.zones {
        settings.zones = parse_zone_list(&zones)?;
    }
    if let Some(top_n) = overrides.top_n {
        settings.top_n = top_n;
    }
    if let Some(min_sim) = overrides.min_sim {
        settings.min_sim = min_sim;
    }
    if let Some(max_tokens) = overrides.max_tokens {
        settings.max_tokens = max_tokens;
    }
    Ok(())
}

async fn collect_keywords(
    input_manager: &InputManager,
    file: Option<&Path>,
    inline: Vec<String>,
) -> Result<Vec<String>> {
    let mut keywords = match file {
        Some(path) => input_manager.load_keywords(path).await?,
        None => Vec::new(),
    };
    keywords.extend(inline.into_iter().map(|k| k.trim().to_string()).filter(|k| !k.is_empty()));
    Ok(keywords)
}

fn validate_documents(paths: &[PathBuf], label: &str) -> Result<()> {
    for path in paths {
        cli::validate_file_extension(path, &DOCUMENT_EXTENSIONS)
            .map_err(|e| ZoneGapError::InvalidInput(format!("{} {}: {}", label, path.display(), e)))?;
    }
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn write_prompt(prompt: &str, destination: &Path) -> Result<()> {
    if destination == Path::new("-") {
        println!("\n{}", prompt);
    } else {
        save_report_to_file(prompt, destination)?;
        println!("📝 Prompt saved to: {}", destination.display());
    }
    Ok(())
}

async fn run_command(command: Commands, mut config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Analyze {
            target,
            competitors,
            keywords,
            keyword,
            zones,
            top_n,
            min_sim,
            max_tokens,
            embedding,
            detailed,
            output,
            save,
            prompt,
            structure,
        } => {
            info!("Starting zone relevance analysis");

            validate_documents(std::slice::from_ref(&target), "Target")?;
            validate_documents(&competitors, "Competitor")?;

            let output_format = match output {
                Some(format) => parse_output_format(&format).map_err(ZoneGapError::InvalidInput)?,
                None => config.output.format,
            };
            apply_overrides(
                &mut config.analysis,
                AnalysisOverrides { zones, top_n, min_sim, max_tokens },
            )?;
            config.validate()?;
            if detailed {
                config.output.detailed = true;
            }

            println!("🚀 Zone relevance analysis");
            println!("📄 Target: {}", target.display());
            println!("🏁 Competitor files: {}", competitors.len());
            println!("🔧 Output Format: {:?}", output_format);

            let mut input_manager = InputManager::new();
            let target_doc = input_manager.load_document(&target).await?;
            let competitor_docs = input_manager.load_documents(&competitors).await?;
            let keyword_list = collect_keywords(&input_manager, keywords.as_deref(), keyword).await?;

            println!("📚 Loaded {} competitor pages", competitor_docs.len());
            println!("🔑 Keywords: {}", keyword_list.len());
            if keyword_list.is_empty() {
                println!("⚠️  No keywords given, semantic gaps will be empty");
            }

            if config.models.provider == ProviderKind::Model2Vec {
                let model = embedding.as_deref().unwrap_or(&config.models.default_embedding_model);
                println!("🧠 Embedding Model: {}", model);
            }

            let engine = AnalysisEngine::from_config(&config, embedding.as_deref()).await?;

            let progress = spinner("Embedding zones and mining gaps...");
            let result = engine.analyze(&target_doc, &competitor_docs, &keyword_list);
            progress.finish_and_clear();
            let report = result?;

            let generator = ReportGenerator::from_config(&config.output);
            let rendered = generator.generate_report(&report, &output_format)?;
            println!("{}", rendered);

            if let Some(save_path) = save {
                save_report_to_file(&rendered, &save_path)?;
                println!("💾 Report saved to: {}", save_path.display());
            }

            if let Some(prompt_path) = prompt {
                let text = PromptTemplates::default().render_recommendations(
                    &report,
                    &target_doc,
                    &keyword_list,
                    structure,
                )?;
                write_prompt(&text, &prompt_path)?;
            }

            println!("\n✅ Analysis complete in {}ms", report.metadata.processing_time_ms);
        }

        Commands::Brief { competitors, keywords, keyword, save } => {
            validate_documents(&competitors, "Competitor")?;

            let mut input_manager = InputManager::new();
            let competitor_docs = input_manager.load_documents(&competitors).await?;
            let keyword_list = collect_keywords(&input_manager, keywords.as_deref(), keyword).await?;

            let brief = PromptTemplates::default().render_new_page_brief(&competitor_docs, &keyword_list)?;
            match save {
                Some(path) => write_prompt(&brief, &path)?,
                None => println!("{}", brief),
            }
        }

        Commands::Models { action } => {
            let mut manager = EmbeddingModelManager::new(config.models_dir().clone()).await?;

            match action {
                ModelAction::List => {
                    println!("📚 Available Embedding Models\n");
                    for (id, info) in manager.list_available_models() {
                        let status = if manager.is_model_downloaded(id) {
                            "✅ Downloaded"
                        } else {
                            "⬇️  Available"
                        };
                        let default_marker = if *id == config.models.default_embedding_model {
                            " (default)"
                        } else {
                            ""
                        };
                        println!("  • {}{} ({}) - {} MB [{}]", id, default_marker, info.repo_id, info.size_mb, status);
                        println!("    {}", info.description);
                    }
                    println!("\n💡 Download: zonegap models download <id>");
                }

                ModelAction::Download { model, force } => {
                    let model_id = manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| ZoneGapError::ModelNotFound(model.clone()))?;

                    if !force && manager.is_model_downloaded(&model_id) {
                        println!("✅ Model '{}' is already downloaded!", model_id);
                        println!("💡 Use --force to re-download");
                        return Ok(());
                    }

                    println!("⬇️  Downloading model: {}", model_id);
                    let progress = spinner("Fetching model files...");
                    let result = manager.download_model(&model_id, force).await;
                    progress.finish_and_clear();

                    let model_path = result?;
                    println!("✅ Model '{}' downloaded successfully!", model_id);
                    println!("📁 Location: {}", model_path.display());
                }

                ModelAction::Remove { model } => {
                    let model_id = manager.resolve_model_id(&model).unwrap_or(model);
                    if manager.remove_model(&model_id).await? {
                        println!("✅ Model '{}' removed successfully!", model_id);
                    } else {
                        println!("⚠️  Model '{}' is not downloaded", model_id);
                    }
                }

                ModelAction::Info { model } => {
                    let model_id = manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| ZoneGapError::ModelNotFound(model.clone()))?;
                    if let Some(info) = manager.get_model_info(&model_id) {
                        println!("🧠 {}", info.name);
                        println!("  • Id: {}", model_id);
                        println!("  • Repository: {}", info.repo_id);
                        println!("  • Size: {} MB", info.size_mb);
                        println!("  • Dimensions: {}", info.dimensions);
                        println!("  • Multilingual: {}", if info.multilingual { "yes" } else { "no" });
                        println!("  • {}", info.description);
                        match manager.get_model_path(&model_id) {
                            Some(path) => println!("  • Downloaded: {}", path.display()),
                            None => println!("  • Not downloaded"),
                        }
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("⚙️  Current Configuration\n");
                println!("Models Directory: {}", config.models_dir().display());
                println!("Provider: {:?}", config.models.provider);
                println!("Default Embedding Model: {}", config.models.default_embedding_model);
                println!("\nAnalysis:");
                let zones: Vec<&str> = config.analysis.zones.iter().map(|z| z.as_str()).collect();
                println!("  Zones: {}", zones.join(", "));
                println!("  Max tokens per chunk: {}", config.analysis.max_tokens);
                println!("  Top fragments per zone: {}", config.analysis.top_n);
                println!("  Minimum keyword similarity: {:.2}", config.analysis.min_sim);
                println!("\nOutput:");
                println!("  Format: {:?}", config.output.format);
                println!("  Detailed: {}", config.output.detailed);
                println!("  Colors: {}", config.output.color_output);
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                Config::default().save_to(config_path)?;
                println!("✅ Configuration reset successfully!");
            }

            Some(ConfigAction::Set { key, value }) => {
                config.set_value(&key, &value)?;
                config.save_to(config_path)?;
                println!("✅ {} = {}", key, value);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonegap::processing::document::Zone;

    #[test]
    fn test_apply_overrides() {
        let mut settings = AnalysisConfig::default();
        apply_overrides(
            &mut settings,
            AnalysisOverrides {
                zones: Some("title,text".to_string()),
                top_n: Some(5),
                min_sim: None,
                max_tokens: Some(50),
            },
        )
        .unwrap();

        assert_eq!(settings.zones, vec![Zone::Title, Zone::Text]);
        assert_eq!(settings.top_n, 5);
        assert_eq!(settings.min_sim, 0.3);
        assert_eq!(settings.max_tokens, 50);
    }

    #[test]
    fn test_bad_zone_override_is_rejected() {
        let mut settings = AnalysisConfig::default();
        let result = apply_overrides(
            &mut settings,
            AnalysisOverrides { zones: Some("footer".to_string()), top_n: None, min_sim: None, max_tokens: None },
        );
        assert!(result.is_err());
    }
}
