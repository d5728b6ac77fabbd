//! Resume ranker: rank resumes against a job description by semantic similarity

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_ranker::cli::{self, Cli, Commands, ConfigAction, ModelAction};
use resume_ranker::config::Config;
use resume_ranker::error::{RankerError, Result};
use resume_ranker::input::file_detector::DocumentFormat;
use resume_ranker::input::manager::InputManager;
use resume_ranker::input::text_extractor::TextExtractor;
use resume_ranker::llm::model_manager::LlmModelManager;
use resume_ranker::llm::{SummaryKind, SummaryService};
use resume_ranker::output::formatter::{save_report_to_file, ReportGenerator};
use resume_ranker::output::report::{CandidateSummary, RankingReport};
use resume_ranker::processing::document::Document;
use resume_ranker::processing::embedding_manager::EmbeddingModelManager;
use resume_ranker::processing::embeddings::{Embedder, EmbeddingEngine};
use resume_ranker::processing::orchestrator::BatchOrchestrator;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

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

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Rank {
            job,
            resumes,
            output,
            save,
            summarize,
            summarize_top,
            role,
            detailed,
        } => {
            let output_format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(RankerError::InvalidInput)?,
                None => config.output.format,
            };

            let mut input_manager = InputManager::new();
            let job_text = input_manager.read_job_description(&job).await?;
            let documents = input_manager.load_documents(&resumes).await?;
            for skipped in input_manager.skipped() {
                eprintln!(
                    "{} {} (allowed: {})",
                    "Skipped".yellow(),
                    skipped.display(),
                    DocumentFormat::ALLOWED_EXTENSIONS.join(", ")
                );
            }

            check_batch(&job_text, &documents)?;

            let engine = with_spinner("Loading embedding model...", EmbeddingEngine::initialize(&config)).await?;
            let embedding_model = engine.model_name().to_string();
            let orchestrator = BatchOrchestrator::from_config(engine, &config);

            let outcome = with_spinner(
                &format!("Ranking {} resumes...", documents.len()),
                orchestrator.process(&job_text, documents),
            )
            .await?;

            let best = outcome.ranking.top(summarize_top.unwrap_or(0));
            let targets = summary_targets(&summarize, best.iter().map(|c| c.name.as_str()));
            let mut summaries = Vec::with_capacity(targets.len());
            if !targets.is_empty() {
                let mut service = SummaryService::from_config(&config).await;
                if let Some(role) = &role {
                    service = service.with_role(role);
                }
                for candidate in targets {
                    let summary = with_spinner(
                        &format!("Summarizing {}...", candidate),
                        service.summarize_candidate(&outcome.context, &candidate),
                    )
                    .await;
                    summaries.push(CandidateSummary { candidate, summary });
                }
            }

            let report = RankingReport::new(
                outcome.batch_id,
                &embedding_model,
                &outcome.ranking.candidates,
                &outcome.diagnostics,
                outcome.ranking.artifact.clone(),
                outcome.elapsed_ms,
            )
            .with_summaries(summaries);

            let use_colors = config.output.color_output && save.is_none();
            let rendered = ReportGenerator::with_options(use_colors, detailed, true)
                .generate_report(&report, &output_format)?;

            match save {
                Some(path) => {
                    save_report_to_file(&rendered, &path)?;
                    println!("Report saved to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Summarize { resume, job, role } => {
            cli::validate_file_extension(&resume, &DocumentFormat::ALLOWED_EXTENSIONS)
                .map_err(|e| RankerError::InvalidInput(format!("Resume file: {}", e)))?;

            let input_manager = InputManager::new();
            let document = input_manager.load_document(&resume).await?;
            let resume_text = TextExtractor::new().extract_or_empty(&document);

            let (kind, job_text) = match &job {
                Some(path) => (SummaryKind::Full, input_manager.read_job_description(path).await?),
                None => (SummaryKind::Quick, String::new()),
            };

            let mut service = SummaryService::from_config(&config).await;
            if let Some(role) = &role {
                service = service.with_role(role);
            }
            let summary = with_spinner(
                &format!("Summarizing {}...", document.display_name()),
                service.summarize(kind, &resume_text, &job_text),
            )
            .await;

            println!("{}\n", document.display_name().bold());
            println!("{}", summary);
        }

        Commands::Models { action } => run_models(action, &config).await?,

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let content = toml::to_string_pretty(&config)
                    .map_err(|e| RankerError::Configuration(format!("Failed to serialize config: {}", e)))?;
                println!("# {}\n", config_path.display());
                println!("{}", content);
            }
            Some(ConfigAction::Reset) => {
                Config::default().save_to(config_path)?;
                info!("Configuration reset to defaults");
                println!("Configuration reset: {}", config_path.display());
            }
            Some(ConfigAction::Path) => println!("{}", config_path.display()),
        },
    }

    Ok(())
}

async fn run_models(action: ModelAction, config: &Config) -> Result<()> {
    let mut embeddings = EmbeddingModelManager::new(config.models_dir().clone()).await?;
    let mut llms = LlmModelManager::new(config.models_dir()).await?;

    match action {
        ModelAction::List { embeddings: only_embeddings, llms: only_llms } => {
            if !only_llms {
                println!("{}", "Embedding Models:".bold());
                for (id, info) in embeddings.list_available_models() {
                    let status = download_status(embeddings.is_model_downloaded(id));
                    let default = if *id == config.models.embedding_model { " (configured)" } else { "" };
                    println!("  {}{} - {} ({} MB, {} dims) [{}]", id, default, info.repo_id, info.size_mb, info.dimensions, status);
                    println!("    {}", info.description);
                }
                println!();
            }
            if !only_embeddings {
                println!("{}", "Chat Models:".bold());
                for (id, info) in llms.list_available_models() {
                    let status = download_status(llms.is_model_downloaded(id));
                    println!("  {} - {} ({:.1} GB) [{}]", id, info.repo_id, info.size_mb as f64 / 1024.0, status);
                    println!("    {}", info.description);
                }
            }
        }

        ModelAction::Download { model, force } => {
            let path = if let Some(id) = embeddings.resolve_model_id(&model) {
                with_spinner(&format!("Downloading {}...", id), embeddings.download_model(&id, force)).await?
            } else if llms.get_model_info(&model).is_some() {
                with_spinner(&format!("Downloading {}...", model), llms.download_model(&model, force)).await?
            } else {
                return Err(RankerError::InvalidInput(format!(
                    "Unknown model '{}'; run `resume-ranker models list`",
                    model
                )));
            };
            println!("{} {}", "Model ready:".green(), path.display());
        }

        ModelAction::Info { model } => {
            if let Some(id) = embeddings.resolve_model_id(&model) {
                if let Some(info) = embeddings.get_model_info(&id) {
                    println!("Name: {}", info.name);
                    println!("Repository: {}", info.repo_id);
                    println!("Kind: embedding ({} dimensions)", info.dimensions);
                    println!("Size: {} MB", info.size_mb);
                    println!("Description: {}", info.description);
                    print_location(embeddings.get_model_path(&id));
                }
            } else if let Some(info) = llms.get_model_info(&model) {
                println!("Name: {}", info.name);
                println!("Repository: {}", info.repo_id);
                println!("Kind: chat model");
                println!("Size: {} MB", info.size_mb);
                println!("Description: {}", info.description);
                print_location(llms.get_model_path(&model));
            } else {
                return Err(RankerError::InvalidInput(format!("Unknown model '{}'", model)));
            }
        }
    }

    Ok(())
}

/// Reject a batch that cannot be ranked before any model is loaded.
fn check_batch(job_text: &str, documents: &[Document]) -> Result<()> {
    if job_text.trim().is_empty() {
        return Err(RankerError::InvalidInput("job description is empty".to_string()));
    }
    if documents.is_empty() {
        return Err(RankerError::InvalidInput(format!(
            "no resume files left to rank (allowed: {})",
            DocumentFormat::ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

/// Explicit `--summarize` names first, then the best-ranked names, without repeats.
fn summary_targets<'a>(named: &[String], best: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for name in named.iter().cloned().chain(best.map(str::to_string)) {
        if !targets.contains(&name) {
            targets.push(name);
        }
    }
    targets
}

async fn with_spinner<F: std::future::Future>(message: &str, future: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = future.await;
    spinner.finish_and_clear();
    output
}

fn download_status(downloaded: bool) -> String {
    if downloaded {
        "downloaded".green().to_string()
    } else {
        "available".dimmed().to_string()
    }
}

fn print_location(path: Option<PathBuf>) {
    match path {
        Some(path) => println!("Location: {}", path.display()),
        None => println!("Status: not downloaded"),
    }
}
