//! CLI binary for labrank.

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use labrank::{DatasetEnhancer, EmbeddingProvider, EnhanceEvent, RankConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// labrank: relevance labels for LOINC lab-test records.
#[derive(Parser)]
#[command(name = "labrank", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Score the input folder and append results to the output table.
    Run {
        /// Input folder (overrides `input.dir`).
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output table (overrides `output.path`).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Score with the lexical sub-score only.
        #[arg(long)]
        no_embeddings: bool,
    },

    /// Write the default configuration file.
    InitConfig {
        /// Destination (defaults to the user config directory).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List the registered queries.
    Queries {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show per-record score breakdowns for one query and one file.
    Explain {
        /// Registered query text.
        #[arg(long)]
        query: String,
        /// Input file to score.
        #[arg(long)]
        file: PathBuf,
        /// Number of records to show.
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
        /// Score with the lexical sub-score only.
        #[arg(long)]
        no_embeddings: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so tables on stdout stay pipeable.
    let default_filter = if cli.verbose {
        "labrank=debug,hf_hub=warn,ort=warn"
    } else {
        "labrank=info,hf_hub=warn,ort=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Command::InitConfig { output } = &cli.command {
        return init_config(output.clone());
    }
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Run {
            input,
            output,
            no_embeddings,
        } => run(config, input, output, no_embeddings),
        Command::InitConfig { output } => init_config(output),
        Command::Queries { json } => list_queries(&config, json),
        Command::Explain {
            query,
            file,
            top,
            json,
            no_embeddings,
        } => explain(config, &query, file, top, json, no_embeddings),
    }
}

/// Explicit `--config` must exist; the default path is optional.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RankConfig> {
    let config = match path {
        Some(path) => RankConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let default_path = RankConfig::default_config_path();
            if default_path.exists() {
                RankConfig::from_file(&default_path)?
            } else {
                RankConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

fn run(
    mut config: RankConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    no_embeddings: bool,
) -> anyhow::Result<()> {
    if let Some(input) = input {
        config.input.dir = input;
    }
    if let Some(output) = output {
        config.output.path = output;
    }
    if no_embeddings {
        config.embedding.enabled = false;
    }

    let registry = config.registry()?;
    let provider = EmbeddingProvider::initialize(&config.embedding);

    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("  {msg} [{bar:30}] {pos}/{len} files") {
        pb.set_style(style.progress_chars("=> "));
    }
    let bar = pb.clone();
    let enhancer = DatasetEnhancer::new(config, registry, &provider).with_progress(Box::new(
        move |event| match event {
            EnhanceEvent::RunStarted { queries, files } => {
                bar.set_length((queries * files) as u64);
                bar.set_message("scoring");
            }
            EnhanceEvent::FileScored { query, .. } | EnhanceEvent::FileSkipped { query, .. } => {
                bar.set_message(query);
                bar.inc(1);
            }
            EnhanceEvent::ScoresNormalized { .. } => bar.set_message("normalising"),
            EnhanceEvent::ResultsPersisted { .. } => bar.set_message("written"),
        },
    ));

    let report = enhancer.run()?;
    pb.finish_and_clear();

    println!("Scored {} (query, file) pairs", report.files_scored);
    println!("Results scored:  {}", report.results_scored);
    println!("Results written: {}", report.results_written);
    if report.output_created {
        println!("Created output table");
    }
    if report.embedding_failures > 0 {
        println!("Embedding failures: {}", report.embedding_failures);
    }
    if !report.skipped.is_empty() {
        println!("\nSkipped:");
        for skipped in &report.skipped {
            println!(
                "  - [{}] {}: {}",
                skipped.query,
                skipped.file.display(),
                skipped.reason
            );
        }
    }
    Ok(())
}

fn init_config(output: Option<PathBuf>) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(RankConfig::default_config_path);
    RankConfig::default().save_to_file(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn list_queries(config: &RankConfig, json: bool) -> anyhow::Result<()> {
    let registry = config.registry()?;
    if json {
        let entries: Vec<_> = registry
            .iter()
            .map(|intent| {
                serde_json::json!({
                    "query": intent.query,
                    "component": intent.component,
                    "system": intent.system,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for intent in registry.iter() {
        println!("{:<28} component={:<14} system={}", intent.query, intent.component, intent.system);
    }
    Ok(())
}

fn explain(
    mut config: RankConfig,
    query: &str,
    file: PathBuf,
    top: usize,
    json: bool,
    no_embeddings: bool,
) -> anyhow::Result<()> {
    if no_embeddings {
        config.embedding.enabled = false;
    }
    let registry = config.registry()?;
    let provider = EmbeddingProvider::initialize(&config.embedding);
    let enhancer = DatasetEnhancer::new(config, registry, &provider);

    let mut breakdowns = enhancer.explain(query, &file)?;
    breakdowns.truncate(top);

    if json {
        println!("{}", serde_json::to_string_pretty(&breakdowns)?);
        return Ok(());
    }
    println!("{:<12} {:>12} {:>12} {:>12}", "LOINC", "lexical", "embedding", "total");
    for b in &breakdowns {
        println!(
            "{:<12} {:>12.3} {:>12.3} {:>12.3}",
            b.identifier, b.traditional, b.embedding, b.total
        );
    }
    Ok(())
}
