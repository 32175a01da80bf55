//! # parley-cli
//!
//! Command-line interface for Parley.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use parley_compare::Orchestrator;
use parley_core::{error::format_error_with_suggestion, Config};

mod commands;
mod output;

use output::OutputFormat;

/// Application context containing shared state.
pub struct AppContext {
    pub config: Config,
    pub orchestrator: Orchestrator,
}

/// Parley - send one query to many language models and compare the answers
#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file as well
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query a single provider
    Query(QueryArgs),
    /// Query several providers and model types and compare the answers
    Compare(CompareArgs),
    /// List providers with credentials and their models
    Providers,
    /// Show catalog details for one provider
    Models {
        /// Provider name (openai, anthropic, huggingface)
        provider: String,
    },
    /// Estimate tokens and check context-window fit
    Tokens(TokensArgs),
    /// Diagnose configuration and credentials
    Doctor,
}

#[derive(Args)]
struct QueryArgs {
    /// Query text
    query: String,

    /// Provider to use
    #[arg(short, long, default_value = "openai")]
    provider: String,

    /// Model type (base, instruct, fine-tuned)
    #[arg(short = 't', long, default_value = "instruct")]
    model_type: String,

    /// Explicit model name (defaults to the catalog default for the type)
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum tokens to generate
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
    output: OutputFormat,

    /// Save the result (.json or .md)
    #[arg(short, long, value_name = "FILE")]
    save: Option<PathBuf>,
}

#[derive(Args)]
struct CompareArgs {
    /// Query text
    query: String,

    /// Providers to compare (comma-separated)
    #[arg(long, value_delimiter = ',')]
    providers: Vec<String>,

    /// Model types to compare (comma-separated)
    ///
    /// Every listed type must have a model for every queried provider;
    /// otherwise the run stops before any request is sent. Anthropic has no
    /// base or fine-tuned model.
    #[arg(long, value_delimiter = ',')]
    model_types: Vec<String>,

    /// Send all requests at once instead of one after another
    #[arg(long)]
    concurrent: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
    output: OutputFormat,

    /// Save the results (.json or .md)
    #[arg(short, long, value_name = "FILE")]
    save: Option<PathBuf>,
}

#[derive(Args)]
struct TokensArgs {
    /// Text to analyze
    text: String,

    /// Provider whose tokenizer to use
    #[arg(short, long, default_value = "openai")]
    provider: String,

    /// Model whose context window to check against
    #[arg(short, long)]
    model: Option<String>,

    /// Context window to check against
    #[arg(long, value_name = "N")]
    context_window: Option<usize>,

    /// Truncate the text to at most N tokens
    #[arg(long, value_name = "N")]
    truncate: Option<usize>,
}

fn init_logging(verbose: bool, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(level)
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_validated(cli.config.as_deref())?;
    let orchestrator = Orchestrator::from_config(&config)?;
    tracing::debug!(
        providers = ?orchestrator.registry().list_available(),
        dispatch = ?orchestrator.dispatch(),
        "Configuration loaded"
    );
    let ctx = AppContext {
        config,
        orchestrator,
    };

    match cli.command {
        Commands::Query(args) => commands::query::run(args, &ctx).await?,
        Commands::Compare(args) => commands::compare::run(args, &ctx).await?,
        Commands::Providers => commands::providers::run(&ctx)?,
        Commands::Models { provider } => commands::models::run(&provider, &ctx)?,
        Commands::Tokens(args) => commands::tokens::run(args, &ctx)?,
        Commands::Doctor => commands::doctor::run(&ctx, cli.config.as_deref())?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_compare_help_warns_about_missing_model_types() {
        let mut cmd = Cli::command();
        let compare = cmd
            .find_subcommand_mut("compare")
            .expect("compare subcommand");
        let help = compare.render_long_help().to_string();
        assert!(help.contains("stops before any request is sent"));
        assert!(help.contains("Anthropic has no base or fine-tuned model"));
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = Config::load(cli.config.as_deref())
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "warn".to_string());
    init_logging(cli.verbose, &level);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<parley_core::Error>() {
            Some(err) => eprintln!("Error: {}", format_error_with_suggestion(err)),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}
