mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tickerscope_analysis::{
    AnalysisPipeline, NerClient, PipelineConfig, TeiClassifier, YahooSymbolLookup,
};
use tickerscope_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tickerscope-cli")]
#[command(about = "Run tickerscope sentiment and ticker analysis on JSON input")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score grouped texts: input is `[["text", ..], ..]`
    Sentiment {
        /// JSON file to read; stdin when omitted
        #[arg(long, short)]
        input: Option<PathBuf>,
    },
    /// Find ticker symbols for organizations mentioned in `["text", ..]`
    Tickers {
        /// JSON file to read; stdin when omitted
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Also print the extracted organization names
        #[arg(long)]
        with_organizations: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = tickerscope_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pipeline = build_pipeline(&config)?;

    let output = match cli.command {
        Commands::Sentiment { input } => {
            let raw = commands::read_input(input.as_deref())?;
            commands::run_sentiment(&pipeline, &raw).await?
        }
        Commands::Tickers {
            input,
            with_organizations,
        } => {
            let raw = commands::read_input(input.as_deref())?;
            commands::run_tickers(&pipeline, &raw, with_organizations).await?
        }
    };

    println!("{output}");
    Ok(())
}

fn build_pipeline(config: &AppConfig) -> anyhow::Result<AnalysisPipeline> {
    let timeout = config.http_timeout_secs;
    let agent = &config.user_agent;
    Ok(AnalysisPipeline::new(
        Arc::new(TeiClassifier::new(&config.classifier_url, timeout, agent)?),
        Arc::new(NerClient::new(&config.ner_url, timeout, agent)?),
        Arc::new(YahooSymbolLookup::new(&config.lookup_url, timeout, agent)?),
        PipelineConfig::from_app_config(config),
    ))
}
