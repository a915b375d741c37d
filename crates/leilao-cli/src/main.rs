use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use leilao_core::{AppConfig, Catalog, ListingAdapter};
use leilao_llm::{ChatClient, GeneratedAdapter};
use leilao_pipeline::{DedupConfig, Pipeline, RunOptions, RunReport};
use leilao_scraper::{CentralSulAdapter, HttpFetcher};

#[derive(Debug, Parser)]
#[command(name = "leilao")]
#[command(about = "Brazilian real-estate auction listing crawler")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search live auction sources, falling back to generated listings.
    Search {
        /// Location query, e.g. "itapiruba". Defaults to the configured
        /// default query.
        query: Option<String>,
        /// Pretty-print the JSON report.
        #[arg(long)]
        pretty: bool,
    },
    /// Generate listings with the language model as the primary source.
    Generate {
        query: Option<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the supported locations.
    Locations,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = leilao_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Search { query, pretty }) => {
            let query = query.unwrap_or_else(|| config.default_query.clone());
            let report = run_pipeline(&config, &query, false).await?;
            print_report(&report, pretty)?;
        }
        Some(Commands::Generate { query, pretty }) => {
            let query = query.unwrap_or_else(|| config.default_query.clone());
            let report = run_pipeline(&config, &query, true).await?;
            print_report(&report, pretty)?;
        }
        Some(Commands::Locations) | None => {
            let catalog = Catalog::load(&config.locations_path)
                .with_context(|| format!("loading {}", config.locations_path.display()))?;
            for location in catalog.list_known() {
                let state = location.state.as_deref().unwrap_or("??");
                println!(
                    "{:<20} {} ({state})  aliases: {}",
                    location.key,
                    location.name,
                    location.aliases.join(", ")
                );
            }
        }
    }

    Ok(())
}

async fn run_pipeline(
    config: &AppConfig,
    query: &str,
    generated_primary: bool,
) -> anyhow::Result<RunReport> {
    let catalog = Arc::new(
        Catalog::load(&config.locations_path)
            .with_context(|| format!("loading {}", config.locations_path.display()))?,
    );

    let fetcher = HttpFetcher::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.fetch_max_retries,
        config.fetch_backoff_base_secs,
    )?;
    let central_sul: Arc<dyn ListingAdapter> =
        Arc::new(CentralSulAdapter::new(fetcher, config.fetch_descriptions));

    let generated: Option<Arc<dyn ListingAdapter>> = match config.llm_api_key.as_deref() {
        Some(api_key) => {
            let client = ChatClient::new(
                config.llm_api_url.clone(),
                api_key,
                config.llm_model.clone(),
                config.request_timeout_secs,
                config.llm_max_retries,
                config.llm_backoff_base_ms,
            )?;
            Some(Arc::new(GeneratedAdapter::new(
                client,
                config.max_generated_items,
            )))
        }
        None => {
            tracing::warn!("DEEPSEEK_API_KEY not set; generated listings are disabled");
            None
        }
    };

    if generated_primary && generated.is_none() {
        anyhow::bail!("DEEPSEEK_API_KEY is not set; cannot generate listings");
    }

    let options = RunOptions {
        rate_limit_retries: config.rate_limit_retries,
        rate_limit_backoff_ms: config.rate_limit_backoff_ms,
        deadline: Some(Duration::from_secs(config.run_deadline_secs)),
        generated_primary,
    };
    let dedup = DedupConfig {
        price_bucket: config.dedup_price_bucket,
        ..DedupConfig::default()
    };

    let pipeline = Pipeline::new(catalog, vec![central_sul], generated, dedup, options);
    let report = pipeline.run(query).await?;
    Ok(report)
}

fn print_report(report: &RunReport, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{json}");
    Ok(())
}
