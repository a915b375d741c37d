use std::path::PathBuf;

use rust_decimal::Decimal;

/// Application configuration, loaded once at process start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Path to the YAML location catalog.
    pub locations_path: PathBuf,
    pub default_query: String,

    // Web source.
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for transient network
    /// errors inside the fetcher.
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_secs: u64,
    /// Whether to fetch per-lot detail pages to enrich descriptions.
    pub fetch_descriptions: bool,

    // Orchestration.
    /// Additional attempts when a source reports it is rate limited.
    pub rate_limit_retries: u32,
    pub rate_limit_backoff_ms: u64,
    pub run_deadline_secs: u64,

    // Deduplication policy.
    pub dedup_price_bucket: Decimal,

    // Generated source.
    pub max_generated_items: usize,
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_max_retries: u32,
    pub llm_backoff_base_ms: u64,
}
