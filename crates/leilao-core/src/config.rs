use rust_decimal::Decimal;

use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid. No variable is
/// strictly required: every knob has a default and the LLM key is optional.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default).to_lowercase();
        match raw.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected boolean, got '{other}'"),
            }),
        }
    };

    let parse_decimal = |var: &str, default: &str| -> Result<Decimal, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<Decimal>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("LEILAO_LOG_LEVEL", "info");
    let locations_path = PathBuf::from(or_default(
        "LEILAO_LOCATIONS_PATH",
        "./config/locations.yaml",
    ));
    let default_query = or_default("LEILAO_DEFAULT_QUERY", "itapiruba");

    let request_timeout_secs = parse_u64("LEILAO_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("LEILAO_USER_AGENT", "leilao/0.1 (auction-crawler)");
    let fetch_max_retries = parse_u32("LEILAO_FETCH_MAX_RETRIES", "3")?;
    let fetch_backoff_base_secs = parse_u64("LEILAO_FETCH_BACKOFF_BASE_SECS", "5")?;
    let fetch_descriptions = parse_bool("LEILAO_FETCH_DESCRIPTIONS", "true")?;

    let rate_limit_retries = parse_u32("LEILAO_RATE_LIMIT_RETRIES", "2")?;
    let rate_limit_backoff_ms = parse_u64("LEILAO_RATE_LIMIT_BACKOFF_MS", "1000")?;
    let run_deadline_secs = parse_u64("LEILAO_RUN_DEADLINE_SECS", "120")?;

    let dedup_price_bucket = parse_decimal("LEILAO_DEDUP_PRICE_BUCKET", "1000")?;

    let max_generated_items = parse_usize("LEILAO_MAX_GENERATED_ITEMS", "5")?;
    let llm_api_key = lookup("DEEPSEEK_API_KEY").ok().filter(|k| !k.is_empty());
    let llm_api_url = or_default(
        "DEEPSEEK_API_URL",
        "https://api.deepseek.com/v1/chat/completions",
    );
    let llm_model = or_default("DEEPSEEK_MODEL", "deepseek-chat");
    let llm_max_retries = parse_u32("DEEPSEEK_MAX_RETRIES", "2")?;
    let llm_backoff_base_ms = parse_u64("DEEPSEEK_BACKOFF_BASE_MS", "1000")?;

    Ok(AppConfig {
        log_level,
        locations_path,
        default_query,
        request_timeout_secs,
        user_agent,
        fetch_max_retries,
        fetch_backoff_base_secs,
        fetch_descriptions,
        rate_limit_retries,
        rate_limit_backoff_ms,
        run_deadline_secs,
        dedup_price_bucket,
        max_generated_items,
        llm_api_key,
        llm_api_url,
        llm_model,
        llm_max_retries,
        llm_backoff_base_ms,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_app_config_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.default_query, "itapiruba");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.user_agent, "leilao/0.1 (auction-crawler)");
        assert_eq!(cfg.fetch_max_retries, 3);
        assert_eq!(cfg.fetch_backoff_base_secs, 5);
        assert!(cfg.fetch_descriptions);
        assert_eq!(cfg.rate_limit_retries, 2);
        assert_eq!(cfg.rate_limit_backoff_ms, 1000);
        assert_eq!(cfg.run_deadline_secs, 120);
        assert_eq!(cfg.dedup_price_bucket, Decimal::from(1000));
        assert_eq!(cfg.max_generated_items, 5);
        assert!(cfg.llm_api_key.is_none());
        assert_eq!(cfg.llm_model, "deepseek-chat");
        assert_eq!(cfg.llm_max_retries, 2);
        assert_eq!(cfg.llm_backoff_base_ms, 1000);
    }

    #[test]
    fn build_app_config_overrides() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("LEILAO_REQUEST_TIMEOUT_SECS", "60");
        map.insert("LEILAO_FETCH_DESCRIPTIONS", "false");
        map.insert("LEILAO_DEDUP_PRICE_BUCKET", "500");
        map.insert("DEEPSEEK_API_KEY", "sk-test");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.request_timeout_secs, 60);
        assert!(!cfg.fetch_descriptions);
        assert_eq!(cfg.dedup_price_bucket, Decimal::from(500));
        assert_eq!(cfg.llm_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn build_app_config_rejects_invalid_number() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("LEILAO_REQUEST_TIMEOUT_SECS", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LEILAO_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_invalid_bool() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("LEILAO_FETCH_DESCRIPTIONS", "maybe");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LEILAO_FETCH_DESCRIPTIONS"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_empty_api_key_is_none() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("DEEPSEEK_API_KEY", "");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.llm_api_key.is_none());
    }

    #[test]
    fn build_app_config_rejects_invalid_bucket() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("LEILAO_DEDUP_PRICE_BUCKET", "one thousand");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "LEILAO_DEDUP_PRICE_BUCKET")
        );
    }
}
