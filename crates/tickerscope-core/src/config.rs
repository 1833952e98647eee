use std::num::NonZeroUsize;

use crate::app_config::{
    AppConfig, BatchLimits, ConfidenceBand, DeterminationMode, DeviceClass, Environment,
};
use crate::ConfigError;

const DEFAULT_LOOKUP_URL: &str = "https://query2.finance.yahoo.com";
const DEFAULT_USER_AGENT: &str = "tickerscope/0.1 (news-analytics)";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn invalid(var: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.into(),
    }
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_non_zero = |var: &str, default: &str| -> Result<NonZeroUsize, ConfigError> {
        or_default(var, default)
            .parse::<NonZeroUsize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("TICKERSCOPE_ENV", "development"))?;
    let bind_addr = or_default("TICKERSCOPE_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("TICKERSCOPE_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("TICKERSCOPE_LOG_LEVEL", "info");

    let device = parse_device(&or_default("TICKERSCOPE_DEVICE", "cpu"))?;
    let default_cores = std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .to_string();
    let available_cores = parse_non_zero("TICKERSCOPE_AVAILABLE_CORES", &default_cores)?;

    let batch_limits = BatchLimits {
        sentiment_gpu: parse_non_zero("TICKERSCOPE_SENTIMENT_BATCH_SIZE_GPU", "128")?,
        sentiment_cpu: parse_non_zero("TICKERSCOPE_SENTIMENT_BATCH_SIZE_CPU", "32")?,
        ner_gpu: parse_non_zero("TICKERSCOPE_NER_BATCH_SIZE_GPU", "256")?,
        ner_cpu: parse_non_zero("TICKERSCOPE_NER_BATCH_SIZE_CPU", "16")?,
    };

    let sentiment_concurrency = parse_non_zero("TICKERSCOPE_SENTIMENT_CONCURRENCY", "1")?;
    let lookup_concurrency = parse_non_zero("TICKERSCOPE_LOOKUP_CONCURRENCY", "8")?;
    let lookup_max_retries = parse_u32("TICKERSCOPE_LOOKUP_MAX_RETRIES", "0")?;
    let lookup_retry_backoff_base_ms =
        parse_u64("TICKERSCOPE_LOOKUP_RETRY_BACKOFF_BASE_MS", "500")?;
    let lookup_retry_max_delay_ms =
        parse_u64("TICKERSCOPE_LOOKUP_RETRY_MAX_DELAY_MS", "5000")?;
    if lookup_retry_max_delay_ms < lookup_retry_backoff_base_ms {
        return Err(invalid(
            "TICKERSCOPE_LOOKUP_RETRY_MAX_DELAY_MS",
            "must not be below TICKERSCOPE_LOOKUP_RETRY_BACKOFF_BASE_MS",
        ));
    }

    let determination_mode =
        parse_determination_mode(&or_default("TICKERSCOPE_SENTIMENT_POLICY", "ternary"))?;
    let inconclusive_band = match lookup("TICKERSCOPE_INCONCLUSIVE_BAND") {
        Ok(raw) => parse_band(&raw)?,
        Err(_) => None,
    };

    let request_deadline_secs = parse_u64("TICKERSCOPE_REQUEST_DEADLINE_SECS", "120")?;
    if request_deadline_secs == 0 {
        return Err(invalid(
            "TICKERSCOPE_REQUEST_DEADLINE_SECS",
            "deadline must be at least one second",
        ));
    }
    let max_request_texts = parse_non_zero("TICKERSCOPE_MAX_REQUEST_TEXTS", "10000")?;

    let classifier_url = require("TICKERSCOPE_CLASSIFIER_URL")?;
    let ner_url = require("TICKERSCOPE_NER_URL")?;
    let lookup_url = or_default("TICKERSCOPE_LOOKUP_URL", DEFAULT_LOOKUP_URL);
    let http_timeout_secs = parse_u64("TICKERSCOPE_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("TICKERSCOPE_USER_AGENT", DEFAULT_USER_AGENT);
    let rate_limit_per_minute = parse_non_zero("TICKERSCOPE_RATE_LIMIT_PER_MINUTE", "120")?.get();

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        device,
        available_cores,
        batch_limits,
        sentiment_concurrency,
        lookup_concurrency,
        lookup_max_retries,
        lookup_retry_backoff_base_ms,
        lookup_retry_max_delay_ms,
        determination_mode,
        inconclusive_band,
        request_deadline_secs,
        max_request_texts,
        classifier_url,
        ner_url,
        lookup_url,
        http_timeout_secs,
        user_agent,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value is not recognized.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(invalid(
            "TICKERSCOPE_ENV",
            format!("expected development, test, or production; got '{other}'"),
        )),
    }
}

fn parse_device(s: &str) -> Result<DeviceClass, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "gpu" => Ok(DeviceClass::Gpu),
        "cpu" => Ok(DeviceClass::Cpu),
        other => Err(invalid(
            "TICKERSCOPE_DEVICE",
            format!("expected gpu or cpu; got '{other}'"),
        )),
    }
}

fn parse_determination_mode(s: &str) -> Result<DeterminationMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "ternary" => Ok(DeterminationMode::Ternary),
        "confidence_weighted" => Ok(DeterminationMode::ConfidenceWeighted),
        other => Err(invalid(
            "TICKERSCOPE_SENTIMENT_POLICY",
            format!("expected ternary or confidence_weighted; got '{other}'"),
        )),
    }
}

/// Parses `lower,upper`. An empty value or `none` disables the band.
fn parse_band(raw: &str) -> Result<Option<ConfidenceBand>, ConfigError> {
    const VAR: &str = "TICKERSCOPE_INCONCLUSIVE_BAND";

    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    let (lower, upper) = raw
        .split_once(',')
        .ok_or_else(|| invalid(VAR, format!("expected 'lower,upper'; got '{raw}'")))?;
    let parse_bound = |s: &str| -> Result<f64, ConfigError> {
        s.trim()
            .parse::<f64>()
            .map_err(|e| invalid(VAR, e.to_string()))
    };

    ConfidenceBand::new(parse_bound(lower)?, parse_bound(upper)?)
        .map(Some)
        .map_err(|reason| invalid(VAR, reason))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
