//! Environment configuration. The only place that reads process environment.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use cookbook_engine::{ConfigError, EngineSettings};

/// Loads `.env` if present, then reads the process environment.
pub fn from_env() -> Result<EngineSettings, ConfigError> {
    let _ = dotenvy::dotenv();
    from_lookup(|name| std::env::var(name).ok())
}

/// Builds settings from any variable source. Unset or blank values keep defaults.
pub fn from_lookup<F>(lookup: F) -> Result<EngineSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let mut settings = EngineSettings::default();

    if let Some(raw) = get("RATE_LIMIT_CALLS") {
        settings.rate_limit.calls = parse("RATE_LIMIT_CALLS", &raw)?;
    }
    if let Some(raw) = get("RATE_LIMIT_PERIOD") {
        settings.rate_limit.period = Duration::from_secs(parse("RATE_LIMIT_PERIOD", &raw)?);
    }
    if let Some(raw) = get("REQUEST_TIMEOUT") {
        settings.fetch.request_timeout = Duration::from_secs(parse("REQUEST_TIMEOUT", &raw)?);
    }
    if let Some(raw) = get("RETRY_ATTEMPTS") {
        settings.retry.max_attempts = parse("RETRY_ATTEMPTS", &raw)?;
    }
    if let Some(raw) = get("RETRY_BASE_DELAY_MS") {
        settings.retry.base_delay = Duration::from_millis(parse("RETRY_BASE_DELAY_MS", &raw)?);
    }
    if let Some(raw) = get("RETRY_MAX_DELAY_MS") {
        settings.retry.max_delay = Duration::from_millis(parse("RETRY_MAX_DELAY_MS", &raw)?);
    }
    if let Some(agent) = get("USER_AGENT") {
        settings.fetch.user_agent = agent;
    }
    if let Some(dir) = get("OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(dir);
    }

    settings.llm.api_key = get("OPENAI_API_KEY");
    if let Some(url) = get("OPENAI_BASE_URL") {
        settings.llm.base_url = url;
    }
    if let Some(model) = get("LLM_MODEL") {
        settings.llm.model = model;
    }
    if let Some(raw) = get("LLM_MAX_TOKENS") {
        settings.llm.max_tokens = parse("LLM_MAX_TOKENS", &raw)?;
    }
    if let Some(raw) = get("LLM_TEMPERATURE") {
        settings.llm.temperature = parse("LLM_TEMPERATURE", &raw)?;
    }

    if let Some(url) = get("N8N_BASE_URL") {
        settings.endpoints.n8n_base = url;
    }
    if let Some(url) = get("ZAPIER_BASE_URL") {
        settings.endpoints.zapier_base = url;
    }

    settings.validate()?;
    Ok(settings)
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}
