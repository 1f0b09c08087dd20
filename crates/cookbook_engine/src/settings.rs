//! Immutable run configuration handed to every engine component.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },
    #[error("{name}: cannot parse '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{name} must be within {range}, got {value}")]
    OutOfRange {
        name: &'static str,
        range: &'static str,
        value: String,
    },
}

/// Sliding-window request budget: at most `calls` per `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub calls: u32,
    pub period: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            calls: 10,
            period: Duration::from_secs(60),
        }
    }
}

impl RateLimitSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.calls == 0 {
            return Err(ConfigError::NotPositive {
                name: "RATE_LIMIT_CALLS",
            });
        }
        if self.period.is_zero() {
            return Err(ConfigError::NotPositive {
                name: "RATE_LIMIT_PERIOD",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::NotPositive {
                name: "RETRY_ATTEMPTS",
            });
        }
        Ok(())
    }

    /// Delay before the attempt following failed attempt number `attempt` (1-based):
    /// `base_delay * 2^(attempt-1)`, capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exp)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 10 * 1024 * 1024,
            user_agent: "AutomationsCookbook/1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Tutorials are skipped when no key is configured.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

impl LlmSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::NotPositive {
                name: "LLM_MAX_TOKENS",
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::OutOfRange {
                name: "LLM_TEMPERATURE",
                range: "0.0..=2.0",
                value: self.temperature.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoints {
    pub n8n_base: String,
    pub zapier_base: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            n8n_base: "https://api.n8n.io".to_string(),
            zapier_base: "https://zapier.com".to_string(),
        }
    }
}

/// Everything a run needs, read once at process start.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub rate_limit: RateLimitSettings,
    pub retry: RetryPolicy,
    pub fetch: FetchSettings,
    pub llm: LlmSettings,
    pub endpoints: SourceEndpoints,
    pub output_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitSettings::default(),
            retry: RetryPolicy::default(),
            fetch: FetchSettings::default(),
            llm: LlmSettings::default(),
            endpoints: SourceEndpoints::default(),
            output_dir: PathBuf::from("data"),
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.llm.validate()?;
        if self.fetch.request_timeout.is_zero() {
            return Err(ConfigError::NotPositive {
                name: "REQUEST_TIMEOUT",
            });
        }
        Ok(())
    }
}
