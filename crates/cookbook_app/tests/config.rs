use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use cookbook_app::config::from_lookup;
use cookbook_engine::{ConfigError, EngineSettings};
use pretty_assertions::assert_eq;

fn settings(vars: &[(&str, &str)]) -> Result<EngineSettings, ConfigError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    from_lookup(|name| vars.get(name).cloned())
}

#[test]
fn empty_environment_gives_defaults() {
    let settings = settings(&[]).unwrap();

    assert_eq!(settings, EngineSettings::default());
    assert_eq!(settings.rate_limit.calls, 10);
    assert_eq!(settings.rate_limit.period, Duration::from_secs(60));
    assert_eq!(settings.fetch.request_timeout, Duration::from_secs(30));
    assert_eq!(settings.retry.max_attempts, 3);
    assert_eq!(settings.fetch.user_agent, "AutomationsCookbook/1.0");
    assert_eq!(settings.output_dir, PathBuf::from("data"));
    assert_eq!(settings.llm.model, "gpt-3.5-turbo");
    assert_eq!(settings.llm.max_tokens, 2000);
    assert_eq!(settings.llm.api_key, None);
}

#[test]
fn variables_override_defaults() {
    let settings = settings(&[
        ("RATE_LIMIT_CALLS", "5"),
        ("RATE_LIMIT_PERIOD", "10"),
        ("REQUEST_TIMEOUT", " 12 "),
        ("RETRY_ATTEMPTS", "4"),
        ("RETRY_BASE_DELAY_MS", "250"),
        ("USER_AGENT", "Test/2.0"),
        ("OUTPUT_DIR", "/tmp/cookbook"),
        ("OPENAI_API_KEY", "sk-test"),
        ("LLM_TEMPERATURE", "0.2"),
        ("N8N_BASE_URL", "http://localhost:9000"),
        ("ZAPIER_BASE_URL", ""),
    ])
    .unwrap();

    assert_eq!(settings.rate_limit.calls, 5);
    assert_eq!(settings.rate_limit.period, Duration::from_secs(10));
    assert_eq!(settings.fetch.request_timeout, Duration::from_secs(12));
    assert_eq!(settings.retry.max_attempts, 4);
    assert_eq!(settings.retry.base_delay, Duration::from_millis(250));
    assert_eq!(settings.fetch.user_agent, "Test/2.0");
    assert_eq!(settings.output_dir, PathBuf::from("/tmp/cookbook"));
    assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
    assert_eq!(settings.llm.temperature, 0.2);
    assert_eq!(settings.endpoints.n8n_base, "http://localhost:9000");
    assert_eq!(settings.endpoints.zapier_base, "https://zapier.com");
}

#[test]
fn unparseable_values_are_config_errors() {
    let err = settings(&[("RATE_LIMIT_CALLS", "ten")]).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            name: "RATE_LIMIT_CALLS",
            ..
        }
    ));

    assert!(settings(&[("RETRY_ATTEMPTS", "-1")]).is_err());
    assert!(settings(&[("LLM_TEMPERATURE", "warm")]).is_err());
}

#[test]
fn zero_and_out_of_range_values_are_rejected() {
    assert_eq!(
        settings(&[("RATE_LIMIT_CALLS", "0")]).unwrap_err(),
        ConfigError::NotPositive {
            name: "RATE_LIMIT_CALLS"
        }
    );
    assert_eq!(
        settings(&[("RATE_LIMIT_PERIOD", "0")]).unwrap_err(),
        ConfigError::NotPositive {
            name: "RATE_LIMIT_PERIOD"
        }
    );
    assert_eq!(
        settings(&[("RETRY_ATTEMPTS", "0")]).unwrap_err(),
        ConfigError::NotPositive {
            name: "RETRY_ATTEMPTS"
        }
    );
    assert!(matches!(
        settings(&[("LLM_TEMPERATURE", "2.5")]).unwrap_err(),
        ConfigError::OutOfRange {
            name: "LLM_TEMPERATURE",
            ..
        }
    ));
}
