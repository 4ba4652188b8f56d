use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Serialize;

/// Default model served by a local Ollama install.
pub const DEFAULT_MODEL: &str = "llama3.1:8b";
/// Default Ollama base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_TOP_P: f32 = 0.9;
const DEFAULT_NUM_PREDICT: u32 = 700;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Per-invocation agent configuration. Immutable once built; the caller
/// constructs one per request (or loads it from the environment at startup).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub base_url: String,
    /// Sampling temperature, in `[0, 1]`.
    pub temperature: f32,
    /// Nucleus-sampling top-p, in `(0, 1]`.
    pub top_p: f32,
    /// Maximum tokens the model may generate per reply.
    pub num_predict: u32,
    /// Upper bound on a single chat round-trip.
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            num_predict: DEFAULT_NUM_PREDICT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AgentConfig {
    /// Loads configuration from `OLLAMA_*` environment variables, falling back
    /// to the defaults above for anything unset.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Self {
            model: env_or("OLLAMA_MODEL", DEFAULT_MODEL),
            base_url: env_or("OLLAMA_BASE_URL", DEFAULT_BASE_URL),
            temperature: parse_env("OLLAMA_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            top_p: parse_env("OLLAMA_TOP_P", DEFAULT_TOP_P)?,
            num_predict: parse_env("OLLAMA_NUM_PREDICT", DEFAULT_NUM_PREDICT)?,
            timeout: Duration::from_secs(parse_env(
                "OLLAMA_TIMEOUT_SECONDS",
                DEFAULT_TIMEOUT_SECS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the sampling ranges the chat endpoint expects.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.temperature),
            "OLLAMA_TEMPERATURE must be within [0, 1], got {}",
            self.temperature
        );
        ensure!(
            self.top_p > 0.0 && self.top_p <= 1.0,
            "OLLAMA_TOP_P must be within (0, 1], got {}",
            self.top_p
        );
        Ok(())
    }

    /// The sampling options sent on the wire and echoed back in the report.
    pub fn sampling(&self) -> SamplingParameters {
        SamplingParameters {
            temperature: self.temperature,
            top_p: self.top_p,
            num_predict: self.num_predict,
        }
    }
}

/// Sampling knobs, serialized as the `options` object of the chat request and
/// as the `parameters` field of the agent report.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SamplingParameters {
    pub temperature: f32,
    pub top_p: f32,
    pub num_predict: u32,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("environment variable '{key}' has an invalid value")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let config = AgentConfig::default();
        assert_eq!(config.model, "llama3.1:8b");
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.num_predict, 700);
        assert_eq!(config.timeout, Duration::from_secs(120));
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let config = AgentConfig {
            temperature: 1.5,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_p() {
        let config = AgentConfig {
            top_p: 0.0,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
