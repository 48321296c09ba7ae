use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:9002";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Settings for the outbound text-generation call.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub retry_delay: Duration,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub insight: InsightConfig,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// | Variable                 | Default                      |
    /// |--------------------------|------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:9002`             |
    /// | `ANTHROPIC_API_KEY`      | unset (insights disabled)    |
    /// | `ANTHROPIC_BASE_URL`     | `https://api.anthropic.com`  |
    /// | `INSIGHT_MODEL`          | `claude-sonnet-4-20250514`   |
    /// | `INSIGHT_MAX_TOKENS`     | `300`                        |
    /// | `INSIGHT_TIMEOUT_SECS`   | `15`                         |
    /// | `INSIGHT_RETRY_DELAY_MS` | `250`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match get(key) {
                None => Ok(default),
                Some(raw) => raw
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::InvalidNumber { key, value: raw }),
            }
        };

        let max_tokens = number("INSIGHT_MAX_TOKENS", u64::from(DEFAULT_MAX_TOKENS))?;
        let max_tokens = u32::try_from(max_tokens).map_err(|_| ConfigError::InvalidNumber {
            key: "INSIGHT_MAX_TOKENS",
            value: max_tokens.to_string(),
        })?;

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            insight: InsightConfig {
                api_key: get("ANTHROPIC_API_KEY"),
                base_url: get("ANTHROPIC_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: get("INSIGHT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens,
                timeout: Duration::from_secs(number("INSIGHT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
                retry_delay: Duration::from_millis(number(
                    "INSIGHT_RETRY_DELAY_MS",
                    DEFAULT_RETRY_DELAY_MS,
                )?),
            },
        })
    }
}
