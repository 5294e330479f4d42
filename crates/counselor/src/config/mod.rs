use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::chances::UsageLimits;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub llm: LlmConfig,
    pub usage: UsageLimits,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timeout_secs = match non_empty("APP_LLM_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidNumber {
                    var: "APP_LLM_TIMEOUT_SECS",
                })?,
            None => LlmConfig::DEFAULT_TIMEOUT_SECS,
        };

        let llm = LlmConfig {
            api_key: non_empty("APP_LLM_API_KEY"),
            base_url: non_empty("APP_LLM_BASE_URL")
                .unwrap_or_else(|| LlmConfig::DEFAULT_BASE_URL.to_string()),
            fast_model: non_empty("APP_LLM_FAST_MODEL")
                .unwrap_or_else(|| LlmConfig::DEFAULT_FAST_MODEL.to_string()),
            deep_model: non_empty("APP_LLM_DEEP_MODEL")
                .unwrap_or_else(|| LlmConfig::DEFAULT_DEEP_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        let defaults = UsageLimits::default();
        let usage = UsageLimits {
            free: usage_limit("APP_USAGE_LIMIT_FREE", defaults.free)?,
            standard: usage_limit("APP_USAGE_LIMIT_STANDARD", defaults.standard)?,
            premium: usage_limit("APP_USAGE_LIMIT_PREMIUM", defaults.premium)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            llm,
            usage,
        })
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Unset keeps the default; `unlimited` removes the cap.
fn usage_limit(var: &'static str, default: Option<u32>) -> Result<Option<u32>, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(value) => {
            let value = value.trim();
            if value.is_empty() || value.eq_ignore_ascii_case("unlimited") {
                return Ok(None);
            }
            value
                .parse::<u32>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber { var })
        }
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Completion endpoint and model routing.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub fast_model: String,
    pub deep_model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_FAST_MODEL: &'static str = "gpt-4o-mini";
    pub const DEFAULT_DEEP_MODEL: &'static str = "gpt-4o";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("fast_model", &self.fast_model)
            .field("deep_model", &self.deep_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a positive whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LLM_API_KEY",
            "APP_LLM_BASE_URL",
            "APP_LLM_FAST_MODEL",
            "APP_LLM_DEEP_MODEL",
            "APP_LLM_TIMEOUT_SECS",
            "APP_USAGE_LIMIT_FREE",
            "APP_USAGE_LIMIT_STANDARD",
            "APP_USAGE_LIMIT_PREMIUM",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.llm.base_url, LlmConfig::DEFAULT_BASE_URL);
        assert_eq!(config.llm.deep_model, "gpt-4o");
        assert_eq!(config.llm.timeout, Duration::from_secs(60));
        assert_eq!(config.usage, UsageLimits::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn usage_limits_accept_overrides_and_unlimited() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_USAGE_LIMIT_FREE", "5");
        env::set_var("APP_USAGE_LIMIT_STANDARD", "unlimited");
        env::set_var("APP_USAGE_LIMIT_PREMIUM", "500");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.usage.free, Some(5));
        assert_eq!(config.usage.standard, None);
        assert_eq!(config.usage.premium, Some(500));
        reset_env();
    }

    #[test]
    fn rejects_malformed_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LLM_TIMEOUT_SECS", "soon");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { var }) => assert_eq!(var, "APP_LLM_TIMEOUT_SECS"),
            other => panic!("expected invalid number, got {other:?}"),
        }
        reset_env();
        env::set_var("APP_USAGE_LIMIT_FREE", "-1");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber { .. })
        ));
        reset_env();
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = LlmConfig {
            api_key: Some("sk-secret".to_string()),
            base_url: LlmConfig::DEFAULT_BASE_URL.to_string(),
            fast_model: LlmConfig::DEFAULT_FAST_MODEL.to_string(),
            deep_model: LlmConfig::DEFAULT_DEEP_MODEL.to_string(),
            timeout: Duration::from_secs(1),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
