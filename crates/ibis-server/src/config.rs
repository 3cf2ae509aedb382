// ABOUTME: Configuration loading and validation for the ibis server.
// ABOUTME: Reads IBIS_* environment variables with sensible defaults and validates them up front.

use std::net::SocketAddr;

use thiserror::Error;

use ibis_core::config::DEFAULT_MAX_STEPS;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IBIS_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("IBIS_MAX_STEPS is not a valid positive integer: {0}")]
    InvalidMaxSteps(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub provider: String,
    pub model: Option<String>,
    pub max_steps: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - IBIS_BIND: socket address to bind (default: 127.0.0.1:8000)
    /// - IBIS_PROVIDER: LLM provider (default: gemini)
    /// - IBIS_MODEL: LLM model name (optional)
    /// - IBIS_MAX_STEPS: per-request step limit (default: 16)
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_str =
            std::env::var("IBIS_BIND").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let provider = std::env::var("IBIS_PROVIDER")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "gemini".to_string());

        let model = std::env::var("IBIS_MODEL").ok().filter(|m| !m.is_empty());

        let max_steps = match std::env::var("IBIS_MAX_STEPS") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidMaxSteps(raw))?,
            Err(_) => DEFAULT_MAX_STEPS,
        };

        Ok(Self {
            bind,
            provider,
            model,
            max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serialize all tests that read/write env vars to prevent race conditions.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        // SAFETY: test-only code, serialized by ENV_MUTEX
        unsafe {
            std::env::remove_var("IBIS_BIND");
            std::env::remove_var("IBIS_PROVIDER");
            std::env::remove_var("IBIS_MODEL");
            std::env::remove_var("IBIS_MAX_STEPS");
        }
    }

    #[test]
    fn config_loads_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.bind, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.provider, "gemini");
        assert!(config.model.is_none());
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
    }

    #[test]
    fn config_rejects_invalid_bind() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_MUTEX
        unsafe { std::env::set_var("IBIS_BIND", "not-an-address") };

        let result = ServerConfig::from_env();

        unsafe { std::env::remove_var("IBIS_BIND") };

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBind(_)));
        assert!(err.to_string().contains("not-an-address"));
    }

    #[test]
    fn config_rejects_zero_max_steps() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_MUTEX
        unsafe { std::env::set_var("IBIS_MAX_STEPS", "0") };

        let result = ServerConfig::from_env();

        unsafe { std::env::remove_var("IBIS_MAX_STEPS") };

        assert!(matches!(result, Err(ConfigError::InvalidMaxSteps(_))));
    }

    #[test]
    fn config_reads_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        // SAFETY: test-only code, serialized by ENV_MUTEX
        unsafe {
            std::env::set_var("IBIS_BIND", "0.0.0.0:9001");
            std::env::set_var("IBIS_PROVIDER", "anthropic");
            std::env::set_var("IBIS_MAX_STEPS", "32");
        }

        let config = ServerConfig::from_env().unwrap();

        clear_env();

        assert_eq!(config.bind, "0.0.0.0:9001".parse::<SocketAddr>().unwrap());
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.max_steps, 32);
    }
}
