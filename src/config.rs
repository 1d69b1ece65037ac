//! Configuration types.

use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum messages retained per user in the assistant history.
    /// The seeded system/context pair is always kept.
    pub history_max_messages: usize,
    /// Timeout for a single oracle invocation.
    pub oracle_timeout: Duration,
    /// Retries for transient oracle failures (rate limits, transport).
    pub oracle_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_max_messages: 40,
            oracle_timeout: Duration::from_secs(60),
            oracle_retries: 1,
        }
    }
}

impl EngineConfig {
    /// Build the config from environment variables, falling back to defaults.
    ///
    /// `INTAKE_ASSIST_HISTORY_LIMIT`, `INTAKE_ASSIST_ORACLE_TIMEOUT_SECS`,
    /// `INTAKE_ASSIST_ORACLE_RETRIES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            history_max_messages: env_parse(
                "INTAKE_ASSIST_HISTORY_LIMIT",
                defaults.history_max_messages,
            ),
            oracle_timeout: Duration::from_secs(env_parse(
                "INTAKE_ASSIST_ORACLE_TIMEOUT_SECS",
                defaults.oracle_timeout.as_secs(),
            )),
            oracle_retries: env_parse("INTAKE_ASSIST_ORACLE_RETRIES", defaults.oracle_retries),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert!(config.history_max_messages >= 4);
        assert!(config.oracle_timeout >= Duration::from_secs(1));
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        // Unset / unparsable values fall back to the provided default.
        assert_eq!(env_parse("INTAKE_ASSIST_DOES_NOT_EXIST", 7usize), 7);
    }
}
