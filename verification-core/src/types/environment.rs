//! Engine configuration with environment variable overrides

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default poll cadence in milliseconds
const DEFAULT_POLL_PERIOD_MS: u64 = 3000;
/// Default poll ceiling while waiting for the wallet connection (~2 minutes)
const DEFAULT_CONNECTION_TIMEOUT_TICKS: u32 = 40;
/// Default poll ceiling while waiting for the proof presentation (~3 minutes)
const DEFAULT_PROOF_TIMEOUT_TICKS: u32 = 60;
/// Default absolute session lifetime in seconds
const DEFAULT_SESSION_TTL_SECS: u64 = 600;
/// Default host event channel capacity
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration for the verification engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cadence of the recurring poll for each session
    pub poll_period: Duration,
    /// Delay before the first poll of a new session
    pub initial_delay: Duration,
    /// Poll ceiling while waiting for the wallet connection
    pub connection_timeout_ticks: u32,
    /// Poll ceiling while waiting for the proof presentation
    pub proof_timeout_ticks: u32,
    /// Absolute wall-clock session lifetime, the backstop beyond the
    /// per-stage ceilings
    pub session_ttl: Duration,
    /// Capacity of the host event channel
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_millis(DEFAULT_POLL_PERIOD_MS),
            initial_delay: Duration::from_millis(DEFAULT_POLL_PERIOD_MS),
            connection_timeout_ticks: DEFAULT_CONNECTION_TIMEOUT_TICKS,
            proof_timeout_ticks: DEFAULT_PROOF_TIMEOUT_TICKS,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration from `SSI_*` environment variables, falling
    /// back to the defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let poll_period_ms = env_parse("SSI_POLL_PERIOD_MS", DEFAULT_POLL_PERIOD_MS);

        Self {
            poll_period: Duration::from_millis(poll_period_ms),
            initial_delay: Duration::from_millis(env_parse(
                "SSI_INITIAL_DELAY_MS",
                poll_period_ms,
            )),
            connection_timeout_ticks: env_parse(
                "SSI_CONNECTION_TIMEOUT_TICKS",
                DEFAULT_CONNECTION_TIMEOUT_TICKS,
            ),
            proof_timeout_ticks: env_parse("SSI_PROOF_TIMEOUT_TICKS", DEFAULT_PROOF_TIMEOUT_TICKS),
            session_ttl: Duration::from_secs(env_parse(
                "SSI_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )),
            event_capacity: env_parse("SSI_EVENT_CAPACITY", DEFAULT_EVENT_CAPACITY),
        }
    }
}

/// Reads and parses an environment variable, falling back to `default`.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn defaults_match_the_documented_cadence() {
        env::remove_var("SSI_POLL_PERIOD_MS");
        env::remove_var("SSI_INITIAL_DELAY_MS");
        env::remove_var("SSI_CONNECTION_TIMEOUT_TICKS");
        env::remove_var("SSI_PROOF_TIMEOUT_TICKS");
        env::remove_var("SSI_SESSION_TTL_SECS");

        let config = EngineConfig::from_env();

        assert_eq!(config.poll_period, Duration::from_secs(3));
        assert_eq!(config.initial_delay, Duration::from_secs(3));
        assert_eq!(config.connection_timeout_ticks, 40);
        assert_eq!(config.proof_timeout_ticks, 60);
        assert_eq!(config.session_ttl, Duration::from_secs(600));
    }

    #[test]
    #[serial]
    fn environment_overrides_are_applied() {
        env::set_var("SSI_POLL_PERIOD_MS", "500");
        env::set_var("SSI_CONNECTION_TIMEOUT_TICKS", "10");

        let config = EngineConfig::from_env();

        assert_eq!(config.poll_period, Duration::from_millis(500));
        // The initial delay follows the poll period unless set explicitly.
        assert_eq!(config.initial_delay, Duration::from_millis(500));
        assert_eq!(config.connection_timeout_ticks, 10);

        env::remove_var("SSI_POLL_PERIOD_MS");
        env::remove_var("SSI_CONNECTION_TIMEOUT_TICKS");
    }

    #[test]
    #[serial]
    fn unparsable_values_fall_back_to_defaults() {
        env::set_var("SSI_PROOF_TIMEOUT_TICKS", "soon");

        let config = EngineConfig::from_env();

        assert_eq!(config.proof_timeout_ticks, 60);

        env::remove_var("SSI_PROOF_TIMEOUT_TICKS");
    }
}
