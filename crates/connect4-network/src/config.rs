//! Client configuration.
//!
//! Parsed from an optional TOML file; every field has a default so an empty
//! file (or no file at all) yields a working configuration.
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 53333
//! nick = "alice"
//! cycle_delay_ms = 2500
//! probe_timeout_ms = 6000
//! violation_policy = "resync"
//!
//! [backoff]
//! enabled = true
//! max_delay_ms = 30000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use connect4_core::{Error, Result, constants::*};

/// What the client does after a fatal protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    /// Report `ClientEvent::Terminated` and stop the client.
    #[default]
    Terminate,

    /// Drop the link and let the liveness monitor reconnect.
    Resync,
}

/// Bounded exponential backoff for connect retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub enabled: bool,
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_delay_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl BackoffConfig {
    /// Delay before the next connect attempt after `failures` consecutive failures.
    ///
    /// Without backoff the delay is always `base`. With backoff it doubles per
    /// failure, starting from `base`, and never exceeds `max_delay_ms`.
    pub fn delay(&self, base: Duration, failures: u32) -> Duration {
        if !self.enabled || failures == 0 {
            return base;
        }
        let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
        base.saturating_mul(factor)
            .min(Duration::from_millis(self.max_delay_ms))
            .max(base)
    }
}

/// Configuration of a [`GameClient`](crate::GameClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server IPv4 address
    pub host: String,

    pub port: u16,

    /// Nickname used for the handshake
    pub nick: Option<String>,

    pub connect_timeout_ms: u64,

    /// Timeout for a single frame write
    pub io_timeout_ms: u64,

    /// Pause between two liveness monitor cycles
    pub cycle_delay_ms: u64,

    /// Time a PING may stay unacknowledged before the link is declared dead
    pub probe_timeout_ms: u64,

    pub backoff: BackoffConfig,

    pub violation_policy: ViolationPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            nick: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
            cycle_delay_ms: DEFAULT_CYCLE_DELAY_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            backoff: BackoffConfig::default(),
            violation_policy: ViolationPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    /// Returns `Error::Config` if the text is not valid TOML or a field has
    /// the wrong type.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.cycle_delay(), Duration::from_millis(2500));
        assert_eq!(config.probe_timeout(), Duration::from_secs(6));
        assert_eq!(config.violation_policy, ViolationPolicy::Terminate);
        assert!(!config.backoff.enabled);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(config.nick.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = ClientConfig::from_toml(
            r#"
            host = "10.0.0.2"
            nick = "alice"
            violation_policy = "resync"

            [backoff]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "10.0.0.2");
        assert_eq!(config.nick.as_deref(), Some("alice"));
        assert_eq!(config.violation_policy, ViolationPolicy::Resync);
        assert!(config.backoff.enabled);
        assert_eq!(config.backoff.max_delay_ms, DEFAULT_MAX_BACKOFF_MS);
        assert_eq!(config.io_timeout_ms, DEFAULT_IO_TIMEOUT_MS);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ClientConfig::from_toml("port = \"not a number\""),
            Err(Error::Config(_))
        ));
    }

    #[rstest]
    #[case(0, 1000)]
    #[case(1, 1000)]
    #[case(2, 2000)]
    #[case(3, 4000)]
    #[case(5, 10000)]
    #[case(40, 10000)]
    fn test_backoff_delay(#[case] failures: u32, #[case] expected_ms: u64) {
        let backoff = BackoffConfig {
            enabled: true,
            max_delay_ms: 10_000,
        };
        assert_eq!(
            backoff.delay(Duration::from_secs(1), failures),
            Duration::from_millis(expected_ms)
        );
    }

    #[test]
    fn test_backoff_disabled_is_fixed() {
        let backoff = BackoffConfig::default();
        assert_eq!(
            backoff.delay(Duration::from_millis(2500), 7),
            Duration::from_millis(2500)
        );
    }
}
