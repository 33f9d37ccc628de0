//! Configuration management
//!
//! Engine timings are read from an optional TOML file, then individual
//! values can be overridden from the environment (`.env` is loaded first).
//! Every field has a default, so an empty file is a valid configuration.
//!
//! Created: 2026-10-19

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub quote: QuoteConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Quote debounce and auxiliary price refresh
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_price_refresh_secs")]
    pub price_refresh_secs: u64,
    /// Fee shown when the fee estimate fails
    #[serde(default = "default_fee_placeholder")]
    pub fee_placeholder: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

/// Transaction status polling policy
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Scheduled checks after the immediate one
    #[serde(default = "default_attempt_budget")]
    pub attempt_budget: u32,
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
}

/// Auto-dismiss durations per toast kind (pending never auto-dismisses)
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_success_ms")]
    pub success_ms: u64,
    #[serde(default = "default_info_ms")]
    pub info_ms: u64,
    #[serde(default = "default_error_ms")]
    pub error_ms: u64,
}

fn default_debounce_ms() -> u64 { 500 }
fn default_price_refresh_secs() -> u64 { 60 }
fn default_fee_placeholder() -> Decimal { Decimal::new(5, 6) }
fn default_cache_ttl_secs() -> u64 { 60 }
fn default_poll_interval_secs() -> u64 { 5 }
fn default_attempt_budget() -> u32 { 6 }
fn default_max_consecutive_errors() -> u32 { 3 }
fn default_success_ms() -> u64 { 2500 }
fn default_info_ms() -> u64 { 2000 }
fn default_error_ms() -> u64 { 4000 }

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            price_refresh_secs: default_price_refresh_secs(),
            fee_placeholder: default_fee_placeholder(),
        }
    }
}

impl QuoteConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn price_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.price_refresh_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: default_cache_ttl_secs() }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            attempt_budget: default_attempt_budget(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

impl PollerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Upper bound on how long a poll can run before reaching a terminal state
    pub fn max_tracking_time(&self) -> Duration {
        self.poll_interval()
            .checked_mul(self.attempt_budget.saturating_add(1))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            success_ms: default_success_ms(),
            info_ms: default_info_ms(),
            error_ms: default_error_ms(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.quote.price_refresh_secs == 0 {
            bail!("quote.price_refresh_secs must be at least 1");
        }
        if self.poller.poll_interval_secs == 0 {
            bail!("poller.poll_interval_secs must be at least 1");
        }
        if self.poller.max_consecutive_errors == 0 {
            bail!("poller.max_consecutive_errors must be at least 1");
        }
        let checks = self.poller.attempt_budget.checked_add(1);
        if checks
            .and_then(|n| self.poller.poll_interval().checked_mul(n))
            .is_none()
        {
            bail!(
                "poller.attempt_budget {} with poll_interval_secs {} overflows the tracking window",
                self.poller.attempt_budget,
                self.poller.poll_interval_secs
            );
        }
        Ok(())
    }

    /// Apply `SWAP_*` environment overrides on top of the current values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        override_from_env("SWAP_DEBOUNCE_MS", &mut self.quote.debounce_ms)?;
        override_from_env("SWAP_PRICE_REFRESH_SECS", &mut self.quote.price_refresh_secs)?;
        override_from_env("SWAP_FEE_PLACEHOLDER", &mut self.quote.fee_placeholder)?;
        override_from_env("SWAP_CACHE_TTL_SECS", &mut self.cache.ttl_secs)?;
        override_from_env("SWAP_POLL_INTERVAL_SECS", &mut self.poller.poll_interval_secs)?;
        override_from_env("SWAP_ATTEMPT_BUDGET", &mut self.poller.attempt_budget)?;
        override_from_env("SWAP_MAX_CONSECUTIVE_ERRORS", &mut self.poller.max_consecutive_errors)?;
        override_from_env("SWAP_TOAST_SUCCESS_MS", &mut self.notifications.success_ms)?;
        override_from_env("SWAP_TOAST_INFO_MS", &mut self.notifications.info_ms)?;
        override_from_env("SWAP_TOAST_ERROR_MS", &mut self.notifications.error_ms)?;
        Ok(())
    }
}

fn override_from_env<T>(key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Ok(raw) = std::env::var(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
    }
    Ok(())
}

/// Load configuration: `.env`, then the optional TOML file, then env overrides.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    dotenv::dotenv().ok();

    let mut config = match path {
        Some(p) => EngineConfig::load(p)?,
        None => EngineConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate().context("Invalid engine configuration")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.quote.debounce_ms, 500);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.poller.poll_interval_secs, 5);
        assert_eq!(config.poller.attempt_budget, 6);
        assert_eq!(config.poller.max_consecutive_errors, 3);
        assert_eq!(config.quote.fee_placeholder, dec!(0.000005));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[quote]
debounce_ms = 300
fee_placeholder = "0.00001"

[poller]
poll_interval_secs = 2
attempt_budget = 12

[notifications]
error_ms = 6000
"#;

        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.quote.debounce_ms, 300);
        assert_eq!(config.quote.fee_placeholder, dec!(0.00001));
        assert_eq!(config.quote.price_refresh_secs, 60);
        assert_eq!(config.poller.attempt_budget, 12);
        assert_eq!(config.notifications.error_ms, 6000);
        assert_eq!(config.notifications.success_ms, 2500);
    }

    #[test]
    fn test_max_tracking_time() {
        let poller = PollerConfig::default();
        assert_eq!(poller.max_tracking_time(), Duration::from_secs(35));

        let huge = PollerConfig { poll_interval_secs: u64::MAX, attempt_budget: u32::MAX, ..poller };
        assert_eq!(huge.max_tracking_time(), Duration::MAX);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_refresh_rejected() {
        let config: EngineConfig = toml::from_str("[quote]\nprice_refresh_secs = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("price_refresh_secs"));

        let config: EngineConfig = toml::from_str("[poller]\npoll_interval_secs = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overflowing_budget_rejected() {
        let mut config = EngineConfig::default();
        config.poller.poll_interval_secs = i64::MAX as u64;
        config.poller.attempt_budget = u32::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("attempt_budget"));
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("swap_engine_invalid_{}.toml", std::process::id()));
        std::fs::write(&path, "[quote]\nprice_refresh_secs = 0\n").unwrap();

        let result = load_config(Some(&path));
        std::fs::remove_file(&path).ok();
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("price_refresh_secs"));
    }
}
