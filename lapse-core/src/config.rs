//! Configuration types

use crate::constants::{
    DEFAULT_CLEANUP_INTERVAL_SECS, ENV_CLEANUP_INTERVAL_MS, ENV_DEFAULT_EXPIRATION_MS,
};
use crate::{CacheError, CacheResult, Expiration};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Construction parameters for a cache.
///
/// # Example
///
/// ```
/// use lapse_core::{CacheConfig, Expiration};
/// use std::time::Duration;
///
/// let config = CacheConfig::new()
///     .with_default_expiration(Expiration::after_secs(300))
///     .with_cleanup_interval(Duration::from_secs(30));
/// assert!(config.janitor_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied by writes that pass [`Expiration::Default`].
    /// Both sentinels mean "never expire by default".
    pub default_expiration: Expiration,

    /// How often the janitor sweeps expired entries. Zero disables the
    /// janitor; expired entries are then only hidden lazily.
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_expiration: Expiration::Default,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

impl CacheConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default expiration.
    pub fn with_default_expiration(mut self, expiration: impl Into<Expiration>) -> Self {
        self.default_expiration = expiration.into();
        self
    }

    /// Set the janitor interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Disable the janitor.
    pub fn without_janitor(mut self) -> Self {
        self.cleanup_interval = Duration::ZERO;
        self
    }

    pub fn janitor_enabled(&self) -> bool {
        !self.cleanup_interval.is_zero()
    }

    /// The concrete default TTL, or `None` if entries never expire by default.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_expiration.as_default_ttl()
    }

    /// Create a config from environment variables.
    ///
    /// # Environment Variables
    /// - `LAPSE_DEFAULT_EXPIRATION_MS`: default TTL (`0` = library default, `-1` = never)
    /// - `LAPSE_CLEANUP_INTERVAL_MS`: janitor interval (`0` or negative disables it)
    ///
    /// Missing variables keep their defaults; unparsable ones are an error.
    pub fn from_env() -> CacheResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`CacheConfig::from_env`] but reads through `lookup`, which
    /// keeps tests away from the process environment.
    pub fn from_lookup<F>(lookup: F) -> CacheResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DEFAULT_EXPIRATION_MS) {
            let millis = parse_millis(ENV_DEFAULT_EXPIRATION_MS, &raw)?;
            config.default_expiration = Expiration::from_millis(millis);
        }

        if let Some(raw) = lookup(ENV_CLEANUP_INTERVAL_MS) {
            let millis = parse_millis(ENV_CLEANUP_INTERVAL_MS, &raw)?;
            config.cleanup_interval = Duration::from_millis(millis.max(0) as u64);
        }

        Ok(config)
    }
}

fn parse_millis(field: &str, raw: &str) -> CacheResult<i64> {
    raw.trim().parse::<i64>().map_err(|e| CacheError::Config {
        field: field.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_expiration, Expiration::Default);
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert!(config.janitor_enabled());
        assert_eq!(config.default_ttl(), None);
    }

    #[test]
    fn test_builder_chaining() {
        let config = CacheConfig::new()
            .with_default_expiration(Duration::from_secs(120))
            .with_cleanup_interval(Duration::from_millis(250));
        assert_eq!(config.default_ttl(), Some(Duration::from_secs(120)));
        assert_eq!(config.cleanup_interval, Duration::from_millis(250));

        let config = config.without_janitor();
        assert!(!config.janitor_enabled());
    }

    #[test]
    fn test_from_lookup_empty_keeps_defaults() {
        let config = CacheConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_values() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            (ENV_DEFAULT_EXPIRATION_MS, "1500"),
            (ENV_CLEANUP_INTERVAL_MS, "-1"),
        ]))
        .unwrap();
        assert_eq!(config.default_ttl(), Some(Duration::from_millis(1500)));
        assert!(!config.janitor_enabled());
    }

    #[test]
    fn test_from_lookup_never_sentinel() {
        let config =
            CacheConfig::from_lookup(lookup_from(&[(ENV_DEFAULT_EXPIRATION_MS, "-1")])).unwrap();
        assert_eq!(config.default_expiration, Expiration::Never);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = CacheConfig::from_lookup(lookup_from(&[(ENV_CLEANUP_INTERVAL_MS, "often")]))
            .unwrap_err();
        match err {
            CacheError::Config { field, value, .. } => {
                assert_eq!(field, ENV_CLEANUP_INTERVAL_MS);
                assert_eq!(value, "often");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
