//! Collection configuration.

use entikv_codec::CipherSecret;
use std::time::Duration;

/// Default number of retries `update` makes after a lost-update race.
pub const DEFAULT_UPDATE_RETRIES: u32 = 3;

/// Default pause between `update` attempts.
pub const DEFAULT_UPDATE_BACKOFF: Duration = Duration::from_millis(50);

/// Configuration for a collection.
///
/// Fixed at construction. Index registration is the only state that
/// changes afterwards.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Prefix prepended to every key of the collection.
    pub prefix: String,

    /// Expiry applied by `set`, in seconds. Collections with a default TTL
    /// cannot have indexes.
    pub default_ttl: Option<u64>,

    /// Key material for transparent encryption of stored records.
    pub encryption: Option<CipherSecret>,

    /// How many times `update` retries after a concurrent update.
    pub update_retries: u32,

    /// Pause between `update` attempts.
    pub update_backoff: Duration,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            default_ttl: None,
            encryption: None,
            update_retries: DEFAULT_UPDATE_RETRIES,
            update_backoff: DEFAULT_UPDATE_BACKOFF,
        }
    }
}

impl CollectionConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets a default time-to-live in seconds.
    #[must_use]
    pub const fn default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl = Some(seconds);
        self
    }

    /// Enables encryption with the given key material.
    #[must_use]
    pub fn encryption(mut self, secret: CipherSecret) -> Self {
        self.encryption = Some(secret);
        self
    }

    /// Sets the number of `update` retries.
    #[must_use]
    pub const fn update_retries(mut self, retries: u32) -> Self {
        self.update_retries = retries;
        self
    }

    /// Sets the pause between `update` attempts.
    #[must_use]
    pub const fn update_backoff(mut self, backoff: Duration) -> Self {
        self.update_backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CollectionConfig::default();
        assert!(config.prefix.is_empty());
        assert!(config.default_ttl.is_none());
        assert!(config.encryption.is_none());
        assert_eq!(config.update_retries, 3);
    }

    #[test]
    fn builder_pattern() {
        let config = CollectionConfig::new()
            .prefix("sessions:")
            .default_ttl(60)
            .encryption(CipherSecret::generate())
            .update_retries(5)
            .update_backoff(Duration::ZERO);

        assert_eq!(config.prefix, "sessions:");
        assert_eq!(config.default_ttl, Some(60));
        assert!(config.encryption.is_some());
        assert_eq!(config.update_retries, 5);
        assert_eq!(config.update_backoff, Duration::ZERO);
    }
}
