//! Per-operation cache policy
//!
//! A `CacheConfig` travels with each `set`/`get_or_compute` call; it is never
//! stored alongside the entry.

use std::time::Duration;

use cadence_common::{duration_millis, option_duration_millis};
use serde::{Deserialize, Serialize};

/// Policy applied to a single cache write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for the entry
    #[serde(rename = "ttl_ms", with = "duration_millis")]
    pub ttl: Duration,

    /// Grace window after expiry during which the stale value may still be
    /// served while a refresh runs in the background
    #[serde(
        rename = "stale_while_revalidate_ms",
        default,
        with = "option_duration_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub stale_while_revalidate: Option<Duration>,

    /// Labels used for group invalidation
    #[serde(default)]
    pub tags: Vec<String>,

    /// Compress the encoded payload when it exceeds the store threshold
    #[serde(default)]
    pub compress: bool,

    /// Store the structurally encoded bytes rather than the live value
    #[serde(default)]
    pub serialize: bool,
}

impl CacheConfig {
    /// Plain TTL policy without tags or compression
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    ///
    /// use cadence_core::cache::CacheConfig;
    ///
    /// let config = CacheConfig::new(Duration::from_secs(300));
    /// assert!(config.tags.is_empty());
    /// ```
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, stale_while_revalidate: None, tags: Vec::new(), compress: false, serialize: false }
    }

    /// Create a configuration builder
    pub fn builder(ttl: Duration) -> CacheConfigBuilder {
        CacheConfigBuilder { config: Self::new(ttl) }
    }

    /// Time after expiry during which the entry is kept for revalidation
    pub fn grace(&self) -> Duration {
        self.stale_while_revalidate.unwrap_or(Duration::ZERO)
    }
}

/// Builder for `CacheConfig`
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use cadence_core::cache::CacheConfig;
///
/// let config = CacheConfig::builder(Duration::from_secs(60))
///     .stale_while_revalidate(Duration::from_secs(30))
///     .tag("posts")
///     .tag("user:42")
///     .compress(true)
///     .build();
///
/// assert_eq!(config.tags, vec!["posts".to_string(), "user:42".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    pub fn stale_while_revalidate(mut self, grace: Duration) -> Self {
        self.config.stale_while_revalidate = Some(grace);
        self
    }

    pub fn tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.config.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.config.compress = compress;
        self
    }

    pub fn serialize(mut self, serialize: bool) -> Self {
        self.config.serialize = serialize;
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}
