//! Pluggable compression strategies for cached payloads
//!
//! The cache stores compressed payloads behind the [`Codec`] trait so the
//! algorithm is chosen by configuration rather than hardcoded. Two strategies
//! ship with the crate:
//!
//! - [`NoopCodec`]: identity transform, useful when CPU matters more than
//!   memory or in tests that inspect stored bytes
//! - [`FlateCodec`]: gzip or zlib via `flate2`
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # {
//! use cadence_common::compression::{codec_for, Codec, CompressionKind};
//!
//! let codec = codec_for(CompressionKind::Gzip, 6);
//! let payload = b"scheduled post payload ".repeat(64);
//! let compressed = codec.compress(&payload).unwrap();
//! assert!(compressed.len() < payload.len());
//! assert_eq!(codec.decompress(&compressed).unwrap(), payload);
//! # }
//! ```

mod codec;

use std::sync::Arc;

pub use codec::{Codec, FlateCodec, NoopCodec};
use serde::{Deserialize, Serialize};

/// Compression algorithm selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    /// Store payloads as-is
    None,
    /// Gzip framing (default)
    #[default]
    Gzip,
    /// Zlib framing
    Zlib,
}

impl std::str::FromStr for CompressionKind {
    type Err = crate::error::CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" | "noop" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            "zlib" => Ok(Self::Zlib),
            other => Err(crate::error::CommonError::validation_with_value(
                "compression",
                "expected one of none, gzip, zlib",
                other,
            )),
        }
    }
}

/// Build the codec for a configured algorithm
///
/// `level` is clamped to `0..=9` by the flate codecs and ignored by the
/// no-op codec.
pub fn codec_for(kind: CompressionKind, level: u32) -> Arc<dyn Codec> {
    match kind {
        CompressionKind::None => Arc::new(NoopCodec),
        CompressionKind::Gzip => Arc::new(FlateCodec::gzip(level)),
        CompressionKind::Zlib => Arc::new(FlateCodec::zlib(level)),
    }
}
