use std::fmt;
use std::io::{Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use tracing::trace;

use crate::error::{CommonError, CommonResult};

/// Compression strategy applied to serialized cache payloads
///
/// Implementations must round-trip: `decompress(compress(x)) == x`. A
/// decompression error means the stored bytes are unusable; callers treat it
/// as a cache miss.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Compress a payload
    fn compress(&self, data: &[u8]) -> CommonResult<Vec<u8>>;

    /// Decompress a payload produced by [`Codec::compress`]
    fn decompress(&self, data: &[u8]) -> CommonResult<Vec<u8>>;
}

/// Identity codec
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCodec;

impl Codec for NoopCodec {
    fn name(&self) -> &'static str {
        "none"
    }

    fn compress(&self, data: &[u8]) -> CommonResult<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> CommonResult<Vec<u8>> {
        Ok(data.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Gzip,
    Zlib,
}

/// Deflate-based codec with gzip or zlib framing
#[derive(Debug, Clone, Copy)]
pub struct FlateCodec {
    framing: Framing,
    level: u32,
}

impl FlateCodec {
    /// Gzip framing at the given level (clamped to 9)
    pub fn gzip(level: u32) -> Self {
        Self { framing: Framing::Gzip, level: level.min(9) }
    }

    /// Zlib framing at the given level (clamped to 9)
    pub fn zlib(level: u32) -> Self {
        Self { framing: Framing::Zlib, level: level.min(9) }
    }

    /// Configured compression level
    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for FlateCodec {
    fn default() -> Self {
        Self::gzip(6)
    }
}

impl Codec for FlateCodec {
    fn name(&self) -> &'static str {
        match self.framing {
            Framing::Gzip => "gzip",
            Framing::Zlib => "zlib",
        }
    }

    fn compress(&self, data: &[u8]) -> CommonResult<Vec<u8>> {
        let level = Compression::new(self.level);
        let compressed = match self.framing {
            Framing::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), level);
                encoder.write_all(data).map_err(|e| {
                    CommonError::internal_with_context(e.to_string(), "gzip compress")
                })?;
                encoder.finish().map_err(|e| {
                    CommonError::internal_with_context(e.to_string(), "gzip finish")
                })?
            }
            Framing::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), level);
                encoder.write_all(data).map_err(|e| {
                    CommonError::internal_with_context(e.to_string(), "zlib compress")
                })?;
                encoder.finish().map_err(|e| {
                    CommonError::internal_with_context(e.to_string(), "zlib finish")
                })?
            }
        };

        trace!(
            codec = self.name(),
            original = data.len(),
            compressed = compressed.len(),
            "payload compressed"
        );
        Ok(compressed)
    }

    fn decompress(&self, data: &[u8]) -> CommonResult<Vec<u8>> {
        let mut decompressed = Vec::new();
        match self.framing {
            Framing::Gzip => {
                GzDecoder::new(data).read_to_end(&mut decompressed).map_err(|e| {
                    CommonError::internal_with_context(e.to_string(), "gzip decompress")
                })?;
            }
            Framing::Zlib => {
                ZlibDecoder::new(data).read_to_end(&mut decompressed).map_err(|e| {
                    CommonError::internal_with_context(e.to_string(), "zlib decompress")
                })?;
            }
        }
        Ok(decompressed)
    }
}
