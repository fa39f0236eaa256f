//! Stored entries and payload sizing

use std::collections::HashSet;
use std::io;
use std::time::{Duration, Instant};

use cadence_common::compression::Codec;
use serde_json::Value;

use crate::error::PerfResult;

/// Payload held by an entry
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    /// Live value, cloned out on every hit
    Value(Value),
    /// JSON-encoded bytes, possibly compressed
    Bytes(Vec<u8>),
}

/// A single cached value with its expiry, size and tag metadata
///
/// Only the store holds entries; callers receive decoded copies.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub(crate) payload: Payload,
    /// `None` when the TTL is too large to represent: the entry never expires
    pub(crate) expires_at: Option<Instant>,
    /// Extra time past `expires_at` the entry is kept for revalidation
    pub(crate) grace: Duration,
    pub(crate) size: usize,
    pub(crate) tags: HashSet<String>,
    pub(crate) compressed: bool,
}

impl CacheEntry {
    /// Expiry instant for a TTL starting at `now`, saturating to "never"
    pub(crate) fn expiry_for(now: Instant, ttl: Duration) -> Option<Instant> {
        now.checked_add(ttl)
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    /// Past expiry and past the grace window
    pub(crate) fn is_dead(&self, now: Instant) -> bool {
        self.expires_at
            .and_then(|at| at.checked_add(self.grace))
            .is_some_and(|dead_at| now > dead_at)
    }

    pub(crate) fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }

    /// Decode into an owned value, decompressing when needed
    pub(crate) fn decode(&self, codec: &dyn Codec) -> PerfResult<Value> {
        match &self.payload {
            Payload::Value(value) => Ok(value.clone()),
            Payload::Bytes(bytes) if self.compressed => {
                let raw = codec.decompress(bytes)?;
                Ok(serde_json::from_slice(&raw)?)
            }
            Payload::Bytes(bytes) => Ok(serde_json::from_slice(bytes)?),
        }
    }
}

/// Byte length of a value's JSON encoding, without allocating the encoding
pub(crate) fn encoded_len(value: &Value) -> PerfResult<usize> {
    let mut counter = ByteCounter(0);
    serde_json::to_writer(&mut counter, value)?;
    Ok(counter.0)
}

struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
