//! Common utility helpers
//!
//! - **[`serde`]**: serde adapters for durations expressed in milliseconds,
//!   the unit every Cadence configuration file uses

pub mod serde;

pub use self::serde::{duration_millis, option_duration_millis};
