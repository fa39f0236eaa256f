//! Time abstractions
//!
//! Expiry, batching windows and rolling metric windows all read time through
//! the [`Clock`] trait so tests can drive time with [`MockClock`] instead of
//! sleeping.
//!
//! ```rust
//! # #[cfg(feature = "foundation")]
//! # {
//! use std::time::Duration;
//!
//! use cadence_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now() - start, Duration::from_secs(5));
//! # }
//! ```

mod clock;

pub use clock::{Clock, MockClock, SystemClock};
