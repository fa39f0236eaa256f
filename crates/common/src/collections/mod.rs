//! Bounded collections used by the performance layer.
//!
//! - [`RingBuffer`]: fixed-capacity FIFO that drops the oldest element when
//!   full. Backs the per-key metric history and the alert log.

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;
