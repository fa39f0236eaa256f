//! A fixed-capacity circular buffer with overwrite-on-full semantics.
//!
//! A [`RingBuffer`] keeps items in insertion order and never grows past the
//! capacity it was created with. Pushing into a full buffer displaces the
//! oldest element and hands it back to the caller.
//!
//! # Complexity
//! - `push`, `len`, `is_empty`, `is_full`, `capacity`, `latest` are **O(1)**.
//! - `retain` is **O(n)**.

use std::collections::VecDeque;

/// A fixed-capacity circular buffer storing elements in first-in-first-out
/// order.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "foundation")]
/// # {
/// use cadence_common::collections::RingBuffer;
///
/// let mut buffer = RingBuffer::new(3);
/// buffer.push(1);
/// buffer.push(2);
/// buffer.push(3);
/// assert_eq!(buffer.push(4), Some(1)); // oldest item displaced
///
/// assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
/// assert_eq!(buffer.latest(), Some(&4));
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingBuffer<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates a new buffer with the provided capacity.
    ///
    /// A capacity of zero is clamped to `1`.
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { buf: VecDeque::with_capacity(capacity.min(1024)), capacity }
    }

    /// Appends an item, returning the displaced oldest item when full.
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        let displaced = if self.is_full() { self.buf.pop_front() } else { None };
        self.buf.push_back(item);
        displaced
    }

    /// Returns the most recently pushed item.
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.buf.back()
    }

    /// Returns the number of items currently stored.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` when the buffer has no items.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns `true` when the buffer reached its capacity.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Returns the maximum number of items the buffer holds.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes every item.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Keeps only the items matching `keep`, preserving order.
    ///
    /// Returns the number of items removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.buf.len();
        self.buf.retain(keep);
        before - self.buf.len()
    }

    /// Iterates from the oldest to the newest item.
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.buf.iter()
    }
}
