//! Request-id allocation.
//!
//! Every client request carries a one-byte request id so the host's reply
//! can be matched to the round that asked for it. Ids must be distinct
//! across successive rounds (including across reconnects to the same
//! host), so the allocator is shared process-wide and never resets.

use std::sync::atomic::{AtomicU8, Ordering};

use rand::Rng;

/// Lowest possible seed. Offset away from zero so a fresh allocator never
/// hands out ids that collide with common garbage bytes.
const SEED_BASE: u8 = 71;
/// Width of the random seed range.
const SEED_SPAN: u8 = 151;

/// Process-wide wrapping `u8` counter for request ids.
///
/// Seeded randomly once at construction; every call to [`next`] returns a
/// fresh id. Intended to be shared across all endpoints via `Arc` so that
/// two connection attempts in the same process never reuse an id
/// back-to-back.
///
/// [`next`]: RequestIdAllocator::next
#[derive(Debug)]
pub struct RequestIdAllocator {
    next: AtomicU8,
}

impl RequestIdAllocator {
    /// Creates an allocator with a random seed in `71..=221`.
    pub fn new() -> Self {
        let seed = SEED_BASE + rand::rng().random_range(0..SEED_SPAN);
        Self::with_seed(seed)
    }

    /// Creates an allocator starting at an exact value. For tests.
    pub fn with_seed(seed: u8) -> Self {
        Self {
            next: AtomicU8::new(seed),
        }
    }

    /// Returns the next request id, wrapping at `u8::MAX`.
    pub fn next(&self) -> u8 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_falls_in_documented_range() {
        for _ in 0..200 {
            let allocator = RequestIdAllocator::new();
            let first = allocator.next();
            assert!((71..=221).contains(&first), "seed {first} out of range");
        }
    }

    #[test]
    fn test_next_increments_by_one() {
        let allocator = RequestIdAllocator::with_seed(100);
        assert_eq!(allocator.next(), 100);
        assert_eq!(allocator.next(), 101);
        assert_eq!(allocator.next(), 102);
    }

    #[test]
    fn test_next_wraps_at_u8_max() {
        let allocator = RequestIdAllocator::with_seed(u8::MAX);
        assert_eq!(allocator.next(), u8::MAX);
        assert_eq!(allocator.next(), 0);
    }
}
