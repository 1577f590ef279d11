//! Random victim selection.
//!
//! Eviction picks a resident block uniformly at random. A xorshift64 generator keeps
//! this cheap and, given the configured seed, fully reproducible.

/// Seeded xorshift64 generator used to pick eviction victims.
#[derive(Clone, Debug)]
pub struct RandomVictim {
    /// Internal generator state; never zero.
    state: u64,
}

impl RandomVictim {
    /// Creates a generator from `seed`.
    ///
    /// Xorshift has a fixed point at zero, so a zero seed is replaced by a constant.
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    const fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Picks an index in `0..len`.
    ///
    /// # Panics
    ///
    /// Panics if `len` is zero.
    pub const fn pick(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick a victim from an empty set");
        (self.next_u64() % len as u64) as usize
    }
}
