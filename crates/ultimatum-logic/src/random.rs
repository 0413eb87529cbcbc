//! Seeded pseudo-random number generator
//!
//! Drives the coin-flip timeout policy so a session replays identically
//! from its seed. xorshift64* underneath.

/// Per-round generator: the same session seed and round always give the
/// same draws
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG for one round of a session
    pub fn new(session_seed: u64, round: u32) -> Self {
        let mut state = session_seed ^ 0x6a09e667f3bcc909;
        state ^= (round as u64).wrapping_mul(0x517cc1b727220a95);
        // xorshift never leaves the zero state
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }

        let mut rng = Self { state };
        // warm up past the low-entropy first outputs
        (0..8).for_each(|_| {
            rng.next_u64();
        });
        rng
    }

    /// Derive an independent stream for one exchange within the round
    pub fn for_exchange(&self, index: u32) -> Self {
        let mut state = self.state ^ (index as u64).wrapping_mul(0x9e3779b97f4a7c15);
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }
        let mut rng = Self { state };
        rng.next_u64();
        rng
    }

    /// Raw 64-bit draw
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Fair coin
    pub fn next_bool(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }

    /// Uniform-ish draw in `0..=max`
    pub fn next_up_to(&mut self, max: u32) -> u32 {
        (self.next_u64() % (u64::from(max) + 1)) as u32
    }
}
