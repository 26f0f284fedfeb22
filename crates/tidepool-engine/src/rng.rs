//! Seeded randomness as a world resource.
//!
//! All randomness in a simulation flows through one `SimRng` resource, seeded
//! from the run configuration. Systems draw from it in their fixed execution
//! order, so the stream of values is a pure function of the seed and the
//! schedule; replaying the same seed replays the same rolls. Never mix in
//! `rand::thread_rng` or wall-clock entropy, either breaks replay.

use rand::{Error, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

// ---------------------------------------------------------------------------
// SimRng
// ---------------------------------------------------------------------------

/// The simulation's random number generator, backed by a small, fast,
/// reproducible PCG stream.
///
/// Implements [`RngCore`], so the whole `rand` API is available through
/// `use rand::Rng`:
///
/// ```
/// use rand::Rng;
/// use tidepool_engine::rng::SimRng;
///
/// let mut rng = SimRng::seeded(7);
/// let roll: f64 = rng.gen_range(0.0..1.0);
/// assert!((0.0..1.0).contains(&roll));
/// ```
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a generator from a 64-bit seed. Equal seeds produce equal
    /// streams.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.inner.try_fill_bytes(dest)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
