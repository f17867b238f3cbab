//! Cache-defeating query parameters

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Appends a random `t=` query parameter so CDNs cannot serve cached bodies.
///
/// Backed by a seedable RNG so tests can assert exact URLs.
#[derive(Debug)]
pub struct CacheBuster {
    rng: Mutex<StdRng>,
}

impl CacheBuster {
    /// Create a buster seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a deterministic buster
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Return `url` with `t=<six digits><six digits>` appended
    pub fn apply(&self, url: &str) -> String {
        let (a, b) = {
            let mut rng = self.rng.lock();
            (
                rng.gen_range(100_000..=999_999u32),
                rng.gen_range(100_000..=999_999u32),
            )
        };
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}t={a}{b}")
    }
}

impl Default for CacheBuster {
    fn default() -> Self {
        Self::new()
    }
}
