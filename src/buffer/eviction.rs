use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::common::PageId;

/// Chooses which cached page the buffer pool drops when it is full.
///
/// The pool reports every fetch through `record_access` and every removal
/// through `remove`, and asks for a victim among the pages currently cached.
/// Implementations must tolerate being told about pages they have never seen.
pub trait EvictionPolicy: Send + Sync {
    /// Records that `page_id` was fetched.
    fn record_access(&self, page_id: PageId);

    /// Forgets `page_id`; it is no longer cached.
    fn remove(&self, page_id: PageId);

    /// Picks a victim from `cached`. Returns None only if `cached` is empty.
    fn victim(&self, cached: &[PageId]) -> Option<PageId>;
}

/// Evicts a page chosen uniformly at random.
pub struct RandomEviction {
    rng: Mutex<StdRng>,
}

impl RandomEviction {
    /// Creates a policy seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a policy with a fixed seed, for reproducible victim choices.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomEviction {
    fn default() -> Self {
        Self::new()
    }
}

impl EvictionPolicy for RandomEviction {
    fn record_access(&self, _page_id: PageId) {}

    fn remove(&self, _page_id: PageId) {}

    fn victim(&self, cached: &[PageId]) -> Option<PageId> {
        cached.choose(&mut *self.rng.lock()).copied()
    }
}
