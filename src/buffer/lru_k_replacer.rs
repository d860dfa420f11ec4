use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::common::PageId;

use super::EvictionPolicy;

/// Last k access timestamps of one page, oldest at the front
#[derive(Debug, Default)]
struct AccessHistory {
    history: VecDeque<u64>,
}

impl AccessHistory {
    fn record(&mut self, timestamp: u64, k: usize) {
        self.history.push_back(timestamp);
        while self.history.len() > k {
            self.history.pop_front();
        }
    }

    /// Backward k-distance, or None (+inf) with fewer than k accesses
    fn k_distance(&self, now: u64, k: usize) -> Option<u64> {
        if self.history.len() < k {
            None
        } else {
            Some(now - self.history[self.history.len() - k])
        }
    }

    fn earliest(&self) -> Option<u64> {
        self.history.front().copied()
    }
}

/// LRU-K Replacement Policy
///
/// Evicts the cached page whose backward k-distance is the largest. The
/// backward k-distance is the time since the kth most recent access.
///
/// A page with fewer than k recorded accesses has +inf distance. Among +inf
/// pages the one with the earliest recorded access goes first, and a page
/// with no recorded access at all goes before any of them.
pub struct LruKReplacer {
    k: usize,
    /// Monotonic logical clock
    current_timestamp: AtomicU64,
    histories: Mutex<HashMap<PageId, AccessHistory>>,
}

impl LruKReplacer {
    pub fn new(k: usize) -> Self {
        assert!(k > 0, "LRU-K needs k >= 1");
        Self {
            k,
            current_timestamp: AtomicU64::new(0),
            histories: Mutex::new(HashMap::new()),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of pages with recorded history.
    pub fn size(&self) -> usize {
        self.histories.lock().len()
    }
}

impl EvictionPolicy for LruKReplacer {
    fn record_access(&self, page_id: PageId) {
        let timestamp = self.current_timestamp.fetch_add(1, Ordering::Relaxed);
        self.histories
            .lock()
            .entry(page_id)
            .or_default()
            .record(timestamp, self.k);
    }

    fn remove(&self, page_id: PageId) {
        self.histories.lock().remove(&page_id);
    }

    fn victim(&self, cached: &[PageId]) -> Option<PageId> {
        let histories = self.histories.lock();
        let now = self.current_timestamp.load(Ordering::Relaxed);

        // (k-distance, earliest access); None sorts as +inf / earliest
        let rank = |page_id: &PageId| match histories.get(page_id) {
            Some(h) => (h.k_distance(now, self.k), h.earliest()),
            None => (None, None),
        };

        let mut victim: Option<(PageId, Option<u64>, Option<u64>)> = None;
        for page_id in cached {
            let (dist, earliest) = rank(page_id);

            let replace = match &victim {
                None => true,
                Some((_, v_dist, v_earliest)) => match (v_dist, dist) {
                    (None, Some(_)) => false,
                    (Some(_), None) => true,
                    (None, None) => match (v_earliest, earliest) {
                        (Some(v), Some(c)) => c < *v,
                        (Some(_), None) => true,
                        _ => false,
                    },
                    (Some(v), Some(c)) => c > *v,
                },
            };

            if replace {
                victim = Some((*page_id, dist, earliest));
            }
        }

        victim.map(|(page_id, _, _)| page_id)
    }
}
