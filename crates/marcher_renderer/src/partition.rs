//! Splitting a frame's pixels across render workers.
//!
//! Each worker owns one contiguous range of pixel indices and visits it in a
//! shuffled order, so a cancelled or half-finished frame shows an even
//! sprinkling of pixels instead of a partial scan.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A worker's share of the pixel index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    /// Worker that owns this range
    pub worker: usize,
    /// First pixel index
    pub start: usize,
    /// Number of pixel indices
    pub len: usize,
}

impl WorkRange {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end()).contains(&index)
    }
}

/// Split `total` pixel indices into `workers` contiguous ranges whose sizes
/// differ by at most one. The first `total % workers` ranges get the extra
/// index.
pub fn partition(total: usize, workers: usize) -> Vec<WorkRange> {
    if workers == 0 {
        return Vec::new();
    }
    let base = total / workers;
    let extra = total % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for worker in 0..workers {
        let len = base + usize::from(worker < extra);
        ranges.push(WorkRange { worker, start, len });
        start += len;
    }
    ranges
}

/// Map a pixel index to `(x, y)`. Indices run down each column.
#[inline]
pub fn pixel_coords(index: usize, height: u32) -> (u32, u32) {
    let height = height.max(1) as usize;
    ((index / height) as u32, (index % height) as u32)
}

/// Identifies a cached visit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermutationKey {
    pub worker: usize,
    pub width: u32,
    pub height: u32,
    pub workers: usize,
}

/// Shuffled visit orders, reused across frames of the same resolution and
/// worker count.
pub struct PermutationCache {
    rng: StdRng,
    orders: HashMap<PermutationKey, Arc<[usize]>>,
}

impl PermutationCache {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic shuffles, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            orders: HashMap::new(),
        }
    }

    /// Visit order for `range`: every index of the range exactly once.
    pub fn order_for(&mut self, key: PermutationKey, range: WorkRange) -> Arc<[usize]> {
        if let Some(order) = self.orders.get(&key) {
            if order.len() == range.len && order.first().map_or(true, |i| range.contains(*i)) {
                return Arc::clone(order);
            }
        }

        log::debug!(
            "Shuffling {} pixels for worker {} ({}x{}, {} workers)",
            range.len,
            key.worker,
            key.width,
            key.height,
            key.workers
        );
        let mut order: Vec<usize> = (range.start..range.end()).collect();
        order.shuffle(&mut self.rng);
        let order: Arc<[usize]> = order.into();
        self.orders.insert(key, Arc::clone(&order));
        order
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }
}

impl Default for PermutationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PermutationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationCache")
            .field("entries", &self.orders.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_exact_fit() {
        let ranges = partition(64 * 64, 4);
        assert_eq!(ranges.len(), 4);
        assert!(ranges.iter().all(|r| r.len == 1024));

        let total: usize = ranges.iter().map(|r| r.len).sum();
        assert_eq!(total, 64 * 64);
    }

    #[test]
    fn test_partition_uneven() {
        let ranges = partition(10, 3);
        let lens: Vec<usize> = ranges.iter().map(|r| r.len).collect();
        assert_eq!(lens, vec![4, 3, 3]);

        // Contiguous and disjoint.
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start);
        }
        assert_eq!(ranges[2].end(), 10);
    }

    #[test]
    fn test_partition_more_workers_than_pixels() {
        let ranges = partition(2, 5);
        assert_eq!(ranges.len(), 5);
        assert_eq!(ranges.iter().filter(|r| r.len == 0).count(), 3);
        assert!(partition(10, 0).is_empty());
    }

    #[test]
    fn test_pixel_coords_column_major() {
        assert_eq!(pixel_coords(0, 4), (0, 0));
        assert_eq!(pixel_coords(3, 4), (0, 3));
        assert_eq!(pixel_coords(4, 4), (1, 0));
        assert_eq!(pixel_coords(11, 4), (2, 3));
    }

    #[test]
    fn test_order_is_permutation_of_range() {
        let mut cache = PermutationCache::with_seed(7);
        let range = WorkRange {
            worker: 1,
            start: 100,
            len: 50,
        };
        let key = PermutationKey {
            worker: 1,
            width: 10,
            height: 30,
            workers: 2,
        };
        let order = cache.order_for(key, range);

        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, (100..150).collect::<Vec<_>>());
        assert_ne!(order.to_vec(), sorted, "order should be shuffled");
    }

    #[test]
    fn test_order_is_cached() {
        let mut cache = PermutationCache::with_seed(7);
        let range = WorkRange {
            worker: 0,
            start: 0,
            len: 20,
        };
        let key = PermutationKey {
            worker: 0,
            width: 4,
            height: 5,
            workers: 1,
        };
        let first = cache.order_for(key, range);
        let second = cache.order_for(key, range);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let resized = PermutationKey { width: 5, ..key };
        let third = cache.order_for(resized, WorkRange { len: 25, ..range });
        assert_eq!(third.len(), 25);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
