// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Number of independently-updatable cells.
///
/// Enough to spread contention across a typical completion-callback pool;
/// reads sum all cells regardless.
const STRIPES: usize = 8;

/// A striped add-only counter.
///
/// Increments land on a per-thread cell so concurrent writers do not fight
/// over one cache line; [`sum()`][StripedAdder::sum] folds the cells on
/// read. Increments use relaxed ordering: a read racing a writer may miss
/// the newest increments, which the snapshot staleness contract of the
/// sliding window already tolerates.
#[derive(Debug)]
pub(crate) struct StripedAdder {
    cells: [CachePadded<AtomicU64>; STRIPES],
}

impl StripedAdder {
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|_| CachePadded::new(AtomicU64::new(0))),
        }
    }

    /// Adds one to the calling thread's cell.
    pub fn increment(&self) {
        self.cells[stripe()].fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the sum of all cells.
    pub fn sum(&self) -> u64 {
        self.cells
            .iter()
            .fold(0_u64, |acc, cell| acc.saturating_add(cell.load(Ordering::Relaxed)))
    }
}

/// Assigns each thread a stable cell index.
fn stripe() -> usize {
    static NEXT_STRIPE: AtomicUsize = AtomicUsize::new(0);

    thread_local! {
        static STRIPE: usize = NEXT_STRIPE.fetch_add(1, Ordering::Relaxed) % STRIPES;
    }

    STRIPE.with(|stripe| *stripe)
}
