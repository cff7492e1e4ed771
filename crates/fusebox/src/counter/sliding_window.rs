// Copyright (c) Fusebox Contributors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use crossbeam_queue::SegQueue;
use tock::Clock;

use super::{EventCounter, StripedAdder};
use crate::EventCount;
use crate::config::{CircuitBreakerConfig, duration_millis};

/// An [`EventCounter`] that accumulates events within a sliding time window.
///
/// Events land in the *current* bucket until its update interval elapses;
/// the writer that notices the expiry rotates the bucket into the
/// `reservoir` with a compare-and-swap and refreshes the published
/// `snapshot` by summing the reservoir, discarding buckets older than the
/// window. Readers only ever load the snapshot, so `count()` is O(1) and
/// the trim cost is amortized to one pass per rotation.
///
/// Nothing here blocks: bucket counters are striped adders, the current
/// bucket and snapshot are atomic references, the reservoir is a lock-free
/// queue, and a writer that loses the rotation race offers its bucket to
/// the reservoir instead of retrying, so the event is still counted.
#[derive(Debug)]
pub(crate) struct SlidingWindowCounter {
    clock: Clock,

    window_millis: i64,

    update_interval_millis: i64,

    /// The latest bucket, receiving events until its interval elapses.
    current: ArcSwap<Bucket>,

    /// The latest accumulated count, refreshed on rotation.
    snapshot: ArcSwap<EventCount>,

    /// Past (and some overflow) buckets within the time window.
    reservoir: SegQueue<Arc<Bucket>>,

    /// Set while a rotation winner is walking the reservoir. A concurrent
    /// rotation skips the refresh instead of waiting; the snapshot catches
    /// up on the next rotation, within the staleness bound.
    trimming: AtomicBool,
}

impl SlidingWindowCounter {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        let clock = config.clock().clone();
        let current = ArcSwap::from_pointee(Bucket::new(clock.current_millis()));

        Self {
            clock,
            window_millis: duration_millis(config.counter_sliding_window()),
            update_interval_millis: duration_millis(config.counter_update_interval()),
            current,
            snapshot: ArcSwap::from_pointee(EventCount::ZERO),
            reservoir: SegQueue::new(),
            trimming: AtomicBool::new(false),
        }
    }

    fn on_event(&self, event: Event) {
        let time_millis = self.clock.current_millis();
        let current = self.current.load_full();

        if time_millis < current.timestamp {
            // The clock went backward past the current bucket (clock
            // adjustment, or a long pause around the read). Record the event
            // into an instant bucket so it is not lost, and leave the
            // current bucket alone.
            let bucket = Bucket::new(time_millis);
            event.increment(&bucket);
            self.reservoir.push(Arc::new(bucket));
            return;
        }

        if time_millis < current.timestamp + self.update_interval_millis {
            // The current bucket is exactly the latest.
            event.increment(&current);
            return;
        }

        // The current bucket is old; rotate in a fresh one.
        let next = Arc::new(Bucket::new(time_millis));
        event.increment(&next);

        let previous = self.current.compare_and_swap(&current, Arc::clone(&next));
        if Arc::ptr_eq(&previous, &current) {
            self.reservoir.push(current);
            self.refresh_snapshot(time_millis);
        } else {
            // Another writer rotated first. The replacement already carries
            // this event, so park it in the reservoir as an instant bucket;
            // it will be summed and trimmed like any other.
            self.reservoir.push(next);
        }
    }

    fn refresh_snapshot(&self, time_millis: i64) {
        if self
            .trimming
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let count = self.trim_and_sum(time_millis);
        self.snapshot.store(Arc::new(count));

        self.trimming.store(false, Ordering::Release);
    }

    /// Sums the buckets still within the window and drops all the others.
    ///
    /// Each bucket present when the pass starts is popped exactly once:
    /// expired ones are discarded, live ones are summed and offered back.
    /// Buckets appended while the pass runs exceed the observed length and
    /// wait for the next rotation.
    fn trim_and_sum(&self, time_millis: i64) -> EventCount {
        let old_limit = time_millis - self.window_millis;

        let mut success = 0_u64;
        let mut failure = 0_u64;

        for _ in 0..self.reservoir.len() {
            let Some(bucket) = self.reservoir.pop() else {
                break;
            };

            if bucket.timestamp < old_limit {
                continue;
            }

            success = success.saturating_add(bucket.success.sum());
            failure = failure.saturating_add(bucket.failure.sum());
            self.reservoir.push(bucket);
        }

        EventCount::new(success, failure)
    }
}

impl EventCounter for SlidingWindowCounter {
    fn on_success(&self) {
        self.on_event(Event::Success);
    }

    fn on_failure(&self) {
        self.on_event(Event::Failure);
    }

    fn count(&self) -> EventCount {
        **self.snapshot.load()
    }
}

#[derive(Debug, Clone, Copy)]
enum Event {
    Success,
    Failure,
}

impl Event {
    fn increment(self, bucket: &Bucket) {
        match self {
            Self::Success => bucket.success.increment(),
            Self::Failure => bucket.failure.increment(),
        }
    }
}

/// Holds the count of events within one update interval.
#[derive(Debug)]
struct Bucket {
    /// Creation time of the bucket; never changes.
    timestamp: i64,

    success: StripedAdder,

    failure: StripedAdder,
}

impl Bucket {
    fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            success: StripedAdder::new(),
            failure: StripedAdder::new(),
        }
    }
}
