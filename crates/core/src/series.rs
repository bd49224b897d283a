use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One telemetry reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Wall-clock time the reading was received.
    pub timestamp: DateTime<Local>,
    pub value:     f64,
}

/// Fixed-capacity window of the most recent samples, shared between the
/// ingestion worker (writer) and the render loop (reader).
///
/// Cloning yields another handle to the same window.  Every operation takes
/// the internal lock exactly once, so a reader always sees the window as it
/// was between two whole appends.
#[derive(Debug, Clone)]
pub struct BoundedSeries {
    inner:    Arc<Mutex<VecDeque<Sample>>>,
    capacity: NonZeroUsize,
}

impl BoundedSeries {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.get()))),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Push a new sample, evicting the oldest if at capacity.
    pub fn append(&self, value: f64, timestamp: DateTime<Local>) {
        let mut samples = self.lock();
        if samples.len() == self.capacity.get() {
            samples.pop_front();
        }
        samples.push_back(Sample { timestamp, value });
    }

    /// Independent copy of the window, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Sample> {
        self.lock().iter().copied().collect()
    }

    /// Most recently appended sample, `None` until the first reading arrives.
    #[must_use]
    pub fn latest(&self) -> Option<Sample> {
        self.lock().back().copied()
    }

    /// Snapshot and latest sample read under a single lock.
    #[must_use]
    pub fn view(&self) -> (Vec<Sample>, Option<Sample>) {
        let samples = self.lock();
        (samples.iter().copied().collect(), samples.back().copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-updated
    // (push/pop are the only mutations), so poisoning is safe to ignore.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Sample>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn values(series: &BoundedSeries) -> Vec<f64> {
        series.snapshot().iter().map(|s| s.value).collect()
    }

    #[test]
    fn evicts_oldest_when_full() {
        let series = BoundedSeries::new(cap(3));
        for v in [21.0, 22.0, 23.0, 24.0] {
            series.append(v, Local::now());
        }
        assert_eq!(values(&series), vec![22.0, 23.0, 24.0]);
    }

    #[test]
    fn latest_returns_the_appended_sample() {
        let series = BoundedSeries::new(cap(5));
        let at = Local::now();
        series.append(19.5, at);
        assert_eq!(series.latest(), Some(Sample { timestamp: at, value: 19.5 }));
    }

    #[test]
    fn empty_series() {
        let series = BoundedSeries::new(cap(50));
        assert!(series.snapshot().is_empty());
        assert_eq!(series.latest(), None);
        assert!(series.is_empty());
    }

    #[test]
    fn clones_share_the_window() {
        let writer = BoundedSeries::new(cap(2));
        let reader = writer.clone();
        writer.append(1.0, Local::now());
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.capacity(), 2);
    }

    #[test]
    fn view_agrees_with_snapshot_and_latest() {
        let series = BoundedSeries::new(cap(4));
        for v in 0..6 {
            series.append(f64::from(v), Local::now());
        }
        let (snapshot, latest) = series.view();
        assert_eq!(snapshot, series.snapshot());
        assert_eq!(latest, series.latest());
        assert_eq!(latest.map(|s| s.value), Some(5.0));
    }

    proptest! {
        #[test]
        fn keeps_last_n_in_order(n in 1usize..64, extra in 0usize..128) {
            let series = BoundedSeries::new(cap(n));
            let total = n + extra;
            for v in 0..total {
                series.append(v as f64, Local::now());
            }
            let got = values(&series);
            let want: Vec<f64> = (total - n.min(total)..total).map(|v| v as f64).collect();
            prop_assert!(got.len() <= n);
            prop_assert_eq!(got, want);
        }
    }

    #[test]
    fn concurrent_snapshots_are_never_torn() {
        const APPENDS: usize = 10_000;
        const SNAPSHOTS: usize = 100;

        let series = BoundedSeries::new(cap(50));
        let writer = series.clone();

        let producer = thread::spawn(move || {
            for v in 0..APPENDS {
                writer.append(v as f64, Local::now());
            }
        });

        let mut last_newest = -1.0;
        for _ in 0..SNAPSHOTS {
            let snapshot = values(&series);
            assert!(snapshot.len() <= 50);
            // Consecutive integers: no gap, duplicate or reordering.
            for pair in snapshot.windows(2) {
                assert_eq!(pair[1], pair[0] + 1.0);
            }
            if let Some(&newest) = snapshot.last() {
                assert!(newest >= last_newest);
                last_newest = newest;
            }
            thread::yield_now();
        }

        producer.join().unwrap();
        assert_eq!(series.latest().map(|s| s.value), Some((APPENDS - 1) as f64));
        assert_eq!(series.len(), 50);
    }
}
