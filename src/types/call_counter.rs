//! Tally of outbound calls made while answering queries.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The external services a [`CallCounter`] keeps count of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Llm,
    Geocoding,
    Archive,
    Forecast,
}

#[derive(Debug, Default)]
struct Counts {
    llm: AtomicU64,
    geocoding: AtomicU64,
    archive: AtomicU64,
    forecast: AtomicU64,
}

/// Shared handle over call counters.
///
/// Cloning the handle shares the underlying counts, so one counter can be passed to
/// every component of a pipeline (or to several pipelines running in parallel) and
/// read back once at the end.
///
/// # Examples
///
/// ```
/// use weather_query::{CallCounter, CallKind};
///
/// let counter = CallCounter::new();
/// let handle = counter.clone();
/// handle.increment(CallKind::Llm);
/// assert_eq!(counter.snapshot().llm, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    inner: Arc<Counts>,
}

/// Point-in-time copy of a [`CallCounter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallCounts {
    pub llm: u64,
    pub geocoding: u64,
    pub archive: u64,
    pub forecast: u64,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: CallKind) -> &AtomicU64 {
        match kind {
            CallKind::Llm => &self.inner.llm,
            CallKind::Geocoding => &self.inner.geocoding,
            CallKind::Archive => &self.inner.archive,
            CallKind::Forecast => &self.inner.forecast,
        }
    }

    /// Records one call and returns the new total for that kind.
    pub fn increment(&self, kind: CallKind) -> u64 {
        self.slot(kind).fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self, kind: CallKind) -> u64 {
        self.slot(kind).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CallCounts {
        CallCounts {
            llm: self.get(CallKind::Llm),
            geocoding: self.get(CallKind::Geocoding),
            archive: self.get(CallKind::Archive),
            forecast: self.get(CallKind::Forecast),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_is_shared_across_tasks() {
        let counter = CallCounter::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    counter.increment(CallKind::Forecast);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let counts = counter.snapshot();
        assert_eq!(counts.forecast, 800);
        assert_eq!(counts.archive, 0);
    }

    #[test]
    fn test_increment_returns_running_total() {
        let counter = CallCounter::new();
        assert_eq!(counter.increment(CallKind::Geocoding), 1);
        assert_eq!(counter.increment(CallKind::Geocoding), 2);
        assert_eq!(counter.get(CallKind::Geocoding), 2);
    }
}
