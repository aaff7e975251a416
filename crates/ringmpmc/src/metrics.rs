use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for monitoring ring activity.
///
/// Only updated when [`Config::enable_metrics`](crate::Config::enable_metrics)
/// is set. All counters use `Relaxed` ordering; they are statistics, not
/// synchronization.
#[derive(Debug, Default)]
pub struct Metrics {
    offers: AtomicU64,
    offers_rejected: AtomicU64,
    polls: AtomicU64,
    polls_rejected: AtomicU64,
    batches_claimed: AtomicU64,
    batch_retries: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_offer(&self) {
        self.offers.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_offer_rejected(&self) {
        self.offers_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_polls(&self, n: u64) {
        self.polls.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_poll_rejected(&self) {
        self.polls_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_batch_claimed(&self) {
        self.batches_claimed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_batch_retry(&self) {
        self.batch_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            offers: self.offers.load(Ordering::Relaxed),
            offers_rejected: self.offers_rejected.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
            polls_rejected: self.polls_rejected.load(Ordering::Relaxed),
            batches_claimed: self.batches_claimed.load(Ordering::Relaxed),
            batch_retries: self.batch_retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Successful offers.
    pub offers: u64,
    /// Offers that found the tail slot unavailable or lost the tail CAS.
    pub offers_rejected: u64,
    /// Values handed out by `poll` and `poll_n_batched`.
    pub polls: u64,
    /// Polls that found nothing published or lost the head CAS.
    pub polls_rejected: u64,
    /// Contiguous runs claimed by `poll_n_batched`.
    pub batches_claimed: u64,
    /// Batched-poll rounds that lost the head CAS and rescanned.
    pub batch_retries: u64,
}
