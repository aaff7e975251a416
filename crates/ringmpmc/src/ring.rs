use crate::invariants::{
    debug_assert_batch_within_limit, debug_assert_bounded_count, debug_assert_publish_stamp,
    debug_assert_rearm_stamp,
};
use crate::trace::{debug, trace};
use crate::{Backoff, Config, Metrics, MetricsSnapshot, RingError};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// SLOT OWNERSHIP PROTOCOL
// =============================================================================
//
// Producers and consumers never count items. Ownership of a slot is decided by
// two monotonic u64 positions (`tail` for producers, `head` for consumers) and
// a per-slot generation stamp.
//
// ## Stamp States
//
// For the slot at index `p & mask`:
// - `stamp == p`     : empty, ready for the producer that claims position `p`
// - `stamp == p + 1` : holds the value offered at `p`, ready for polling
//
// A poll of `p` re-arms the slot with `p + capacity`, the position the next
// producer lap will claim on the same index. A full ring therefore shows up as
// a stamp mismatch at `tail`, an empty one as a mismatch at `head`; there is no
// separate full/empty flag. Because stamps keep advancing, a thread holding a
// stale position sees a mismatch instead of reusing a recycled slot (ABA).
//
// ## Memory Ordering Protocol
//
// **Offer:**
// 1. Load `tail` with Acquire
// 2. Load slot stamp with Acquire (synchronizes with the previous poll's
//    Release re-arm, so that poll's read of the old value happened-before)
// 3. CAS `tail` from `t` to `t + 1` with SeqCst; failure is Relaxed
// 4. Write value (exclusive: no other producer can own `t` any more)
// 5. Store stamp `t + 1` with Release (publishes the value)
//
// **Poll:**
// 1. Load `head` with Acquire
// 2. Load slot stamp with Acquire (synchronizes with the offer's Release)
// 3. CAS `head` from `h` to `h + 1` with SeqCst; failure is Relaxed
// 4. Read value out of the slot
// 5. Store stamp `h + capacity` with Release (hands the slot to next lap)
//
// Every call makes exactly one CAS attempt. Losing the race is reported to the
// caller and never retried internally (lock-free, not wait-free).
//
// =============================================================================

/// One storage cell: generation stamp plus payload.
///
/// Wrapped in `CachePadded` inside the ring so adjacent slots never share a
/// cache line.
struct Slot<T> {
    stamp: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new(stamp: u64) -> Self {
        Self {
            stamp: AtomicU64::new(stamp),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Bounded lock-free MPMC ring buffer.
///
/// Any number of threads may [`offer`](Self::offer) and [`poll`](Self::poll)
/// concurrently through a shared reference. Each call is a single attempt:
/// `false`/`None` means the ring was full/empty *or* another thread won the
/// race, and the caller picks the retry policy.
///
/// # Example
///
/// ```
/// use ringmpmc_rs::RingBuffer;
///
/// let ring = RingBuffer::<u32>::with_capacity(4).unwrap();
/// assert!(ring.offer(10));
/// assert!(ring.offer(20));
/// assert_eq!(ring.poll(), Some(10));
/// assert_eq!(ring.poll_n_batched(8), vec![20]);
/// assert_eq!(ring.poll(), None);
/// ```
#[repr(C)]
pub struct RingBuffer<T> {
    // === CONSUMER HOT ===
    /// Next position to poll (claimed by consumers via CAS)
    head: CachePadded<AtomicU64>,

    // === PRODUCER HOT ===
    /// Next position to offer (claimed by producers via CAS)
    tail: CachePadded<AtomicU64>,

    // === COLD STATE === (read-only after construction, except metrics)
    mask: u64,
    config: Config,
    metrics: Metrics,

    // === SLOTS ===
    /// Fixed at construction; never grows or shrinks.
    slots: Box<[CachePadded<Slot<T>>]>,
}

// Safety: values move between threads through the stamp protocol; a slot's
// payload is only touched by the single thread that won the CAS for it.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Creates a ring from a validated configuration.
    ///
    /// Slot `i` starts with stamp `i`, so every slot is ready for the first
    /// lap of offers.
    pub fn new(config: Config) -> Result<Self, RingError> {
        config.validate()?;
        let capacity = config.capacity();

        let slots: Box<[CachePadded<Slot<T>>]> = (0..capacity as u64)
            .map(|i| CachePadded::new(Slot::new(i)))
            .collect();

        debug!(
            capacity,
            batch_limit = config.batch_limit,
            metrics = config.enable_metrics,
            "ring buffer created"
        );

        Ok(Self {
            head: CachePadded::new(AtomicU64::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            mask: config.mask() as u64,
            config,
            metrics: Metrics::new(),
            slots,
        })
    }

    /// Creates a ring with `capacity` slots and default settings.
    ///
    /// Fails unless `capacity` is a power of two and at least 2.
    pub fn with_capacity(capacity: usize) -> Result<Self, RingError> {
        Self::new(Config::with_capacity(capacity)?)
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    /// Returns the ring buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the configuration the ring was built with.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of claimed positions not yet polled.
    ///
    /// Exact when no offer or poll is in flight, otherwise a snapshot that may
    /// already be stale when it returns.
    #[inline]
    pub fn len(&self) -> usize {
        // head first: tail read afterwards can only be ahead of it
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (tail.wrapping_sub(head) as usize).min(self.capacity())
    }

    /// Returns true if nothing is claimed for polling.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if every slot is claimed.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    #[inline]
    fn slot(&self, pos: u64) -> &Slot<T> {
        &self.slots[(pos & self.mask) as usize]
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Single attempt to enqueue `value`, handing it back on failure.
    ///
    /// Fails when the tail slot has not been re-armed yet (ring full) or when
    /// another producer advanced `tail` first.
    pub fn try_offer(&self, value: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Acquire);
        let slot = self.slot(tail);

        if slot.stamp.load(Ordering::Acquire) != tail {
            self.record_offer_rejected();
            return Err(value);
        }

        if self
            .tail
            .compare_exchange(tail, tail.wrapping_add(1), Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            self.record_offer_rejected();
            return Err(value);
        }

        // SAFETY: the CAS made this thread the only owner of position `tail`.
        // The stamp still equals `tail`, so no consumer reads this slot until
        // the Release store below, and the previous occupant was moved out
        // before its poll re-armed the stamp we observed with Acquire.
        unsafe {
            (*slot.value.get()).write(value);
        }

        let stamp = tail.wrapping_add(1);
        debug_assert_publish_stamp!(stamp, tail);
        slot.stamp.store(stamp, Ordering::Release);

        if self.config.enable_metrics {
            self.metrics.add_offer();
        }
        Ok(())
    }

    /// Single attempt to enqueue `value`.
    ///
    /// Returns `false` if the ring is full or another producer won the race;
    /// the value is dropped in that case. Use [`try_offer`](Self::try_offer)
    /// to keep it.
    #[inline]
    pub fn offer(&self, value: T) -> bool {
        self.try_offer(value).is_ok()
    }

    /// Offer with adaptive backoff. Spins, yields, then gives up and returns
    /// the value.
    pub fn offer_with_backoff(&self, mut value: T) -> Result<(), T> {
        let mut backoff = Backoff::new();
        loop {
            match self.try_offer(value) {
                Ok(()) => return Ok(()),
                Err(v) => value = v,
            }
            if backoff.is_completed() {
                return Err(value);
            }
            backoff.snooze();
        }
    }

    #[inline]
    fn record_offer_rejected(&self) {
        if self.config.enable_metrics {
            self.metrics.add_offer_rejected();
        }
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Single attempt to dequeue the value at `head`.
    ///
    /// Returns `None` if nothing is published at `head` yet or another
    /// consumer advanced `head` first.
    pub fn poll(&self) -> Option<T> {
        let head = self.head.load(Ordering::Acquire);
        let slot = self.slot(head);

        if slot.stamp.load(Ordering::Acquire) != head.wrapping_add(1) {
            self.record_poll_rejected();
            return None;
        }

        if self
            .head
            .compare_exchange(head, head.wrapping_add(1), Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            self.record_poll_rejected();
            return None;
        }

        // SAFETY: the CAS made this thread the only owner of position `head`,
        // and the Acquire stamp load above observed its publication.
        let value = unsafe { self.release_slot(slot, head) };

        if self.config.enable_metrics {
            self.metrics.add_polls(1);
        }
        Some(value)
    }

    /// Poll with adaptive backoff. Spins, yields, then gives up.
    pub fn poll_with_backoff(&self) -> Option<T> {
        let mut backoff = Backoff::new();
        loop {
            if let Some(value) = self.poll() {
                return Some(value);
            }
            if backoff.is_completed() {
                return None;
            }
            backoff.snooze();
        }
    }

    /// Move the value out of an owned slot and re-arm it for the next lap.
    ///
    /// # Safety
    ///
    /// The caller must have claimed `pos` with a successful CAS on `head`
    /// after observing `slot.stamp == pos + 1` with Acquire ordering, and
    /// `slot` must be the slot for `pos`.
    unsafe fn release_slot(&self, slot: &Slot<T>, pos: u64) -> T {
        let value = (*slot.value.get()).assume_init_read();

        let stamp = pos.wrapping_add(self.capacity() as u64);
        debug_assert_rearm_stamp!(stamp, pos, self.capacity());
        slot.stamp.store(stamp, Ordering::Release);
        value
    }

    #[inline]
    fn record_poll_rejected(&self) {
        if self.config.enable_metrics {
            self.metrics.add_poll_rejected();
        }
    }

    // ---------------------------------------------------------------------
    // BATCHED CONSUMPTION
    // ---------------------------------------------------------------------
    //
    // One CAS on `head` claims a contiguous run of published slots. A round
    // scans at most `config.batch_limit` slots from the current head and stops
    // at the first one whose stamp is not `pos + 1`. If the CAS loses, the
    // whole run is discarded and the scan restarts from the new head.
    //
    // A successful CAS from `h0` proves no other consumer moved `head` since
    // the scan (positions only grow), so every scanned slot is still the value
    // published for its position.
    // ---------------------------------------------------------------------

    /// Drain up to `n` values in FIFO order, claiming runs with one CAS each.
    ///
    /// Returns fewer than `n` values (possibly none) as soon as a round finds
    /// nothing published at `head`. The result vector is allocated per call.
    pub fn poll_n_batched(&self, n: usize) -> Vec<T> {
        if n == 0 {
            return Vec::new();
        }

        let limit = self.config.batch_limit;
        let mut values = Vec::with_capacity(n.min(self.capacity()));

        while values.len() < n {
            let head = self.head.load(Ordering::Acquire);
            let want = (n - values.len()).min(limit);

            let mut available = 0usize;
            while available < want {
                let pos = head.wrapping_add(available as u64);
                if self.slot(pos).stamp.load(Ordering::Acquire) != pos.wrapping_add(1) {
                    break;
                }
                available += 1;
            }

            if available == 0 {
                break;
            }
            debug_assert_batch_within_limit!(available, limit);

            if self
                .head
                .compare_exchange(
                    head,
                    head.wrapping_add(available as u64),
                    Ordering::SeqCst,
                    Ordering::Relaxed,
                )
                .is_err()
            {
                trace!(head, available, "batched claim lost head race, rescanning");
                if self.config.enable_metrics {
                    self.metrics.add_batch_retry();
                }
                continue;
            }

            for i in 0..available as u64 {
                let pos = head.wrapping_add(i);
                // SAFETY: the CAS above claimed [head, head + available) and
                // each stamp in that run was observed as `pos + 1` with Acquire.
                values.push(unsafe { self.release_slot(self.slot(pos), pos) });
            }

            if self.config.enable_metrics {
                self.metrics.add_polls(available as u64);
                self.metrics.add_batch_claimed();
            }
        }

        values
    }

    // ---------------------------------------------------------------------
    // CONVENIENCE WRAPPERS
    // ---------------------------------------------------------------------
    //
    // These spin on the single-attempt core until they make progress. They
    // stay correct under MPMC use, but only the sole producer (or consumer)
    // should call them: an unconditional spin can starve other callers.
    // ---------------------------------------------------------------------

    /// Offer every value the supplier yields, spinning until each one lands.
    ///
    /// Stops when `supplier` returns `None`. Returns the number offered.
    pub fn single_producer_offer<F>(&self, mut supplier: F) -> usize
    where
        F: FnMut() -> Option<T>,
    {
        let mut offered = 0;
        let mut backoff = Backoff::new();

        while let Some(mut value) = supplier() {
            while let Err(v) = self.try_offer(value) {
                value = v;
                backoff.snooze();
            }
            backoff.reset();
            offered += 1;
        }
        offered
    }

    /// Poll until the ring reports empty, handing each value to `consumer`.
    ///
    /// Returns the number of values delivered.
    pub fn single_consumer_poll<F>(&self, mut consumer: F) -> usize
    where
        F: FnMut(T),
    {
        let mut delivered = 0;
        while let Some(value) = self.poll() {
            consumer(value);
            delivered += 1;
        }
        delivered
    }

    /// Fill `buffer` from the front by repeated polls.
    ///
    /// Stops when the buffer is full or the ring reports empty, and returns
    /// how many leading elements were overwritten.
    pub fn single_consumer_poll_into(&self, buffer: &mut [T]) -> usize {
        let mut filled = 0;
        for out in buffer.iter_mut() {
            match self.poll() {
                Some(value) => {
                    *out = value;
                    filled += 1;
                }
                None => break,
            }
        }
        filled
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        // Exclusive access: no offer is mid-write, so every position in
        // [head, tail) holds a published value.
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        debug_assert_bounded_count!(tail.wrapping_sub(head), self.capacity() as u64);

        let mut pos = head;
        while pos != tail {
            let idx = (pos & self.mask) as usize;
            let slot = &mut self.slots[idx];
            if *slot.stamp.get_mut() == pos.wrapping_add(1) {
                // SAFETY: a stamp of `pos + 1` means the value for `pos` was
                // written and never moved out.
                unsafe {
                    ptr::drop_in_place(slot.value.get_mut().as_mut_ptr());
                }
            }
            pos = pos.wrapping_add(1);
        }
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .field("batch_limit", &self.config.batch_limit)
            .finish()
    }
}
