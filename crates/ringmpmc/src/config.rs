use crate::RingError;

/// Largest supported ring size exponent (4G slots).
pub const MAX_RING_BITS: u8 = 32;

/// Default number of slots a single batched-poll round may claim.
pub const DEFAULT_BATCH_LIMIT: usize = 8;

/// Configuration for [`RingBuffer`](crate::RingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Ring buffer size as power of 2 (default: 10 = 1024 slots)
    pub ring_bits: u8,
    /// Maximum slots claimed by one CAS in `poll_n_batched` (default: 8)
    pub batch_limit: usize,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(ring_bits: u8, batch_limit: usize, enable_metrics: bool) -> Self {
        Self {
            ring_bits,
            batch_limit,
            enable_metrics,
        }
    }

    /// Derives a configuration from an explicit slot count.
    ///
    /// The count must be a power of two and at least 2; anything else would
    /// break the `position & mask` index arithmetic, so it is rejected here
    /// instead of silently aliasing slots later.
    pub fn with_capacity(capacity: usize) -> Result<Self, RingError> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(RingError::InvalidCapacity { capacity });
        }
        let config = Self {
            ring_bits: capacity.trailing_zeros() as u8,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the batched-poll claim limit.
    pub const fn with_batch_limit(mut self, batch_limit: usize) -> Self {
        self.batch_limit = batch_limit;
        self
    }

    /// Enables or disables metrics collection.
    pub const fn with_metrics(mut self, enable_metrics: bool) -> Self {
        self.enable_metrics = enable_metrics;
        self
    }

    /// Checks the configuration before any allocation happens.
    pub fn validate(&self) -> Result<(), RingError> {
        if self.ring_bits == 0 {
            return Err(RingError::InvalidCapacity { capacity: 1 });
        }
        if self.ring_bits > MAX_RING_BITS {
            return Err(RingError::CapacityTooLarge {
                ring_bits: self.ring_bits,
                max: MAX_RING_BITS,
            });
        }
        if self.batch_limit == 0 {
            return Err(RingError::InvalidBatchLimit);
        }
        Ok(())
    }

    /// Returns the capacity of the ring buffer.
    #[inline]
    pub const fn capacity(&self) -> usize {
        1 << self.ring_bits
    }

    /// Returns the mask for index wrapping.
    #[inline]
    pub const fn mask(&self) -> usize {
        self.capacity() - 1
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring_bits: 10, // 1K slots
            batch_limit: DEFAULT_BATCH_LIMIT,
            enable_metrics: false,
        }
    }
}

/// Low latency configuration (256 slots, short batched scans)
pub const LOW_LATENCY_CONFIG: Config = Config::new(8, 4, false);

/// High throughput configuration (64K slots, long batched claims)
pub const HIGH_THROUGHPUT_CONFIG: Config = Config::new(16, 32, false);
