//! RingMPMC - Lock-Free Multi-Producer Multi-Consumer Ring Buffer
//!
//! A fixed-capacity circular buffer for handing values between threads
//! without locks. Slot ownership is arbitrated by two monotonic positions
//! (`head`, `tail`) advanced with compare-and-swap, plus a per-slot generation
//! stamp that tells producers and consumers whether a slot is theirs this lap.
//!
//! # Key Features
//!
//! - Single-attempt `offer`/`poll`: failure is a `bool`/`Option`, retry policy
//!   belongs to the caller
//! - Generation stamps instead of a full flag (ABA-safe slot reuse)
//! - Cache-line padded `head`, `tail` and slots (no false sharing)
//! - Batched poll claiming a run of slots with one CAS
//! - Spin helpers for callers that know they are the sole producer or consumer
//!
//! # Example
//!
//! ```
//! use ringmpmc_rs::{Config, RingBuffer};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let ring = Arc::new(RingBuffer::<u64>::new(Config::default()).unwrap());
//!
//! let producer = {
//!     let ring = Arc::clone(&ring);
//!     thread::spawn(move || {
//!         let mut next = 0;
//!         ring.single_producer_offer(|| {
//!             next += 1;
//!             (next <= 100).then_some(next)
//!         })
//!     })
//! };
//! assert_eq!(producer.join().unwrap(), 100);
//!
//! let mut sum = 0;
//! while sum < 5050 {
//!     for v in ring.poll_n_batched(16) {
//!         sum += v;
//!     }
//! }
//! assert_eq!(sum, 5050);
//! assert!(ring.is_empty());
//! ```

mod backoff;
mod config;
mod error;
mod invariants;
mod metrics;
mod ring;
mod trace;

pub use backoff::Backoff;
pub use config::{
    Config, DEFAULT_BATCH_LIMIT, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG, MAX_RING_BITS,
};
pub use error::RingError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::RingBuffer;
pub use trace::init_tracing;
