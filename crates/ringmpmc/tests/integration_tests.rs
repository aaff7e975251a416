use ringmpmc_rs::{init_tracing, Config, RingBuffer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_fifo_ordering_single_producer() {
    let ring = RingBuffer::<u64>::new(Config::default()).unwrap();
    let capacity = ring.capacity() as u64;

    const N: u64 = 10_000;

    // Interleave so the ring laps many times
    let mut expected = 0;
    for i in 0..N {
        assert!(ring.offer(i), "offer {} failed on a non-full ring", i);
        if (i + 1) % capacity == 0 {
            while let Some(item) = ring.poll() {
                assert_eq!(item, expected, "FIFO violation: expected {}, got {}", expected, item);
                expected += 1;
            }
        }
    }
    while let Some(item) = ring.poll() {
        assert_eq!(item, expected);
        expected += 1;
    }

    assert_eq!(expected, N);
    assert!(ring.is_empty());
}

#[test]
fn test_round_trip_full_capacity() {
    let ring = RingBuffer::<String>::with_capacity(16).unwrap();
    for i in 0..16 {
        assert!(ring.offer(format!("v{}", i)));
    }
    assert!(!ring.offer("overflow".to_string()));

    for i in 0..16 {
        assert_eq!(ring.poll(), Some(format!("v{}", i)));
    }
    assert_eq!(ring.poll(), None);
    assert!(ring.is_empty());
}

#[test]
fn test_batch_matches_sequential_polls() {
    let a = RingBuffer::<u32>::with_capacity(64).unwrap();
    let b = RingBuffer::<u32>::with_capacity(64).unwrap();
    for i in 0..40 {
        assert!(a.offer(i * 3));
        assert!(b.offer(i * 3));
    }

    let batched = a.poll_n_batched(25);
    let sequential: Vec<u32> = (0..25).map(|_| b.poll().unwrap()).collect();
    assert_eq!(batched, sequential);
    assert_eq!(a.len(), b.len());
}

/// Every producer tags values with its id; consumers must see each tag
/// exactly once across all of them.
#[test]
fn test_concurrent_stress_no_loss_no_duplicates() {
    init_tracing();

    const N_PRODUCERS: usize = 8;
    const N_CONSUMERS: usize = 8;
    const ITEMS_PER_PRODUCER: usize = 10_000;
    const TOTAL: usize = N_PRODUCERS * ITEMS_PER_PRODUCER;

    let ring = Arc::new(RingBuffer::<u64>::with_capacity(1024).unwrap());
    let received = Arc::new(AtomicUsize::new(0));

    let mut producers = vec![];
    for producer_id in 0..N_PRODUCERS {
        let ring = Arc::clone(&ring);
        producers.push(thread::spawn(move || {
            for seq in 0..ITEMS_PER_PRODUCER {
                let mut tag = ((producer_id as u64) << 32) | seq as u64;
                while let Err(v) = ring.try_offer(tag) {
                    tag = v;
                    thread::yield_now();
                }
            }
        }));
    }

    let mut consumers = vec![];
    for _ in 0..N_CONSUMERS {
        let ring = Arc::clone(&ring);
        let received = Arc::clone(&received);
        consumers.push(thread::spawn(move || {
            let mut local = Vec::new();
            while received.load(Ordering::Acquire) < TOTAL {
                match ring.poll() {
                    Some(tag) => {
                        local.push(tag);
                        received.fetch_add(1, Ordering::AcqRel);
                    }
                    None => thread::yield_now(),
                }
            }
            local
        }));
    }

    for handle in producers {
        handle.join().unwrap();
    }

    let mut seen = vec![vec![false; ITEMS_PER_PRODUCER]; N_PRODUCERS];
    let mut count = 0;
    for handle in consumers {
        for tag in handle.join().unwrap() {
            let producer_id = (tag >> 32) as usize;
            let seq = (tag & 0xFFFF_FFFF) as usize;
            assert!(!seen[producer_id][seq], "duplicate delivery of {}:{}", producer_id, seq);
            seen[producer_id][seq] = true;
            count += 1;
        }
    }

    assert_eq!(count, TOTAL);
    assert!(seen.iter().all(|p| p.iter().all(|&s| s)), "lost values");
    assert!(ring.is_empty());
}

/// Batched consumers racing each other still keep per-producer order.
#[test]
fn test_batched_consumers_preserve_producer_order() {
    const N_PRODUCERS: usize = 4;
    const N_CONSUMERS: usize = 4;
    const ITEMS_PER_PRODUCER: u64 = 5_000;
    const TOTAL: usize = N_PRODUCERS * ITEMS_PER_PRODUCER as usize;

    let config = Config::new(8, 8, true); // 256 slots
    let ring = Arc::new(RingBuffer::<(usize, u64)>::new(config).unwrap());
    let received = Arc::new(AtomicUsize::new(0));

    let mut producers = vec![];
    for producer_id in 0..N_PRODUCERS {
        let ring = Arc::clone(&ring);
        producers.push(thread::spawn(move || {
            for i in 0..ITEMS_PER_PRODUCER {
                let mut item = (producer_id, i);
                while let Err(v) = ring.try_offer(item) {
                    item = v;
                    std::hint::spin_loop();
                }
            }
        }));
    }

    let mut consumers = vec![];
    for _ in 0..N_CONSUMERS {
        let ring = Arc::clone(&ring);
        let received = Arc::clone(&received);
        consumers.push(thread::spawn(move || {
            let mut batches = Vec::new();
            while received.load(Ordering::Acquire) < TOTAL {
                let batch = ring.poll_n_batched(32);
                if batch.is_empty() {
                    thread::yield_now();
                    continue;
                }
                received.fetch_add(batch.len(), Ordering::AcqRel);
                batches.push(batch);
            }
            batches
        }));
    }

    for handle in producers {
        handle.join().unwrap();
    }

    let mut per_producer = vec![0u64; N_PRODUCERS];
    for handle in consumers {
        for batch in handle.join().unwrap() {
            // each batch was claimed in ring order, so per-producer values
            // inside it must be increasing
            let mut last = vec![None; N_PRODUCERS];
            for (producer_id, value) in batch {
                if let Some(prev) = last[producer_id] {
                    assert!(value > prev, "order violation within batch");
                }
                last[producer_id] = Some(value);
                per_producer[producer_id] += 1;
            }
        }
    }

    assert!(per_producer.iter().all(|&c| c == ITEMS_PER_PRODUCER));

    let m = ring.metrics();
    assert_eq!(m.offers, TOTAL as u64);
    assert_eq!(m.polls, TOTAL as u64);
    assert!(m.batches_claimed > 0);
}

#[test]
fn test_spin_wrappers_pipeline() {
    const N: u64 = 50_000;

    let ring = Arc::new(RingBuffer::<u64>::with_capacity(128).unwrap());

    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let mut next = 0;
            ring.single_producer_offer(|| {
                let v = next;
                next += 1;
                (v < N).then_some(v)
            })
        })
    };

    let mut expected = 0;
    let mut buf = vec![0u64; 64];
    while expected < N {
        let n = ring.single_consumer_poll_into(&mut buf);
        for &v in &buf[..n] {
            assert_eq!(v, expected);
            expected += 1;
        }
        if n == 0 {
            thread::yield_now();
        }
    }

    assert_eq!(producer.join().unwrap(), N as usize);
    assert_eq!(ring.single_consumer_poll(|_| {}), 0);
}
