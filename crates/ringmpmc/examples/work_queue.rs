use ringmpmc_rs::{init_tracing, Config, RingBuffer};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn main() {
    init_tracing();

    println!("RingMPMC Work Queue Example");
    println!("===========================\n");

    let config = Config::new(
        10,   // 1K slots
        16,   // claim up to 16 jobs per CAS
        true, // metrics on for the report below
    );

    let ring = Arc::new(RingBuffer::<u64>::new(config).expect("valid config"));

    const N_PRODUCERS: usize = 4;
    const N_WORKERS: usize = 4;
    const JOBS_PER_PRODUCER: u64 = 250_000;

    println!("Configuration:");
    println!("  Ring capacity: {} slots", ring.capacity());
    println!("  Producers: {}", N_PRODUCERS);
    println!("  Workers: {}", N_WORKERS);
    println!("  Jobs per producer: {}\n", JOBS_PER_PRODUCER);

    let start = Instant::now();
    let done = Arc::new(AtomicBool::new(false));
    let checksum = Arc::new(AtomicU64::new(0));

    let producers: Vec<_> = (0..N_PRODUCERS)
        .map(|_| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for job in 1..=JOBS_PER_PRODUCER {
                    let mut job = job;
                    while let Err(back) = ring.try_offer(job) {
                        job = back;
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let workers: Vec<_> = (0..N_WORKERS)
        .map(|_| {
            let ring = Arc::clone(&ring);
            let done = Arc::clone(&done);
            let checksum = Arc::clone(&checksum);
            thread::spawn(move || {
                let mut handled = 0u64;
                loop {
                    let jobs = ring.poll_n_batched(64);
                    if jobs.is_empty() {
                        if done.load(Ordering::Acquire) && ring.is_empty() {
                            break;
                        }
                        thread::yield_now();
                        continue;
                    }
                    handled += jobs.len() as u64;
                    checksum.fetch_add(jobs.iter().sum::<u64>(), Ordering::Relaxed);
                }
                handled
            })
        })
        .collect();

    for h in producers {
        h.join().unwrap();
    }
    done.store(true, Ordering::Release);

    let mut total = 0;
    for (id, h) in workers.into_iter().enumerate() {
        let handled = h.join().unwrap();
        println!("  worker {} handled {} jobs", id, handled);
        total += handled;
    }

    let elapsed = start.elapsed();
    let expected_sum = N_PRODUCERS as u64 * JOBS_PER_PRODUCER * (JOBS_PER_PRODUCER + 1) / 2;

    println!("\nResults:");
    println!("  Total jobs: {}", total);
    println!("  Checksum ok: {}", checksum.load(Ordering::Relaxed) == expected_sum);
    println!("  Elapsed: {:?}", elapsed);
    println!(
        "  Throughput: {:.2} M jobs/sec",
        total as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );

    let m = ring.metrics();
    println!("\nMetrics:");
    println!("  offers: {} (rejected {})", m.offers, m.offers_rejected);
    println!("  polls: {} (rejected {})", m.polls, m.polls_rejected);
    println!("  batches claimed: {} (retries {})", m.batches_claimed, m.batch_retries);
}
