//! Shared worker pool
//!
//! One process-wide pool services futures and agent drains. It is
//! created lazily on first use and sized from `CLOVE_POOL_THREADS` (or
//! the hardware thread count). Jobs travel an unbounded channel; a
//! worker that catches a panic from user code logs it and keeps
//! serving.
//!
//! ## Lifecycle counters
//!
//! Lock-free counters mirror the pool's hot path for diagnostics:
//! - `TOTAL_SUBMITTED`: monotonically increasing count of jobs accepted
//! - `TOTAL_COMPLETED`: monotonically increasing count of jobs finished
//! - `ACTIVE_JOBS`: jobs currently executing
//!
//! A leak shows up as `TOTAL_SUBMITTED - TOTAL_COMPLETED - ACTIVE_JOBS
//! > 0` after quiescence.

use clove_core::error::{format_panic_payload, Error};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::thread::JoinHandle;

/// Environment variable overriding the worker count.
const POOL_THREADS_VAR: &str = "CLOVE_POOL_THREADS";

pub static TOTAL_SUBMITTED: AtomicU64 = AtomicU64::new(0);
pub static TOTAL_COMPLETED: AtomicU64 = AtomicU64::new(0);
pub static ACTIVE_JOBS: AtomicUsize = AtomicUsize::new(0);

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Pool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

static POOL: OnceLock<Pool> = OnceLock::new();

fn worker_count() -> usize {
    std::env::var(POOL_THREADS_VAR)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(num_cpus::get)
        .max(1)
}

fn worker_loop(id: usize, receiver: Receiver<Job>) {
    tracing::trace!(worker = id, "pool worker started");
    while let Ok(job) = receiver.recv() {
        ACTIVE_JOBS.fetch_add(1, Ordering::AcqRel);
        if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
            // User code must not take the worker down with it.
            tracing::warn!(
                worker = id,
                panic = %format_panic_payload(&payload),
                "pool job panicked"
            );
        }
        ACTIVE_JOBS.fetch_sub(1, Ordering::AcqRel);
        TOTAL_COMPLETED.fetch_add(1, Ordering::AcqRel);
    }
    tracing::trace!(worker = id, "pool worker exiting");
}

fn pool() -> &'static Pool {
    POOL.get_or_init(|| {
        let threads = worker_count();
        let (sender, receiver) = unbounded::<Job>();
        let workers = (0..threads)
            .map(|id| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("clove-pool-{id}"))
                    .spawn(move || worker_loop(id, receiver))
                    .expect("failed to spawn pool worker")
            })
            .collect();
        tracing::debug!(threads, "worker pool started");
        Pool {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    })
}

/// Submit a job to the shared pool, starting it on first use.
pub fn submit<F>(job: F) -> Result<(), Error>
where
    F: FnOnce() + Send + 'static,
{
    let pool = pool();
    let guard = pool.sender.lock();
    match &*guard {
        Some(sender) => {
            sender
                .send(Box::new(job))
                .map_err(|_| Error::internal("Thread pool is shut down"))?;
            TOTAL_SUBMITTED.fetch_add(1, Ordering::AcqRel);
            Ok(())
        }
        None => Err(Error::internal("Thread pool is shut down")),
    }
}

/// Shut the pool down: close the queue, let workers drain it, join
/// them. Later submissions fail; intended for orderly process exit.
pub fn shutdown() {
    if let Some(pool) = POOL.get() {
        let sender = pool.sender.lock().take();
        drop(sender);
        let workers = std::mem::take(&mut *pool.workers.lock());
        for handle in workers {
            let _ = handle.join();
        }
        tracing::debug!("worker pool shut down");
    }
}

/// Jobs accepted but not yet finished (queued or running).
pub fn pending_jobs() -> u64 {
    TOTAL_SUBMITTED.load(Ordering::Acquire) - TOTAL_COMPLETED.load(Ordering::Acquire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    #[serial]
    fn test_submit_runs_job() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        submit(move || flag.store(true, Ordering::SeqCst)).unwrap();
        for _ in 0..100 {
            if ran.load(Ordering::SeqCst) {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("job never ran");
    }

    #[test]
    #[serial]
    fn test_worker_survives_panicking_job() {
        submit(|| panic!("deliberate test panic")).unwrap();
        // The pool must still accept and run work afterwards.
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        std::thread::sleep(Duration::from_millis(20));
        submit(move || flag.store(true, Ordering::SeqCst)).unwrap();
        for _ in 0..100 {
            if ran.load(Ordering::SeqCst) {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("pool died after a panicking job");
    }
}
