use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::{Scheduler, Task, panic_message};

#[derive(Clone, Copy, Debug, Default)]
pub struct RuntimeStats {
    pub workers: usize,
    pub queued: usize,
    pub pending: usize,
    pub completed: u64,
    pub panicked: u64,
}

/// Background worker pool. Each worker drains a shared task channel.
pub struct Runtime {
    // Dropped first so workers see a closed channel and exit.
    job_tx: Sender<Task>,
    _pool: ThreadPool,
    q_tasks: Arc<AtomicUsize>,
    // queued + running; a task that schedules follow-up work bumps this before
    // its own completion is counted, so zero really means idle.
    pending: Arc<AtomicUsize>,
    // Pinged whenever `pending` drops to zero. Capacity one: a stale ping only
    // makes a waiter re-check `pending`.
    idle_tx: Sender<()>,
    idle_rx: Receiver<()>,
    completed: Arc<AtomicU64>,
    panicked: Arc<AtomicU64>,
    pub workers: usize,
}

impl Runtime {
    pub fn new(workers: usize) -> Result<Self, ThreadPoolBuildError> {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<Task>();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("timber-worker-{i}"))
            .build()?;

        let q_tasks = Arc::new(AtomicUsize::new(0));
        let pending = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicU64::new(0));
        let panicked = Arc::new(AtomicU64::new(0));
        let (idle_tx, idle_rx) = bounded::<()>(1);

        for _ in 0..workers {
            let rx = job_rx.clone();
            let q_tasks = q_tasks.clone();
            let pending = pending.clone();
            let completed = completed.clone();
            let panicked = panicked.clone();
            let idle_tx = idle_tx.clone();
            pool.spawn(move || {
                while let Ok(task) = rx.recv() {
                    q_tasks.fetch_sub(1, Ordering::Relaxed);
                    if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                        panicked.fetch_add(1, Ordering::Relaxed);
                        log::error!(
                            target: "timber::runtime",
                            "task panicked: {}",
                            panic_message(&*payload)
                        );
                    }
                    completed.fetch_add(1, Ordering::Relaxed);
                    finish_one(&pending, &idle_tx);
                }
            });
        }
        log::debug!(target: "timber::runtime", "started {workers} worker(s)");

        Ok(Self {
            job_tx,
            _pool: pool,
            q_tasks,
            pending,
            idle_tx,
            idle_rx,
            completed,
            panicked,
            workers,
        })
    }

    /// Workers sized from the machine's parallelism, leaving one core for the
    /// caller's main loop.
    pub fn with_default_workers() -> Result<Self, ThreadPoolBuildError> {
        let n = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::new(n.saturating_sub(1))
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }

    /// Block until every submitted task, including tasks those tasks
    /// submitted, has finished. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        // No representable deadline means wait for as long as it takes.
        let deadline = Instant::now().checked_add(timeout);
        while !self.is_idle() {
            let woke = match deadline {
                Some(at) => self.idle_rx.recv_deadline(at).is_ok(),
                None => self.idle_rx.recv().is_ok(),
            };
            if !woke {
                return self.is_idle();
            }
        }
        true
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            workers: self.workers,
            queued: self.q_tasks.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

impl Scheduler for Runtime {
    fn run_async(&self, task: Task) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.q_tasks.fetch_add(1, Ordering::Relaxed);
        if self.job_tx.send(task).is_err() {
            self.q_tasks.fetch_sub(1, Ordering::Relaxed);
            finish_one(&self.pending, &self.idle_tx);
            log::warn!(target: "timber::runtime", "task dropped: worker channel closed");
        }
    }
}

fn finish_one(pending: &AtomicUsize, idle_tx: &Sender<()>) {
    if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
        match idle_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                log::trace!(target: "timber::runtime", "idle signal has no waiter");
            }
        }
    }
}
