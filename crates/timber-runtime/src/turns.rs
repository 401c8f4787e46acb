use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::{Scheduler, Task, panic_message};

/// Deterministic scheduler driven by the host loop. Tasks wait until
/// [`TurnScheduler::run_turn`] and run on the calling thread; work submitted
/// during a turn waits for the next one.
pub struct TurnScheduler {
    tx: Sender<Task>,
    rx: Receiver<Task>,
    turns: AtomicU64,
    executed: AtomicU64,
}

impl Default for TurnScheduler {
    fn default() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            turns: AtomicU64::new(0),
            executed: AtomicU64::new(0),
        }
    }
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.rx.is_empty()
    }

    /// Run the tasks that were queued when the turn started. Returns how many ran.
    pub fn run_turn(&self) -> usize {
        let batch = self.rx.len();
        if batch == 0 {
            return 0;
        }
        let mut ran = 0;
        for _ in 0..batch {
            let Ok(task) = self.rx.try_recv() else {
                break;
            };
            if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                log::error!(
                    target: "timber::runtime",
                    "task panicked: {}",
                    panic_message(&*payload)
                );
            }
            ran += 1;
        }
        self.turns.fetch_add(1, Ordering::Relaxed);
        self.executed.fetch_add(ran as u64, Ordering::Relaxed);
        ran
    }

    /// Run turns until nothing is queued or `max_turns` is hit. Returns the
    /// number of turns that ran.
    pub fn run_until_idle(&self, max_turns: usize) -> usize {
        let mut turns = 0;
        while turns < max_turns && self.run_turn() > 0 {
            turns += 1;
        }
        turns
    }

    pub fn turns(&self) -> u64 {
        self.turns.load(Ordering::Relaxed)
    }

    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }
}

impl Scheduler for TurnScheduler {
    fn run_async(&self, task: Task) {
        // Cannot fail: `self.rx` keeps the channel open.
        let _ = self.tx.send(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn follow_up_work_waits_for_the_next_turn() {
        let sched = Arc::new(TurnScheduler::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let (s, h) = (sched.clone(), hits.clone());
        sched.run_async(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
            let h2 = h.clone();
            s.run_async(Box::new(move || {
                h2.fetch_add(10, Ordering::SeqCst);
            }));
        }));
        assert_eq!(sched.run_turn(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(sched.pending(), 1);
        assert_eq!(sched.run_turn(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 11);
        assert_eq!(sched.run_turn(), 0);
        assert_eq!(sched.turns(), 2);
    }

    #[test]
    fn panicking_task_does_not_stop_the_turn() {
        let sched = TurnScheduler::new();
        let hits = Arc::new(AtomicUsize::new(0));
        sched.run_async(Box::new(|| panic!("boom")));
        let h = hits.clone();
        sched.run_async(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(sched.run_turn(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_until_idle_respects_turn_cap() {
        fn chain(s: Arc<TurnScheduler>, left: usize) {
            if left == 0 {
                return;
            }
            let s2 = s.clone();
            s.run_async(Box::new(move || chain(s2, left - 1)));
        }
        let sched = Arc::new(TurnScheduler::new());
        chain(sched.clone(), 10);
        assert_eq!(sched.run_until_idle(4), 4);
        assert!(!sched.is_idle());
        assert_eq!(sched.run_until_idle(100), 6);
        assert!(sched.is_idle());
    }
}
