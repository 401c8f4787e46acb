use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use timber_runtime::{Runtime, Scheduler};

fn fan_out(rt: Arc<Runtime>, hits: Arc<AtomicUsize>, depth: usize) {
    hits.fetch_add(1, Ordering::SeqCst);
    if depth == 0 {
        return;
    }
    for _ in 0..2 {
        let (rt2, hits2) = (rt.clone(), hits.clone());
        rt.run_async(Box::new(move || fan_out(rt2, hits2, depth - 1)));
    }
}

#[test]
fn wait_idle_covers_tasks_spawned_by_tasks() {
    let rt = Arc::new(Runtime::new(3).expect("runtime"));
    let hits = Arc::new(AtomicUsize::new(0));
    fan_out(rt.clone(), hits.clone(), 6);
    assert!(rt.wait_idle(Duration::from_secs(10)));
    // 1 + 2 + 4 + ... + 64
    assert_eq!(hits.load(Ordering::SeqCst), 127);
    let stats = rt.stats();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.completed, 126);
}

#[test]
fn worker_survives_a_panicking_task() {
    let rt = Runtime::new(1).expect("runtime");
    let hits = Arc::new(AtomicUsize::new(0));
    rt.run_async(Box::new(|| panic!("bad task")));
    let h = hits.clone();
    rt.run_async(Box::new(move || {
        h.fetch_add(1, Ordering::SeqCst);
    }));
    assert!(rt.wait_idle(Duration::from_secs(10)));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(rt.stats().panicked, 1);
}

#[test]
fn zero_workers_is_clamped_to_one() {
    let rt = Runtime::new(0).expect("runtime");
    assert_eq!(rt.workers, 1);
    assert!(rt.is_idle());
}

#[test]
fn wait_idle_times_out_while_work_is_running_and_accepts_any_timeout() {
    let rt = Runtime::new(1).expect("runtime");
    let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
    rt.run_async(Box::new(move || {
        let _ = release_rx.recv();
    }));
    assert!(!rt.wait_idle(Duration::from_millis(20)));
    assert!(!rt.is_idle());
    release_tx.send(()).expect("worker waiting");
    assert!(rt.wait_idle(Duration::MAX));
    assert_eq!(rt.stats().completed, 1);
}
