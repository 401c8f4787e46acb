//! Task scheduling: the host's "run this later, off the main loop" surface.
#![forbid(unsafe_code)]

mod threaded;
mod turns;

pub use threaded::{Runtime, RuntimeStats};
pub use turns::TurnScheduler;

use std::any::Any;

/// Fire-and-forget unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Send + Sync {
    fn run_async(&self, task: Task);
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
