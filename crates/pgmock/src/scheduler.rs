//! Cooperative deferred-task scheduling.
//!
//! Every operation that would be asynchronous against a real database
//! completes its logic synchronously but defers delivery of its callback to
//! the next turn of this scheduler. Code under test therefore cannot
//! distinguish the mock from a real asynchronous driver by observing
//! callback timing. There are no timers and no threads; tasks run in FIFO
//! order when the owner drains the queue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// A cloneable handle to a single-threaded FIFO task queue.
///
/// Cloning the handle shares the queue. Tasks deferred while the queue is
/// draining are run in the same drain, after the tasks already queued.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl Scheduler {
    /// Create a new, empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a task to run on the next drain.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
        tracing::trace!(pending = self.pending(), "deferred task scheduled");
    }

    /// Number of tasks currently waiting.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Check whether no tasks are waiting.
    pub fn is_idle(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Run queued tasks in order until the queue is empty.
    ///
    /// Returns the number of tasks run. Each task fires exactly once;
    /// tasks scheduled by a running task are picked up by the same drain.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must not be held while the task runs, since the
            // task may defer further work onto the same queue.
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        tracing::trace!(ran, "scheduler drained");
        ran
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
