//! Next-tick task queue
//!
//! Tour work happens on discrete event callbacks. Anything that must run
//! *after* the current event has finished (attaching or detaching a step's
//! click suppressor, delayed storage replies) is deferred here and executed
//! by the host loop on its next tick.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Cloneable handle to a shared FIFO of deferred tasks
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next tick
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run one tick: every task queued before this call, in order.
    ///
    /// Tasks deferred while the tick runs wait for the following tick.
    /// Returns the number of tasks executed.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<Task> = self.queue.borrow_mut().drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    /// Run ticks until the queue is empty, bounded by `max_ticks`.
    ///
    /// Returns the total number of tasks executed.
    pub fn run_until_idle(&self, max_ticks: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_ticks {
            if self.pending() == 0 {
                break;
            }
            total += self.run_pending();
        }
        total
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_tasks_run_in_order() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            scheduler.defer(move || log.borrow_mut().push(i));
        }
        assert_eq!(scheduler.pending(), 3);
        assert_eq!(scheduler.run_pending(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_nested_defer_waits_for_next_tick() {
        let scheduler = Scheduler::new();
        let ran = Rc::new(Cell::new(false));

        let inner_scheduler = scheduler.clone();
        let inner_ran = ran.clone();
        scheduler.defer(move || {
            inner_scheduler.defer(move || inner_ran.set(true));
        });

        assert_eq!(scheduler.run_pending(), 1);
        assert!(!ran.get());
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.run_pending(), 1);
        assert!(ran.get());
    }

    #[test]
    fn test_run_until_idle_is_bounded() {
        let scheduler = Scheduler::new();
        fn requeue(scheduler: Scheduler) {
            let next = scheduler.clone();
            scheduler.defer(move || requeue(next));
        }
        requeue(scheduler.clone());
        assert_eq!(scheduler.run_until_idle(5), 5);
        assert_eq!(scheduler.pending(), 1);
    }
}
