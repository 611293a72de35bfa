//! Deterministic timer queue for the cooperative event loop
//!
//! Time is a virtual offset since the scheduler was created. The daemon feeds it
//! real elapsed time; tests step it one callback at a time.

use crate::actions::Callback;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

struct Entry {
    deadline: Duration,
    sequence: u64,
    callback: Callback,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap yields the earliest deadline, then the oldest registration
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Callbacks ordered by deadline, FIFO among equal deadlines
#[derive(Default)]
pub struct Scheduler {
    now: Duration,
    next_sequence: u64,
    queue: BinaryHeap<Entry>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.peek().map(|entry| entry.deadline)
    }

    /// Deadlines saturate at `Duration::MAX` instead of overflowing
    pub fn schedule(&mut self, delay: Duration, callback: Callback) {
        let deadline = self.now.saturating_add(delay);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(Entry {
            deadline,
            sequence,
            callback,
        });
    }

    /// Moves the clock forward; it never goes backwards
    pub fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Pops the earliest callback due at `now`.
    ///
    /// The clock is set to the callback's deadline so that delays registered
    /// from inside it are measured from when it was meant to run.
    pub fn pop_due(&mut self, now: Duration) -> Option<Callback> {
        if self.next_deadline()? > now {
            return None;
        }
        self.pop_next()
    }

    /// Pops the earliest callback regardless of time, advancing the clock to it
    pub fn pop_next(&mut self) -> Option<Callback> {
        let entry = self.queue.pop()?;
        self.advance_to(entry.deadline);
        Some(entry.callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ExecutionContext;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<u32>>>, id: u32) -> Callback {
        let log = log.clone();
        Box::new(move |_ctx: &mut dyn ExecutionContext| log.borrow_mut().push(id))
    }

    fn run(scheduler: &mut Scheduler, now: Duration) -> Vec<Callback> {
        let mut due = Vec::new();
        while let Some(callback) = scheduler.pop_due(now) {
            due.push(callback);
        }
        due
    }

    #[test]
    fn orders_by_deadline_then_registration() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::from_millis(20), recorder(&log, 1));
        scheduler.schedule(Duration::from_millis(10), recorder(&log, 2));
        scheduler.schedule(Duration::from_millis(10), recorder(&log, 3));
        scheduler.schedule(Duration::ZERO, recorder(&log, 4));

        let mut mapper = crate::mapper::Mapper::default();
        for callback in run(&mut scheduler, Duration::from_millis(100)) {
            callback(mapper.context());
        }
        assert_eq!(*log.borrow(), vec![4, 2, 3, 1]);
        assert_eq!(scheduler.now(), Duration::from_millis(20));
    }

    #[test]
    fn pop_due_leaves_future_callbacks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::from_millis(5), recorder(&log, 1));
        scheduler.schedule(Duration::from_millis(50), recorder(&log, 2));

        assert_eq!(run(&mut scheduler, Duration::from_millis(10)).len(), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_deadline(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn huge_delays_saturate() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(Duration::from_secs(5));
        scheduler.schedule(Duration::MAX, recorder(&log, 1));
        scheduler.schedule(Duration::from_millis(1), recorder(&log, 2));

        assert_eq!(run(&mut scheduler, Duration::from_secs(10)).len(), 1);
        assert_eq!(scheduler.next_deadline(), Some(Duration::MAX));
        assert!(scheduler.pop_next().is_some());
        assert_eq!(scheduler.now(), Duration::MAX);
    }

    #[test]
    fn clock_never_goes_backwards() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(Duration::from_millis(30));
        scheduler.advance_to(Duration::from_millis(10));
        assert_eq!(scheduler.now(), Duration::from_millis(30));
    }
}
