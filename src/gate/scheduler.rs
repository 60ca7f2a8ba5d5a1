//! Virtual-time task queue with cancel tokens

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Cancel token for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Tasks ordered by due time, then by scheduling order
#[derive(Debug)]
pub struct Scheduler<T> {
    queue: BTreeMap<(Duration, u64), T>,
    due: HashMap<u64, Duration>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            due: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Queue `task` to run at `at`
    pub fn schedule(&mut self, at: Duration, task: T) -> TaskId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((at, seq), task);
        self.due.insert(seq, at);
        TaskId(seq)
    }

    /// Drop a pending task; returns it if it had not run yet
    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        let at = self.due.remove(&id.0)?;
        self.queue.remove(&(at, id.0))
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.due.contains_key(&id.0)
    }

    /// Earliest task due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, TaskId, T)> {
        let (&(at, seq), _) = self.queue.first_key_value()?;
        if at > now {
            return None;
        }
        let task = self.queue.remove(&(at, seq))?;
        self.due.remove(&seq);
        Some((at, TaskId(seq), task))
    }

    /// When the next task is due
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_pop_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(ms(30), "c");
        s.schedule(ms(10), "a");
        s.schedule(ms(10), "b");

        assert_eq!(s.next_due(), Some(ms(10)));
        assert!(s.pop_due(ms(5)).is_none());

        let order: Vec<&str> = std::iter::from_fn(|| s.pop_due(ms(100)).map(|(_, _, t)| t)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let a = s.schedule(ms(10), 1);
        let b = s.schedule(ms(20), 2);
        assert!(s.is_pending(a));

        assert_eq!(s.cancel(a), Some(1));
        assert!(!s.is_pending(a));
        assert_eq!(s.cancel(a), None);

        let (at, id, task) = s.pop_due(ms(50)).unwrap();
        assert_eq!((at, id, task), (ms(20), b, 2));
        // already ran
        assert_eq!(s.cancel(b), None);
    }
}
