//! Leading + trailing throttle over the virtual-time scheduler

use std::time::Duration;

use super::scheduler::{Scheduler, TaskId};

/// Runs at most once per `limit`
///
/// The first call after a quiet gap runs immediately (leading edge). Calls
/// inside the window replace a single trailing task due at the end of the
/// window, so a burst collapses to its last call.
#[derive(Debug)]
pub struct Throttle {
    limit: Duration,
    last_ran: Option<Duration>,
    pending: Option<TaskId>,
}

impl Throttle {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            last_ran: None,
            pending: None,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Register a call at `now`
    ///
    /// Returns `true` when the call runs on the leading edge. Otherwise
    /// `trailing` is queued (replacing any earlier trailing task) and the
    /// caller must invoke [`Throttle::fire_trailing`] when it comes due.
    pub fn call<T>(&mut self, now: Duration, scheduler: &mut Scheduler<T>, trailing: T) -> bool {
        let idle = match self.last_ran {
            Some(last) => now.saturating_sub(last) >= self.limit,
            None => true,
        };
        if self.pending.is_none() && idle {
            self.last_ran = Some(now);
            return true;
        }

        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
        let at = self
            .last_ran
            .map(|last| (last + self.limit).max(now))
            .unwrap_or(now);
        self.pending = Some(scheduler.schedule(at, trailing));
        false
    }

    /// The trailing task ran at `now`
    pub fn fire_trailing(&mut self, now: Duration) {
        self.pending = None;
        self.last_ran = Some(now);
    }

    /// Forget the pending trailing task, cancelling it
    pub fn cancel<T>(&mut self, scheduler: &mut Scheduler<T>) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Feed calls at `times`, returning the instants at which work ran
    fn run(times: &[u64], until: u64) -> Vec<Duration> {
        let mut throttle = Throttle::new(ms(200));
        let mut sched = Scheduler::new();
        let mut ran = Vec::new();
        for &t in times {
            while let Some((at, _, ())) = sched.pop_due(ms(t)) {
                throttle.fire_trailing(at);
                ran.push(at);
            }
            if throttle.call(ms(t), &mut sched, ()) {
                ran.push(ms(t));
            }
        }
        while let Some((at, _, ())) = sched.pop_due(ms(until)) {
            throttle.fire_trailing(at);
            ran.push(at);
        }
        ran
    }

    #[test]
    fn test_first_call_is_leading() {
        assert_eq!(run(&[0], 1000), vec![ms(0)]);
    }

    #[test]
    fn test_burst_collapses_to_one_trailing_run() {
        // ran at 0, then a burst inside the window
        let times: Vec<u64> = std::iter::once(0).chain((100..200).step_by(10)).collect();
        assert_eq!(run(&times, 1000), vec![ms(0), ms(200)]);
    }

    #[test]
    fn test_leading_after_quiet_gap() {
        assert_eq!(run(&[0, 500], 1000), vec![ms(0), ms(500)]);
    }

    #[test]
    fn test_continuous_motion_runs_once_per_window() {
        let times: Vec<u64> = (0..=600).step_by(20).collect();
        let ran = run(&times, 2000);
        assert_eq!(ran, vec![ms(0), ms(200), ms(400), ms(600), ms(800)]);
    }
}
