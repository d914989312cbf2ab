//! Virtual-clock timer service
//!
//! Intervals are owned by whichever directive started them and must be
//! cleared by that directive's own logic; an un-cleared interval keeps
//! firing (and thus keeps triggering digests) forever.
//!
//! Time is a virtual millisecond clock driven by the embedding application
//! ([`crate::App::advance`]), which keeps the cooperative single-threaded
//! model: a callback never preempts anything, it only runs when the clock is
//! explicitly advanced past its due time.

use std::rc::Rc;

use tracing::debug;

/// Handle to a running interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(usize);

/// Timer callbacks capture cheap-clone handles (props, detectors), never
/// direct references into the framework.
pub type TimerCallback = Rc<dyn Fn()>;

struct Interval {
    period_ms: u64,
    next_due: u64,
    callback: TimerCallback,
}

/// Interval registry with a virtual clock.
#[derive(Default)]
pub struct Scheduler {
    now_ms: u64,
    // slot map; cleared intervals leave a None so TimerIds stay stable
    intervals: Vec<Option<Interval>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Register a repeating callback; first fire is one period from now.
    ///
    /// A zero period is clamped to 1 ms so an interval can never fire
    /// infinitely within a single clock step.
    pub fn set_interval(&mut self, period_ms: u64, callback: TimerCallback) -> TimerId {
        let period_ms = period_ms.max(1);
        let id = TimerId(self.intervals.len());
        self.intervals.push(Some(Interval {
            period_ms,
            next_due: self.now_ms + period_ms,
            callback,
        }));
        debug!(timer = id.0, period_ms, "interval started");
        id
    }

    /// Stop an interval. Clearing twice is a no-op.
    pub fn clear_interval(&mut self, id: TimerId) {
        if let Some(slot) = self.intervals.get_mut(id.0) {
            if slot.take().is_some() {
                debug!(timer = id.0, "interval cleared");
            }
        }
    }

    pub fn is_running(&self, id: TimerId) -> bool {
        self.intervals.get(id.0).is_some_and(Option::is_some)
    }

    /// Pop the next callback due at or before `target_ms`, advancing the
    /// clock to its due time and re-arming the interval.
    ///
    /// Returns `None` when nothing more is due; the caller then advances the
    /// clock to `target_ms` itself. Ties fire in registration order.
    pub fn pop_due(&mut self, target_ms: u64) -> Option<TimerCallback> {
        let (index, due) = self
            .intervals
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|iv| (i, iv.next_due)))
            .min_by_key(|(i, due)| (*due, *i))?;
        if due > target_ms {
            return None;
        }
        self.now_ms = due;
        let interval = self.intervals[index]
            .as_mut()
            .expect("slot checked above");
        interval.next_due += interval.period_ms;
        Some(Rc::clone(&interval.callback))
    }

    /// Move the clock forward without firing anything (end of an advance).
    pub fn settle_at(&mut self, target_ms: u64) {
        if target_ms > self.now_ms {
            self.now_ms = target_ms;
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now_ms", &self.now_ms)
            .field(
                "running",
                &self.intervals.iter().filter(|s| s.is_some()).count(),
            )
            .finish()
    }
}
