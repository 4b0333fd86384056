// Cooperative delay tasks driven by the simulation tick.
//
// Every timer lives in one `Scheduler` owned by the cafe root. Components
// schedule a callback to run after a delay; `advance(dt)` moves simulated time
// forward and runs whatever came due, earliest expiry first.

use super::ports::RandomSource;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Handle to a scheduled callback. Ids are never reused, so a stale handle
/// can never cancel a newer timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct Pending {
    due: f64,
    label: &'static str,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct SchedulerInner {
    now: f64,
    next_id: u64,
    pending: HashMap<u64, Pending>,
}

impl SchedulerInner {
    // Earliest due entry scheduled before `horizon`, ties broken by scheduling order.
    fn take_next_due(&mut self, horizon: u64) -> Option<(u64, Pending)> {
        let now = self.now;
        let id = self
            .pending
            .iter()
            .filter(|(id, p)| **id < horizon && p.due <= now)
            .min_by(|(a_id, a), (b_id, b)| a.due.total_cmp(&b.due).then(a_id.cmp(b_id)))
            .map(|(id, _)| *id)?;
        self.pending.remove(&id).map(|p| (id, p))
    }
}

#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated seconds since the scheduler was created.
    pub fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    /// Runs `callback` once `delay` seconds of simulated time have passed.
    pub fn after(
        &self,
        delay: f32,
        label: &'static str,
        callback: impl FnOnce() + 'static,
    ) -> TimerHandle {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let due = inner.now + f64::from(delay.max(0.0));
        inner.pending.insert(
            id,
            Pending {
                due,
                label,
                callback: Box::new(callback),
            },
        );
        trace!(timer = id, label, delay, "timer scheduled");
        TimerHandle(id)
    }

    /// Like [`Scheduler::after`] with the delay sampled once, uniformly in `min..max`.
    pub fn after_random(
        &self,
        min: f32,
        max: f32,
        random: &dyn RandomSource,
        label: &'static str,
        callback: impl FnOnce() + 'static,
    ) -> TimerHandle {
        let delay = random.range_f32(min, max);
        self.after(delay, label, callback)
    }

    /// Cancels a pending timer. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        let removed = self.inner.borrow_mut().pending.remove(&handle.0);
        if let Some(pending) = &removed {
            trace!(timer = handle.0, label = pending.label, "timer cancelled");
        }
        removed.is_some()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.inner.borrow().pending.contains_key(&handle.0)
    }

    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Moves simulated time forward by `dt` seconds and runs every callback that
    /// came due. Returns how many ran.
    ///
    /// Callbacks run with the scheduler unborrowed, so they may schedule or
    /// cancel timers. Only timers that existed when the advance began can run;
    /// anything scheduled from a callback waits for the next advance, even with
    /// no delay, so a callback that rearms itself cannot stall the tick.
    pub fn advance(&self, dt: f32) -> usize {
        let horizon = {
            let mut inner = self.inner.borrow_mut();
            inner.now += f64::from(dt.max(0.0));
            inner.next_id
        };

        let mut fired = 0;
        loop {
            let next = self.inner.borrow_mut().take_next_due(horizon);
            let Some((id, pending)) = next else {
                break;
            };
            trace!(timer = id, label = pending.label, "timer fired");
            (pending.callback)();
            fired += 1;
        }
        fired
    }
}

/// One timer per purpose. Re-arming cancels whatever the slot held before, so
/// a slot never has two live timers.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<TimerHandle>,
}

impl TimerSlot {
    pub fn rearm(
        &mut self,
        scheduler: &Scheduler,
        delay: f32,
        label: &'static str,
        callback: impl FnOnce() + 'static,
    ) -> TimerHandle {
        self.cancel(scheduler);
        let handle = scheduler.after(delay, label, callback);
        self.handle = Some(handle);
        handle
    }

    pub fn rearm_random(
        &mut self,
        scheduler: &Scheduler,
        min: f32,
        max: f32,
        random: &dyn RandomSource,
        label: &'static str,
        callback: impl FnOnce() + 'static,
    ) -> TimerHandle {
        self.cancel(scheduler);
        let handle = scheduler.after_random(min, max, random, label, callback);
        self.handle = Some(handle);
        handle
    }

    /// Cancels the held timer, if any. Returns `true` if a pending timer was stopped.
    pub fn cancel(&mut self, scheduler: &Scheduler) -> bool {
        self.handle
            .take()
            .is_some_and(|handle| scheduler.cancel(handle))
    }

    pub fn is_armed(&self, scheduler: &Scheduler) -> bool {
        self.handle.is_some_and(|handle| scheduler.is_pending(handle))
    }
}
