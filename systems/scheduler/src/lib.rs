#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deferred event scheduler that fires callbacks at absolute simulation times.
//!
//! The scheduler never blocks: a delay means "run this again from a later
//! [`Scheduler::tick`]". Actions fire synchronously on the caller's thread in
//! ascending fire time, ties broken by insertion order, and receive mutable
//! access to both the caller's context and the scheduler so they may enqueue
//! follow-up actions. Anything enqueued while a tick is running waits for the
//! next tick, even with a zero delay.

use std::{collections::BTreeMap, fmt, time::Duration};

use boss_arena_core::Timestamp;
use thiserror::Error;
use tracing::{debug, warn};

/// Callback stored by the scheduler until its fire time elapses.
pub type Action<C> = Box<dyn FnOnce(&mut C, &mut Scheduler<C>) -> anyhow::Result<()>>;

/// Opaque handle identifying a scheduled action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionHandle(u64);

impl ActionHandle {
    /// Insertion sequence number of the action.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Misuse of the scheduler rejected at the call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The requested delay lies in the past.
    #[error("cannot schedule an action {delay_ms}ms in the past")]
    NegativeDelay {
        /// Delay that was requested.
        delay_ms: i64,
    },
}

/// Outcome of a single [`Scheduler::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Number of actions that were invoked.
    pub fired: usize,
    /// Number of invoked actions that returned an error.
    pub failed: usize,
}

/// Time-ordered queue of deferred actions over a context `C`.
pub struct Scheduler<C> {
    now: Timestamp,
    next_sequence: u64,
    queue: BTreeMap<(Timestamp, ActionHandle), Action<C>>,
    fire_times: BTreeMap<ActionHandle, Timestamp>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("next_fire_time", &self.next_fire_time())
            .finish()
    }
}

impl<C> Scheduler<C> {
    /// Creates an empty scheduler whose clock starts at [`Timestamp::ZERO`].
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Timestamp::ZERO)
    }

    /// Creates an empty scheduler whose clock starts at `now`.
    #[must_use]
    pub fn starting_at(now: Timestamp) -> Self {
        Self {
            now,
            next_sequence: 0,
            queue: BTreeMap::new(),
            fire_times: BTreeMap::new(),
        }
    }

    /// Timestamp of the most recent tick.
    #[must_use]
    pub const fn now(&self) -> Timestamp {
        self.now
    }

    /// Schedules `action` to fire `delay` after the scheduler's current time.
    pub fn schedule<F>(&mut self, delay: Duration, action: F) -> ActionHandle
    where
        F: FnOnce(&mut C, &mut Scheduler<C>) -> anyhow::Result<()> + 'static,
    {
        let handle = ActionHandle(self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let fire_time = self.now.saturating_add(delay);
        let _ = self.queue.insert((fire_time, handle), Box::new(action));
        let _ = self.fire_times.insert(handle, fire_time);
        handle
    }

    /// Schedules `action` using a signed millisecond delay, rejecting negative values.
    pub fn schedule_millis<F>(
        &mut self,
        delay_ms: i64,
        action: F,
    ) -> Result<ActionHandle, SchedulerError>
    where
        F: FnOnce(&mut C, &mut Scheduler<C>) -> anyhow::Result<()> + 'static,
    {
        let millis =
            u64::try_from(delay_ms).map_err(|_| SchedulerError::NegativeDelay { delay_ms })?;
        Ok(self.schedule(Duration::from_millis(millis), action))
    }

    /// Removes a pending action without invoking it.
    ///
    /// Returns `false` for handles that already fired, were cancelled, or were
    /// never issued by this scheduler.
    pub fn cancel(&mut self, handle: ActionHandle) -> bool {
        match self.fire_times.remove(&handle) {
            Some(fire_time) => self.queue.remove(&(fire_time, handle)).is_some(),
            None => false,
        }
    }

    /// Reports whether `handle` is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, handle: ActionHandle) -> bool {
        self.fire_times.contains_key(&handle)
    }

    /// Number of actions waiting to fire.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Reports whether no action is waiting to fire.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Fire time of the earliest pending action.
    #[must_use]
    pub fn next_fire_time(&self) -> Option<Timestamp> {
        self.queue.keys().next().map(|(fire_time, _)| *fire_time)
    }

    /// Discards every pending action without invoking it.
    ///
    /// The clock is kept so that handles issued afterwards stay ordered after
    /// every handle issued before. Returns the number of discarded actions.
    pub fn reset(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.fire_times.clear();
        if discarded > 0 {
            debug!(discarded, "scheduler reset discarded pending actions");
        }
        discarded
    }

    /// Advances the clock to `now` and fires every action that was pending when
    /// the tick began and whose fire time is at or before `now`.
    ///
    /// The clock never moves backwards. Errors returned by actions are logged
    /// and counted; they never stop later actions from firing.
    pub fn tick(&mut self, now: Timestamp, context: &mut C) -> TickReport {
        if now > self.now {
            self.now = now;
        }

        let due: Vec<(Timestamp, ActionHandle)> = self
            .queue
            .range(..=(self.now, ActionHandle(u64::MAX)))
            .map(|(key, _)| *key)
            .collect();

        let mut report = TickReport::default();
        for key in due {
            // Earlier actions in this tick may have cancelled this one.
            let Some(action) = self.queue.remove(&key) else {
                continue;
            };
            let _ = self.fire_times.remove(&key.1);

            report.fired += 1;
            if let Err(error) = action(context, self) {
                report.failed += 1;
                warn!(
                    handle = key.1.get(),
                    fire_time = %key.0,
                    error = %error,
                    "scheduled action failed"
                );
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<&'static str>;

    fn push(entry: &'static str) -> impl FnOnce(&mut Log, &mut Scheduler<Log>) -> anyhow::Result<()> {
        move |log, _| {
            log.push(entry);
            Ok(())
        }
    }

    #[test]
    fn fires_in_time_order_with_stable_ties() {
        let mut scheduler = Scheduler::new();
        let mut log = Log::new();

        let _ = scheduler.schedule(Duration::from_millis(200), push("late"));
        let _ = scheduler.schedule(Duration::from_millis(100), push("first"));
        let _ = scheduler.schedule(Duration::from_millis(100), push("second"));
        let _ = scheduler.schedule(Duration::from_millis(100), push("third"));

        let report = scheduler.tick(Timestamp::from_millis(150), &mut log);
        assert_eq!(report, TickReport { fired: 3, failed: 0 });
        assert_eq!(log, ["first", "second", "third"]);

        let report = scheduler.tick(Timestamp::from_millis(200), &mut log);
        assert_eq!(report.fired, 1);
        assert_eq!(log, ["first", "second", "third", "late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn actions_scheduled_during_a_tick_wait_for_the_next_tick() {
        let mut scheduler = Scheduler::new();
        let mut log = Log::new();

        let _ = scheduler.schedule(Duration::ZERO, |log: &mut Log, scheduler: &mut Scheduler<Log>| {
            log.push("outer");
            let _ = scheduler.schedule(Duration::ZERO, push("inner"));
            Ok(())
        });

        let report = scheduler.tick(Timestamp::from_millis(10), &mut log);
        assert_eq!(report.fired, 1);
        assert_eq!(log, ["outer"]);
        assert_eq!(scheduler.pending_len(), 1);
        assert_eq!(scheduler.next_fire_time(), Some(Timestamp::from_millis(10)));

        let report = scheduler.tick(Timestamp::from_millis(10), &mut log);
        assert_eq!(report.fired, 1);
        assert_eq!(log, ["outer", "inner"]);
    }

    #[test]
    fn nested_delays_are_relative_to_the_firing_tick() {
        let mut scheduler = Scheduler::new();
        let mut log = Log::new();

        let _ = scheduler.schedule(
            Duration::from_millis(100),
            |log: &mut Log, scheduler: &mut Scheduler<Log>| {
                log.push("parent");
                let _ = scheduler.schedule(Duration::from_millis(50), push("child"));
                Ok(())
            },
        );

        let _ = scheduler.tick(Timestamp::from_millis(120), &mut log);
        assert_eq!(scheduler.next_fire_time(), Some(Timestamp::from_millis(170)));

        let _ = scheduler.tick(Timestamp::from_millis(169), &mut log);
        assert_eq!(log, ["parent"]);
        let _ = scheduler.tick(Timestamp::from_millis(170), &mut log);
        assert_eq!(log, ["parent", "child"]);
    }

    #[test]
    fn cancel_prevents_invocation_and_is_idempotent() {
        let mut scheduler = Scheduler::new();
        let mut log = Log::new();

        let cancelled = scheduler.schedule(Duration::from_millis(10), push("cancelled"));
        let kept = scheduler.schedule(Duration::from_millis(10), push("kept"));

        assert!(scheduler.cancel(cancelled));
        assert!(!scheduler.cancel(cancelled));
        assert!(!scheduler.is_pending(cancelled));
        assert!(scheduler.is_pending(kept));

        let _ = scheduler.tick(Timestamp::from_millis(10), &mut log);
        assert_eq!(log, ["kept"]);
        assert!(!scheduler.cancel(kept), "fired handles cancel as a no-op");
    }

    #[test]
    fn an_action_may_cancel_a_sibling_due_in_the_same_tick() {
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        let mut log = Log::new();

        let victim = ActionHandle(1);
        let _ = scheduler.schedule(Duration::ZERO, move |log: &mut Log, scheduler: &mut Scheduler<Log>| {
            log.push("canceller");
            assert!(scheduler.cancel(victim));
            Ok(())
        });
        let issued = scheduler.schedule(Duration::ZERO, push("victim"));
        assert_eq!(issued, victim);

        let report = scheduler.tick(Timestamp::ZERO, &mut log);
        assert_eq!(report.fired, 1);
        assert_eq!(log, ["canceller"]);
    }

    #[test]
    fn reset_discards_without_invoking() {
        let mut scheduler = Scheduler::new();
        let mut log = Log::new();

        let _ = scheduler.schedule(Duration::from_millis(5), push("a"));
        let _ = scheduler.schedule(Duration::from_millis(50), push("b"));

        assert_eq!(scheduler.reset(), 2);
        let report = scheduler.tick(Timestamp::from_millis(1_000), &mut log);

        assert_eq!(report, TickReport::default());
        assert!(log.is_empty());
    }

    #[test]
    fn failing_action_does_not_abort_the_tick() {
        let mut scheduler = Scheduler::new();
        let mut log = Log::new();

        let _ = scheduler.schedule(Duration::ZERO, |_: &mut Log, _: &mut Scheduler<Log>| {
            Err(anyhow::anyhow!("boom"))
        });
        let _ = scheduler.schedule(Duration::ZERO, push("survivor"));

        let report = scheduler.tick(Timestamp::ZERO, &mut log);
        assert_eq!(report, TickReport { fired: 2, failed: 1 });
        assert_eq!(log, ["survivor"]);
    }

    #[test]
    fn negative_delays_are_rejected() {
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        assert_eq!(
            scheduler.schedule_millis(-1, push("never")),
            Err(SchedulerError::NegativeDelay { delay_ms: -1 })
        );
        assert!(scheduler.is_empty());

        let handle = scheduler
            .schedule_millis(25, push("later"))
            .expect("non-negative delay");
        assert!(scheduler.is_pending(handle));
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut scheduler = Scheduler::starting_at(Timestamp::from_millis(500));
        let mut log = Log::new();

        let _ = scheduler.tick(Timestamp::from_millis(100), &mut log);
        assert_eq!(scheduler.now(), Timestamp::from_millis(500));

        let _ = scheduler.schedule(Duration::from_millis(10), push("x"));
        assert_eq!(scheduler.next_fire_time(), Some(Timestamp::from_millis(510)));
    }
}
