//! Timer scheduling and wall-clock access
//!
//! Every repeating loop of the dashboard goes through the [`Scheduler`]
//! trait. Production uses [`TokioScheduler`]; tests drive the same loops with
//! a [`VirtualClock`], which is both a scheduler and a wall clock and only
//! moves when told to.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use futures::future::{BoxFuture, FutureExt};
use tokio::time::{Instant, MissedTickBehavior};

/// Shortest period a repeating task may use
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A unit of scheduled work. Each invocation produces one run.
pub type Task = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async closure into a [`Task`]
pub fn task<F, Fut>(f: F) -> Task
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Schedules deferred and repeating work
pub trait Scheduler: Send + Sync {
    /// Runs `task` once after `delay`
    fn run_after(&self, delay: Duration, task: Task);

    /// Runs `task` every `interval`, the first run one interval from now.
    ///
    /// Runs are triggered on a fixed period and never wait for the previous
    /// run to finish.
    fn run_every(&self, interval: Duration, task: Task);
}

/// Source of the current local wall time
pub trait WallClock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The host's local clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Scheduler backed by tokio timers.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn run_after(&self, delay: Duration, task: Task) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task().await;
        });
    }

    fn run_every(&self, interval: Duration, task: Task) {
        let period = interval.max(MIN_PERIOD);
        let start = Instant::now() + period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                // Each run gets its own task so a slow run never holds up the next tick
                tokio::spawn(task());
            }
        });
    }
}

struct Timer {
    due: Duration,
    seq: u64,
    period: Option<Duration>,
    task: Task,
}

struct VirtualState {
    start: NaiveDateTime,
    elapsed: Duration,
    next_seq: u64,
    timers: Vec<Timer>,
}

/// Deterministic scheduler and wall clock for tests.
///
/// Time stands still until [`VirtualClock::advance`] is awaited, which fires
/// every timer falling due inside the advanced span in order, running each
/// task to completion before the next.
#[derive(Clone)]
pub struct VirtualClock {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualClock {
    /// Creates a virtual clock reading `start` on the wall
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            state: Arc::new(Mutex::new(VirtualState {
                start,
                elapsed: Duration::ZERO,
                next_seq: 0,
                timers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Time advanced since creation
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// Number of timers waiting to fire
    pub fn pending(&self) -> usize {
        self.lock().timers.len()
    }

    fn schedule(&self, delay: Duration, period: Option<Duration>, task: Task) {
        let mut state = self.lock();
        let due = state.elapsed + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(Timer {
            due,
            seq,
            period,
            task,
        });
    }

    /// Pops the earliest timer due at or before `target`, rescheduling it
    /// when it repeats
    fn next_due(&self, target: Duration) -> Option<Task> {
        let mut state = self.lock();
        let index = state
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        let timer = state.timers.swap_remove(index);
        state.elapsed = timer.due;
        if let Some(period) = timer.period {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.timers.push(Timer {
                due: timer.due + period,
                seq,
                period: Some(period),
                task: timer.task.clone(),
            });
        }
        Some(timer.task)
    }

    /// Moves time forward by `by`, running every task that falls due
    pub async fn advance(&self, by: Duration) {
        let target = self.elapsed() + by;
        while let Some(task) = self.next_due(target) {
            task().await;
        }
        self.lock().elapsed = target;
    }
}

impl Scheduler for VirtualClock {
    fn run_after(&self, delay: Duration, task: Task) {
        self.schedule(delay, None, task);
    }

    fn run_every(&self, interval: Duration, task: Task) {
        let period = interval.max(MIN_PERIOD);
        self.schedule(period, Some(period), task);
    }
}

impl WallClock for VirtualClock {
    fn now(&self) -> NaiveDateTime {
        let state = self.lock();
        let elapsed = chrono::Duration::from_std(state.elapsed)
            .unwrap_or_else(|_| chrono::Duration::zero());
        state.start + elapsed
    }
}
