//! Recurring timers with cancel-on-drop handles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};

/// Callback invoked on every timer expiry.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// Schedules recurring callbacks.
pub trait Dispatcher: Send + Sync {
    /// Fire `callback` every `period`, starting one period from now.
    ///
    /// The schedule lives as long as the returned handle.
    fn schedule_recurring(&self, period: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Owned registration of a recurring timer.
///
/// Dropping the handle cancels the schedule.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl TimerHandle {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Dispatcher backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioDispatcher {
    handle: Handle,
}

impl TokioDispatcher {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime of the calling context.
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Dispatcher for TokioDispatcher {
    fn schedule_recurring(&self, period: Duration, callback: TimerCallback) -> TimerHandle {
        let task = self.handle.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        });

        TimerHandle::new(move || task.abort())
    }
}

/// Dispatcher whose timers only fire when told to.
///
/// Every live schedule fires once per call to [`ManualDispatcher::fire`],
/// regardless of its period.
#[derive(Clone, Default)]
pub struct ManualDispatcher {
    inner: Arc<ManualTimers>,
}

#[derive(Default)]
struct ManualTimers {
    next_id: AtomicU64,
    callbacks: Mutex<HashMap<u64, TimerCallback>>,
}

impl ManualDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire every live timer once.
    pub fn fire(&self) {
        // Snapshot so callbacks may schedule or cancel without deadlocking.
        let callbacks: Vec<TimerCallback> = self
            .inner
            .callbacks
            .lock()
            .expect("timer registry mutex poisoned")
            .values()
            .cloned()
            .collect();

        for callback in callbacks {
            callback();
        }
    }

    /// Number of live schedules.
    pub fn active_timers(&self) -> usize {
        self.inner
            .callbacks
            .lock()
            .expect("timer registry mutex poisoned")
            .len()
    }
}

impl Dispatcher for ManualDispatcher {
    fn schedule_recurring(&self, _period: Duration, callback: TimerCallback) -> TimerHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .callbacks
            .lock()
            .expect("timer registry mutex poisoned")
            .insert(id, callback);

        let timers = Arc::downgrade(&self.inner);
        TimerHandle::new(move || {
            if let Some(timers) = timers.upgrade() {
                timers
                    .callbacks
                    .lock()
                    .expect("timer registry mutex poisoned")
                    .remove(&id);
            }
        })
    }
}

impl std::fmt::Debug for ManualDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualDispatcher")
            .field("active_timers", &self.active_timers())
            .finish()
    }
}
