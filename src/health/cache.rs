//! Time-windowed cache of the last health verdict.
//!
//! # Responsibilities
//! - Store the verdict of the last probe response
//! - Mark it reusable until the next timer expiry
//! - Expire it on every tick of a recurring timer
//!
//! # Design Decisions
//! - Starts expired so the first probe always computes a verdict
//! - Storing a verdict re-arms freshness until the next expiry
//! - The timer handle is owned; dropping the manager cancels it
//! - Not shared across workers: each owner caches independently

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;

use crate::event::{Dispatcher, TimerHandle};
use crate::observability::metrics;

/// A computed health outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub status: StatusCode,
    pub degraded: bool,
}

impl Verdict {
    pub const HEALTHY: Verdict = Verdict {
        status: StatusCode::OK,
        degraded: false,
    };

    pub const UNHEALTHY: Verdict = Verdict {
        status: StatusCode::SERVICE_UNAVAILABLE,
        degraded: false,
    };
}

#[derive(Debug, Default)]
struct CacheState {
    fresh: AtomicBool,
    verdict: Mutex<Option<Verdict>>,
}

/// Caches the health verdict for a fixed validity window.
#[derive(Debug)]
pub struct CacheManager {
    state: Arc<CacheState>,
    timeout: Duration,
    _timer: TimerHandle,
}

impl CacheManager {
    /// Create a cache whose verdicts expire every `timeout`.
    pub fn new(dispatcher: &dyn Dispatcher, timeout: Duration) -> Self {
        let state = Arc::new(CacheState::default());

        let timer_state = Arc::downgrade(&state);
        let timer = dispatcher.schedule_recurring(
            timeout,
            Arc::new(move || {
                if let Some(state) = timer_state.upgrade() {
                    if state.fresh.swap(false, Ordering::Relaxed) {
                        metrics::record_cache_event("expire");
                    }
                }
            }),
        );

        Self {
            state,
            timeout,
            _timer: timer,
        }
    }

    /// True while the stored verdict may be reused.
    pub fn is_fresh(&self) -> bool {
        self.state.fresh.load(Ordering::Relaxed)
    }

    /// Fresh and holding a verdict.
    pub fn use_cached_response(&self) -> bool {
        self.is_fresh() && self.lock().is_some()
    }

    /// Last stored verdict, regardless of freshness.
    ///
    /// Healthy until a verdict has been stored.
    pub fn cached_verdict(&self) -> Verdict {
        self.lock().as_ref().copied().unwrap_or(Verdict::HEALTHY)
    }

    /// Store a verdict and mark it usable until the next expiry.
    pub fn set_cached_verdict(&self, status: StatusCode, degraded: bool) {
        *self.lock() = Some(Verdict { status, degraded });
        self.state.fresh.store(true, Ordering::Relaxed);
        metrics::record_cache_event("store");
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Verdict>> {
        self.state.verdict.lock().expect("health cache mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ManualDispatcher;

    #[test]
    fn test_starts_expired() {
        let dispatcher = ManualDispatcher::new();
        let cache = CacheManager::new(&dispatcher, Duration::from_secs(5));

        assert!(!cache.is_fresh());
        assert!(!cache.use_cached_response());
        assert_eq!(cache.cached_verdict(), Verdict::HEALTHY);
        assert_eq!(cache.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_store_then_expire() {
        let dispatcher = ManualDispatcher::new();
        let cache = CacheManager::new(&dispatcher, Duration::from_secs(5));

        cache.set_cached_verdict(StatusCode::SERVICE_UNAVAILABLE, false);
        assert!(cache.use_cached_response());
        assert_eq!(cache.cached_verdict(), Verdict::UNHEALTHY);

        dispatcher.fire();
        assert!(!cache.use_cached_response());
        // Expiry does not erase the verdict itself.
        assert_eq!(cache.cached_verdict().status, StatusCode::SERVICE_UNAVAILABLE);

        cache.set_cached_verdict(StatusCode::OK, true);
        assert!(cache.is_fresh());
        assert_eq!(cache.cached_verdict(), Verdict { status: StatusCode::OK, degraded: true });
    }

    #[test]
    fn test_drop_cancels_timer() {
        let dispatcher = ManualDispatcher::new();
        let cache = CacheManager::new(&dispatcher, Duration::from_millis(10));
        assert_eq!(dispatcher.active_timers(), 1);

        drop(cache);
        assert_eq!(dispatcher.active_timers(), 0);
        dispatcher.fire();
    }
}
