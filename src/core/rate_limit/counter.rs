use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::CallerKey;

/// Count and start of a caller's window as observed by a single `record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub count: u32,
    pub window_start: Instant,
}

#[derive(Debug)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

impl WindowState {
    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }
}

/// Table of per-caller windows.
///
/// Each caller's window sits behind its own mutex; the map lock is only held
/// long enough to clone the slot, so callers never contend with each other.
pub struct RequestCounter {
    window: Duration,
    windows: DashMap<CallerKey, Arc<Mutex<WindowState>>>,
}

impl RequestCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            windows: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request for `caller` and return the updated window.
    ///
    /// Starts a fresh window with count 1 when the caller has none or the
    /// previous one has run its full length.
    pub fn record(&self, caller: &CallerKey) -> WindowSnapshot {
        self.record_at(caller, Instant::now())
    }

    pub(crate) fn record_at(&self, caller: &CallerKey, now: Instant) -> WindowSnapshot {
        let slot = self.slot(caller, now);
        let mut state = slot.lock();

        if state.expired(now, self.window) {
            state.window_start = now;
            state.count = 0;
        }
        state.count = state.count.saturating_add(1);

        WindowSnapshot {
            count: state.count,
            window_start: state.window_start,
        }
    }

    /// Give back one request recorded in the window starting at `window_start`.
    ///
    /// Ignored when that window has already been replaced.
    pub fn release(&self, caller: &CallerKey, window_start: Instant) {
        let Some(slot) = self.windows.get(caller).map(|entry| Arc::clone(entry.value())) else {
            return;
        };
        let mut state = slot.lock();
        if state.window_start == window_start && state.count > 0 {
            state.count -= 1;
        }
    }

    /// Current window for `caller`, if one is tracked and still running.
    pub fn current(&self, caller: &CallerKey) -> Option<WindowSnapshot> {
        let now = Instant::now();
        let slot = self.windows.get(caller).map(|entry| Arc::clone(entry.value()))?;
        let state = slot.lock();
        (!state.expired(now, self.window)).then(|| WindowSnapshot {
            count: state.count,
            window_start: state.window_start,
        })
    }

    /// Drop windows that have run their full length. Returns how many were removed.
    ///
    /// A slot another request is holding right now is skipped; the next sweep
    /// picks it up.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    pub(crate) fn evict_idle_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Some(state) => !state.expired(now, self.window),
                None => true,
            }
        });
        before.saturating_sub(self.windows.len())
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn slot(&self, caller: &CallerKey, now: Instant) -> Arc<Mutex<WindowState>> {
        if let Some(entry) = self.windows.get(caller) {
            return Arc::clone(entry.value());
        }
        let entry = self.windows.entry(caller.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(WindowState {
                count: 0,
                window_start: now,
            }))
        });
        Arc::clone(entry.value())
    }
}
