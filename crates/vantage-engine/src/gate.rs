//! Named-event completion gate for the startup sequence.
//!
//! The gate observes a declared set of [`ConfigurationEvent`]s and fires
//! registered callbacks when subsets (or the whole set) complete. Marking
//! is idempotent and tolerates concurrent callers; the finish signal fires
//! at most once per gate, either when every declared event completes or
//! when the timeout elapses first. On timeout the gate logs which events
//! were still outstanding, then signals finished anyway — the host is never
//! blocked on a missing event.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use vantage_core::ConfigurationEvent;

type GateCallback = Box<dyn FnOnce() + Send + 'static>;

struct Waiter {
    subset: HashSet<ConfigurationEvent>,
    callback: GateCallback,
}

#[derive(Default)]
struct GateState {
    declared: HashSet<ConfigurationEvent>,
    completed: HashSet<ConfigurationEvent>,
    finished: bool,
    timer_started: bool,
    waiters: Vec<Waiter>,
    finish_callbacks: Vec<GateCallback>,
}

impl GateState {
    fn all_completed(&self) -> bool {
        !self.declared.is_empty() && self.completed.is_superset(&self.declared)
    }

    fn outstanding(&self) -> Vec<String> {
        self.declared
            .difference(&self.completed)
            .map(|event| event.name().to_string())
            .collect()
    }
}

/// Completion tracker shared between the orchestrator and its async flows.
///
/// Cheap to clone; clones share one gate.
#[derive(Clone)]
pub struct ConfigurationGate {
    state: Arc<Mutex<GateState>>,
    timeout: Duration,
}

impl ConfigurationGate {
    /// Create a gate with the given finish timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState::default())),
            timeout,
        }
    }

    /// Declare the set of events this gate waits for.
    pub fn declare_events(&self, events: impl IntoIterator<Item = ConfigurationEvent>) {
        let mut state = self.state.lock();
        state.declared.extend(events);
    }

    /// Whether the finish signal has fired.
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Mark one event completed. Idempotent: re-marking has no effect.
    pub fn mark_completed(&self, event: ConfigurationEvent) {
        let ready = {
            let mut state = self.state.lock();
            if !state.declared.contains(&event) {
                tracing::warn!(event = event.name(), "ignoring undeclared event");
                return;
            }
            if !state.completed.insert(event.clone()) {
                tracing::debug!(event = event.name(), "event already completed");
                return;
            }
            tracing::debug!(event = event.name(), "configuration event completed");
            self.drain_ready(&mut state)
        };
        for callback in ready {
            callback();
        }
    }

    /// Fire `callback` once, when every event in `subset` has completed.
    ///
    /// Fires immediately if the subset is already satisfied.
    pub fn on_all_of(
        &self,
        subset: impl IntoIterator<Item = ConfigurationEvent>,
        callback: impl FnOnce() + Send + 'static,
    ) {
        let subset: HashSet<ConfigurationEvent> = subset.into_iter().collect();
        let fire_now = {
            let mut state = self.state.lock();
            if state.completed.is_superset(&subset) {
                true
            } else {
                state.waiters.push(Waiter {
                    subset,
                    callback: Box::new(callback),
                });
                return;
            }
        };
        if fire_now {
            callback();
        }
    }

    /// Fire `callback` once, when the full declared set completes or the
    /// timeout elapses, whichever comes first.
    pub fn on_finished(&self, callback: impl FnOnce() + Send + 'static) {
        let fire_now = {
            let mut state = self.state.lock();
            if state.finished {
                true
            } else {
                state.finish_callbacks.push(Box::new(callback));
                return;
            }
        };
        if fire_now {
            callback();
        }
    }

    /// Arm the timeout timer. Subsequent calls are no-ops.
    ///
    /// Must be called within a tokio runtime context.
    pub fn start_timeout_timer(&self) {
        {
            let mut state = self.state.lock();
            if state.timer_started || state.finished {
                return;
            }
            state.timer_started = true;
        }
        let gate = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(gate.timeout).await;
            gate.finish_due_to_timeout();
        });
    }

    fn finish_due_to_timeout(&self) {
        let callbacks = {
            let mut state = self.state.lock();
            if state.finished {
                return;
            }
            let outstanding = state.outstanding();
            if !outstanding.is_empty() {
                tracing::warn!(
                    ?outstanding,
                    "configuration timed out with outstanding events, finishing degraded"
                );
            }
            state.finished = true;
            std::mem::take(&mut state.finish_callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    /// Collect waiters whose subsets are now satisfied, and the finish
    /// callbacks if the full declared set just completed. Callbacks are
    /// returned so they run outside the lock.
    fn drain_ready(&self, state: &mut GateState) -> Vec<GateCallback> {
        let mut ready = Vec::new();

        let mut remaining = Vec::with_capacity(state.waiters.len());
        for waiter in state.waiters.drain(..) {
            if state.completed.is_superset(&waiter.subset) {
                ready.push(waiter.callback);
            } else {
                remaining.push(waiter);
            }
        }
        state.waiters = remaining;

        if !state.finished && state.all_completed() {
            state.finished = true;
            tracing::info!("all configuration events completed");
            ready.extend(std::mem::take(&mut state.finish_callbacks));
        }

        ready
    }
}
