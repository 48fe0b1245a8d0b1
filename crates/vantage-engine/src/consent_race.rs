//! First-wins race between the consent prompt and a fixed timeout.
//!
//! The platform prompt can fail to appear even when the status reads
//! not-determined, which would otherwise stall configuration forever. The
//! race guarantees liveness: whichever of prompt and timer resolves first
//! flips a process-wide `answered` latch with a compare-exchange and
//! publishes through a single-assignment slot. The loser still runs to
//! completion; its result is discarded, not cancelled.
//!
//! A timer win reports `denied` to analytics, then re-reads the actual
//! platform status for downstream gating. The two signals can disagree and
//! both are surfaced on [`ConsentOutcome`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use vantage_core::{ConsentOutcome, ConsentStatus, SignalMap};

use crate::collaborators::{AnalyticsSink, ConsentProvider};

/// Analytics event recorded once per resolved race.
pub const CONSENT_EVENT: &str = "consent_answered";

/// Resolves a single authoritative consent decision.
pub struct ConsentRace {
    provider: Arc<dyn ConsentProvider>,
    analytics: Arc<dyn AnalyticsSink>,
    /// Process-wide latch: true once any path has produced the answer.
    answered: Arc<AtomicBool>,
    timeout: Duration,
}

impl ConsentRace {
    /// Create a race over the given provider.
    ///
    /// `answered` is owned by the orchestrator and shared here so the latch
    /// survives repeated app activations.
    pub fn new(
        provider: Arc<dyn ConsentProvider>,
        analytics: Arc<dyn AnalyticsSink>,
        answered: Arc<AtomicBool>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            analytics,
            answered,
            timeout,
        }
    }

    /// Run the race to resolution.
    ///
    /// Returns `None` when a previous run already produced the answer; the
    /// race resolves at most once per process.
    pub async fn run(&self) -> Option<ConsentOutcome> {
        let status = self.provider.status();
        if status.is_determined() {
            if !self.claim() {
                return None;
            }
            let outcome = ConsentOutcome::answered(status);
            self.emit(outcome.reported);
            return Some(outcome);
        }

        if self.answered.load(Ordering::SeqCst) {
            return None;
        }

        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(Mutex::new(Some(tx)));

        // Prompt side: waits for the user, however long that takes.
        {
            let race = self.clone_parts();
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                let status = race.provider.request().await;
                if race.claim() {
                    let outcome = ConsentOutcome::answered(status);
                    race.emit(outcome.reported);
                    Self::publish(&slot, outcome);
                }
            });
        }

        // Timer side: reports denied, then re-reads the platform status.
        {
            let race = self.clone_parts();
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                tokio::time::sleep(race.timeout).await;
                if race.claim() {
                    race.emit(false);
                    let effective = race.provider.status();
                    tracing::warn!(
                        ?effective,
                        "consent prompt timed out, reporting denied"
                    );
                    Self::publish(&slot, ConsentOutcome::timed_out(effective));
                }
            });
        }

        // Only the producer tasks may hold the slot now; if neither claims
        // the latch (a concurrent run won it first), the sender drops and
        // the channel closes instead of hanging.
        drop(slot);
        rx.await.ok()
    }

    /// Atomically claim the single answer slot.
    fn claim(&self) -> bool {
        self.answered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Record the one analytics event for this race.
    fn emit(&self, granted: bool) {
        let mut params = SignalMap::new();
        params.insert("granted".to_string(), granted.to_string());
        self.analytics.log_event(CONSENT_EVENT, params);
    }

    fn publish(slot: &Mutex<Option<oneshot::Sender<ConsentOutcome>>>, outcome: ConsentOutcome) {
        if let Some(tx) = slot.lock().take() {
            let _ = tx.send(outcome);
        }
    }

    fn clone_parts(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            analytics: Arc::clone(&self.analytics),
            answered: Arc::clone(&self.answered),
            timeout: self.timeout,
        }
    }
}
