//! Tracking-consent status and race outcome.
//!
//! The consent race can resolve two ways that disagree: when the timeout
//! wins, analytics records a denial while the platform may still report a
//! later grant. [`ConsentOutcome`] keeps both signals separate instead of
//! silently unifying them — `reported` is what analytics saw, `effective`
//! is the platform status re-read after resolution and used for gating.

use serde::{Deserialize, Serialize};

/// Platform-level tracking consent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    /// The user has not been asked, or has not answered yet
    #[default]
    NotDetermined,
    /// The user granted tracking consent
    Granted,
    /// The user denied tracking consent
    Denied,
}

impl ConsentStatus {
    /// Whether an authoritative answer exists (granted or denied).
    pub fn is_determined(&self) -> bool {
        !matches!(self, Self::NotDetermined)
    }

    /// Whether tracking is authorized.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// The resolved outcome of a single consent race.
///
/// `reported` and `effective` can disagree when the timer wins the race;
/// this fork is deliberate and both signals are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentOutcome {
    /// The boolean answer recorded by analytics (`false` on timer win)
    pub reported: bool,
    /// Platform status re-read after resolution, used for downstream gating
    pub effective: ConsentStatus,
    /// Whether the timeout, not the prompt, resolved the race
    pub timed_out: bool,
}

impl ConsentOutcome {
    /// Outcome for a prompt (or pre-determined status) that answered first.
    pub fn answered(status: ConsentStatus) -> Self {
        Self {
            reported: status.is_granted(),
            effective: status,
            timed_out: false,
        }
    }

    /// Outcome for a timer win: reported denied, effective status as re-read.
    pub fn timed_out(effective: ConsentStatus) -> Self {
        Self {
            reported: false,
            effective,
            timed_out: true,
        }
    }
}
