//! Final resolution output handed to the host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::selector::{AuxSignal, PaywallSelection};
use crate::signals::{SignalBundle, SignalMap};
use crate::source::UserSource;

/// The immutable result of one orchestration run.
///
/// Created once per run and handed to the host as an owned snapshot; the
/// active paywall is always a member of the per-channel map or the
/// deep-link override, and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Resolved acquisition channel
    pub user_source: UserSource,
    /// The signal map that drove the decision (deep-link or store payload)
    pub aux_signals: SignalMap,
    /// The paywall to show this user
    pub active_paywall: String,
    /// What every channel would have shown
    pub per_channel_paywalls: BTreeMap<UserSource, String>,
}

impl ResolutionResult {
    /// Assemble a result from a resolved source and a paywall selection.
    pub fn from_selection(
        user_source: UserSource,
        selection: PaywallSelection,
        signals: &SignalBundle,
    ) -> Self {
        let aux_signals = match selection.aux {
            AuxSignal::DeepLink => signals.deep_link.clone(),
            AuxSignal::StoreAttribution => signals.store_attribution.payload.clone(),
        };
        Self {
            user_source,
            aux_signals,
            active_paywall: selection.active_paywall,
            per_channel_paywalls: selection.per_channel,
        }
    }

    /// Synthesize a result directly from overrides, bypassing resolution.
    ///
    /// Every channel reports the same paywall name. This is the test seam
    /// used by the environment-variable bypass, not production logic.
    pub fn synthetic(network: &str, active_paywall: impl Into<String>) -> Self {
        let active_paywall = active_paywall.into();
        let per_channel_paywalls = UserSource::ALL
            .into_iter()
            .map(|channel| (channel, active_paywall.clone()))
            .collect();
        Self {
            user_source: UserSource::parse(network),
            aux_signals: SignalMap::new(),
            active_paywall,
            per_channel_paywalls,
        }
    }
}
