//! Paywall variant selection.
//!
//! Maps a resolved [`UserSource`] plus the fetched AB-test values to one
//! active paywall name, and computes the paywall every channel *would* have
//! shown so downstream analytics can tag experimentation audits.
//!
//! A deep link can override channel-based selection entirely: when
//! `deep_link_value` names a key present in the remote-config map, the
//! active paywall is taken through that indirection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::signals::SignalBundle;
use crate::source::UserSource;
use crate::variants::{paywall_name_from_value, AbTest, VariantConfig};

/// Which auxiliary signal map drove the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxSignal {
    /// The deep-link / ad-network payload
    DeepLink,
    /// The store-attribution payload
    StoreAttribution,
}

/// Output of one variant selection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaywallSelection {
    /// The paywall to show this user
    pub active_paywall: String,
    /// What every channel would have shown, for analytics tagging
    pub per_channel: BTreeMap<UserSource, String>,
    /// Which signal map to surface alongside the result
    pub aux: AuxSignal,
}

/// Selects the active paywall for a resolved source.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantSelector;

impl VariantSelector {
    /// Run selection for `source` against the fetched variant values.
    pub fn select(
        &self,
        source: UserSource,
        variants: &VariantConfig,
        signals: &SignalBundle,
    ) -> PaywallSelection {
        let per_channel: BTreeMap<UserSource, String> = UserSource::ALL
            .into_iter()
            .map(|channel| (channel, variants.paywall_name(AbTest::for_source(channel))))
            .collect();

        if let Some(override_name) = Self::deep_link_override(signals) {
            return PaywallSelection {
                active_paywall: override_name,
                per_channel,
                aux: AuxSignal::DeepLink,
            };
        }

        let aux = match source {
            UserSource::Asa => AuxSignal::StoreAttribution,
            _ => AuxSignal::DeepLink,
        };
        let active_paywall = variants.paywall_name(AbTest::for_source(source));

        PaywallSelection {
            active_paywall,
            per_channel,
            aux,
        }
    }

    /// Deep-link override: `deep_link_value` must be non-empty, not the
    /// literal `none`, and itself a key in the remote-config map.
    fn deep_link_override(signals: &SignalBundle) -> Option<String> {
        let value = signals.deep_link.get("deep_link_value")?;
        if value.is_empty() || value == "none" {
            return None;
        }
        let indirect = signals.remote_config.get(value)?;
        Some(paywall_name_from_value(indirect))
    }
}
