//! Attribution source resolution.
//!
//! Turns a [`SignalBundle`] into one canonical [`UserSource`] by applying a
//! fixed precedence policy, first match wins:
//!
//! 1. IP-based store attribution — the most reliable signal, beats everything.
//! 2. An explicit deep-link network redirect, classified through an ordered
//!    string-matching table. Any present network value counts as a redirect,
//!    even when it classifies as unknown.
//! 3. Ambient store search-ads attribution (campaign name present).
//! 4. Organic.
//!
//! Resolution is a pure function of the bundle (plus the configured fallback
//! for `restricted` traffic): identical input always yields the same source.

use crate::signals::SignalBundle;
use crate::source::UserSource;

/// Ordered substring-fragment table for network classification.
///
/// Order matters: earlier fragments win, and the exact-match rules in
/// [`classify_network`] are interleaved at fixed positions relative to this
/// table, matching historical production behavior.
const NETWORK_FRAGMENTS: [(&str, UserSource); 13] = [
    ("web2app_fb", UserSource::Facebook),
    ("metaweb_int", UserSource::Facebook),
    ("facebook_int", UserSource::Facebook),
    ("google_storeredirect", UserSource::Google),
    ("google_gdn", UserSource::GoogleGdn),
    ("google_demgen", UserSource::GoogleDemgen),
    ("google_youtube", UserSource::GoogleYoutube),
    ("google_pmax", UserSource::GooglePmax),
    ("instagram", UserSource::Instagram),
    ("snapchat", UserSource::Snapchat),
    ("bing", UserSource::Bing),
    ("moloco_int", UserSource::Moloco),
    ("applovin_int", UserSource::Applovin),
];

/// Resolves acquisition sources from collected signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceResolver {
    /// Channel substituted for the `restricted` network value, if configured.
    pub restricted_fallback: Option<UserSource>,
}

impl SourceResolver {
    /// Create a resolver with no `restricted` fallback configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver that maps `restricted` traffic to a fixed channel.
    pub fn with_restricted_fallback(fallback: UserSource) -> Self {
        Self {
            restricted_fallback: Some(fallback),
        }
    }

    /// Resolve one canonical source from the collected signals.
    pub fn resolve(&self, signals: &SignalBundle) -> UserSource {
        if signals.store_attribution.is_ip_based {
            return UserSource::Ipat;
        }
        if let Some(network) = signals.network() {
            return self.classify_network(network, signals);
        }
        if signals.store_attribution.campaign_name().is_some() {
            return UserSource::Asa;
        }
        UserSource::Organic
    }

    /// Classify a non-empty deep-link network value.
    fn classify_network(&self, network: &str, signals: &SignalBundle) -> UserSource {
        let lowered = network.to_lowercase();

        for (fragment, source) in NETWORK_FRAGMENTS {
            if lowered.contains(fragment) {
                return source;
            }
        }

        // Exact rules, checked before the broad `tiktok` fragment so the
        // full-access value is not swallowed by the substring match.
        if network == "Full_Access" {
            return UserSource::TestPremium;
        }
        if lowered == "tiktok_full_access" {
            let flag_enabled = signals
                .remote_config
                .get("tiktok_full_access")
                .map(|v| v == "true")
                .unwrap_or(false);
            return if flag_enabled {
                UserSource::TiktokFullAccess
            } else {
                UserSource::Organic
            };
        }
        if network.contains("tiktok") {
            return UserSource::Tiktok;
        }
        if network == "restricted" {
            if let Some(fallback) = self.restricted_fallback {
                return fallback;
            }
            return UserSource::Unknown;
        }
        if lowered == "asa_test" {
            return UserSource::Asa;
        }

        UserSource::Unknown
    }
}
