//! AB-test variant configuration and paywall naming.
//!
//! Each acquisition channel has one AB-test slot whose remote value names
//! the paywall to show. Values carrying a `none_` prefix mean the test is
//! inactive and the stripped remainder is the fallback paywall name.
//!
//! AB-test keys are a closed set known at compile time; only truly
//! host-defined remote keys go through the dynamic string-keyed path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::signals::SignalMap;
use crate::source::UserSource;

/// Paywall name shown when a test value is missing or empty.
pub const DEFAULT_PAYWALL: &str = "default";

/// Raw value used when the remote config carries no value for a test.
pub const INACTIVE_DEFAULT_VALUE: &str = "none_default";

/// Closed set of per-channel AB-test slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbTest {
    Organic,
    Asa,
    Facebook,
    Google,
    GoogleGdn,
    GoogleDemgen,
    GoogleYoutube,
    GooglePmax,
    Snapchat,
    Tiktok,
    Instagram,
    Bing,
    Moloco,
    Applovin,
}

impl AbTest {
    /// All test slots.
    pub const ALL: [AbTest; 14] = [
        AbTest::Organic,
        AbTest::Asa,
        AbTest::Facebook,
        AbTest::Google,
        AbTest::GoogleGdn,
        AbTest::GoogleDemgen,
        AbTest::GoogleYoutube,
        AbTest::GooglePmax,
        AbTest::Snapchat,
        AbTest::Tiktok,
        AbTest::Instagram,
        AbTest::Bing,
        AbTest::Moloco,
        AbTest::Applovin,
    ];

    /// Remote-config key for this test slot.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Organic => "ab_paywall_organic",
            Self::Asa => "ab_paywall_asa",
            Self::Facebook => "ab_paywall_fb",
            Self::Google => "ab_paywall_google",
            Self::GoogleGdn => "ab_paywall_google_gdn",
            Self::GoogleDemgen => "ab_paywall_google_demgen",
            Self::GoogleYoutube => "ab_paywall_google_youtube",
            Self::GooglePmax => "ab_paywall_google_pmax",
            Self::Snapchat => "ab_paywall_snapchat",
            Self::Tiktok => "ab_paywall_tiktok",
            Self::Instagram => "ab_paywall_instagram",
            Self::Bing => "ab_paywall_bing",
            Self::Moloco => "ab_paywall_moloco",
            Self::Applovin => "ab_paywall_applovin",
        }
    }

    /// The test slot consulted for a resolved source.
    ///
    /// Channels without a dedicated test (ipat, test access, unknown) share
    /// the organic slot.
    pub fn for_source(source: UserSource) -> AbTest {
        match source {
            UserSource::Organic
            | UserSource::Ipat
            | UserSource::TestPremium
            | UserSource::TiktokFullAccess
            | UserSource::Unknown => Self::Organic,
            UserSource::Asa => Self::Asa,
            UserSource::Facebook => Self::Facebook,
            UserSource::Google => Self::Google,
            UserSource::GoogleGdn => Self::GoogleGdn,
            UserSource::GoogleDemgen => Self::GoogleDemgen,
            UserSource::GoogleYoutube => Self::GoogleYoutube,
            UserSource::GooglePmax => Self::GooglePmax,
            UserSource::Snapchat => Self::Snapchat,
            UserSource::Tiktok => Self::Tiktok,
            UserSource::Instagram => Self::Instagram,
            UserSource::Bing => Self::Bing,
            UserSource::Moloco => Self::Moloco,
            UserSource::Applovin => Self::Applovin,
        }
    }
}

/// Strip the `none_` inactive prefix from a raw AB-test value.
///
/// Empty values (before or after stripping) fall back to
/// [`DEFAULT_PAYWALL`] so a paywall name is never empty.
pub fn paywall_name_from_value(value: &str) -> String {
    let stripped = value.strip_prefix("none_").unwrap_or(value);
    if stripped.is_empty() {
        DEFAULT_PAYWALL.to_string()
    } else {
        stripped.to_string()
    }
}

/// Raw AB-test values for every slot, as fetched from remote config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    values: BTreeMap<AbTest, String>,
}

impl VariantConfig {
    /// Build from fetched remote values; missing keys take the inactive default.
    pub fn from_remote(remote: &SignalMap) -> Self {
        let values = AbTest::ALL
            .into_iter()
            .map(|test| {
                let raw = remote
                    .get(test.config_key())
                    .cloned()
                    .unwrap_or_else(|| INACTIVE_DEFAULT_VALUE.to_string());
                (test, raw)
            })
            .collect();
        Self { values }
    }

    /// Raw value for one slot.
    pub fn raw_value(&self, test: AbTest) -> &str {
        self.values
            .get(&test)
            .map(String::as_str)
            .unwrap_or(INACTIVE_DEFAULT_VALUE)
    }

    /// Prefix-stripped paywall name for one slot.
    pub fn paywall_name(&self, test: AbTest) -> String {
        paywall_name_from_value(self.raw_value(test))
    }

    /// Override one slot's raw value (test seam).
    pub fn set_raw_value(&mut self, test: AbTest, value: impl Into<String>) {
        self.values.insert(test, value.into());
    }
}
