//! Raw attribution signals collected just before resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// String-keyed signal map (deep-link payload or store attribution payload).
pub type SignalMap = BTreeMap<String, String>;

/// Store-level attribution payload from the attribution server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreAttribution {
    /// Whether attribution was inferred from network address correlation
    pub is_ip_based: bool,
    /// Reported source name, if any
    pub source_name: Option<String>,
    /// Free-form attribution payload (campaign name, keyword, region...)
    pub payload: SignalMap,
}

impl StoreAttribution {
    /// Campaign name, checked under both key spellings the server has used.
    pub fn campaign_name(&self) -> Option<&str> {
        self.payload
            .get("campaignName")
            .or_else(|| self.payload.get("campaign_name"))
            .map(String::as_str)
    }
}

/// The three independent signal sources gathered for one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalBundle {
    /// Deep-link / ad-network payload (`network`, `deep_link_value`, ...)
    pub deep_link: SignalMap,
    /// Store-level attribution payload
    pub store_attribution: StoreAttribution,
    /// Fetched remote-configuration values
    pub remote_config: SignalMap,
}

impl SignalBundle {
    /// The `network` value from the deep-link payload, if present and non-empty.
    pub fn network(&self) -> Option<&str> {
        self.deep_link
            .get("network")
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
