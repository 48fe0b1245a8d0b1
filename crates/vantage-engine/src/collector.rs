//! Signal collection for the resolution step.
//!
//! Gathers the three independent signal sources into one [`SignalBundle`]
//! immediately before resolution: the deep-link payload (readable at any
//! time), the store-attribution payload from the last sync, and the cached
//! remote-configuration values. Missing sources degrade to empty maps.

use std::sync::Arc;

use parking_lot::Mutex;

use vantage_core::{SignalBundle, SignalMap};

use crate::collaborators::{AttributionClient, DeepLinkClient};

/// Gathers raw signals from collaborators and the remote-config cache.
pub struct SignalCollector {
    deep_link: Arc<dyn DeepLinkClient>,
    attribution: Arc<dyn AttributionClient>,
    /// Remote values cached by the fetch flow; empty until loaded.
    remote_config: Arc<Mutex<SignalMap>>,
}

impl SignalCollector {
    /// Create a collector over the signal-bearing collaborators.
    pub fn new(
        deep_link: Arc<dyn DeepLinkClient>,
        attribution: Arc<dyn AttributionClient>,
        remote_config: Arc<Mutex<SignalMap>>,
    ) -> Self {
        Self {
            deep_link,
            attribution,
            remote_config,
        }
    }

    /// Snapshot all three sources.
    pub fn collect(&self) -> SignalBundle {
        SignalBundle {
            deep_link: self.deep_link.deep_link_result(),
            store_attribution: self.attribution.install_result().unwrap_or_default(),
            remote_config: self.remote_config.lock().clone(),
        }
    }
}
