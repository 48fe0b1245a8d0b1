//! Collaborator interfaces consumed by the orchestration engine.
//!
//! Every external SDK the pipeline touches (consent prompt, remote config,
//! attribution server, ad-network deep links, analytics, purchases) is
//! expressed as a trait so the engine stays testable and vendor-free. The
//! engine depends on the contracts below, never on wire formats.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use vantage_core::{ConsentStatus, ResolutionResult, Result, SignalMap, StoreAttribution};

/// URL paths used for attribution-server install and purchase reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionPaths {
    /// Server-side install endpoint path
    pub install_path: String,
    /// Server-side purchase endpoint path
    pub purchase_path: String,
}

impl Default for AttributionPaths {
    fn default() -> Self {
        Self {
            install_path: "/install-application".to_string(),
            purchase_path: "/subscribe".to_string(),
        }
    }
}

/// A completed purchase forwarded to the attribution server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Store product identifier
    pub product_id: String,
    /// Price in the store currency
    pub price: f64,
    /// ISO currency code
    pub currency: String,
    /// Whether an introductory/trial offer applied
    pub is_trial: bool,
}

/// Platform consent prompt.
///
/// `status` is readable synchronously at any time; `request` shows the
/// prompt and calls back at most once. A prompt that never resolves is a
/// real platform failure mode the engine must tolerate.
#[async_trait]
pub trait ConsentProvider: Send + Sync {
    /// Current platform consent status.
    fn status(&self) -> ConsentStatus;

    /// Present the consent prompt and wait for the user's answer.
    async fn request(&self) -> ConsentStatus;
}

/// Remote-configuration fetcher.
#[async_trait]
pub trait RemoteConfigFetcher: Send + Sync {
    /// Bind fetches to an attribution user id.
    fn set_user_id(&self, user_id: &str);

    /// Fetch values for the requested keys.
    ///
    /// Callers proceed with an empty map on failure; a fetch error never
    /// stalls configuration.
    async fn fetch(&self, keys: &[String]) -> Result<SignalMap>;
}

/// Attribution-server client.
#[async_trait]
pub trait AttributionClient: Send + Sync {
    /// Stable user identifier assigned by the attribution server, if known.
    fn unique_user_id(&self) -> Option<String>;

    /// Install attribution payload from the last sync, if any.
    fn install_result(&self) -> Option<StoreAttribution>;

    /// Configure the install/purchase URL paths used for sync.
    fn configure_paths(&self, paths: AttributionPaths);

    /// Sync install attribution with the server.
    async fn sync(&self) -> Result<StoreAttribution>;

    /// Report a purchase to the server. Best effort.
    async fn sync_purchase(&self, record: PurchaseRecord);
}

/// Ad-network / deep-link client.
pub trait DeepLinkClient: Send + Sync {
    /// Start the client bound to an attribution user id.
    fn start(&self, user_id: &str);

    /// Deep-link payload, readable at any time after initialization.
    ///
    /// May be empty when no deep link arrived.
    fn deep_link_result(&self) -> SignalMap;
}

/// Analytics event sink.
pub trait AnalyticsSink: Send + Sync {
    /// Bind events to an attribution user id.
    fn set_user_id(&self, user_id: &str);

    /// Record one event with string parameters.
    fn log_event(&self, name: &str, params: SignalMap);

    /// Set a persistent user property.
    fn set_user_property(&self, key: &str, value: &str);
}

/// In-app purchase subsystem.
#[async_trait]
pub trait PurchaseGateway: Send + Sync {
    /// Initialize with the host's product identifiers.
    fn initialize(&self, product_ids: &[String]);

    /// Bind purchases to an attribution user id.
    fn set_user_id(&self, user_id: &str);

    /// Refresh entitlement/product status.
    async fn update_product_status(&self);
}

/// Host-application observer for configuration results.
pub trait ConfigurationObserver: Send + Sync {
    /// First configuration completed; `result` is an owned snapshot.
    fn configuration_finished(&self, result: ResolutionResult);

    /// A later recomputation produced a new result.
    fn configuration_updated(&self, result: ResolutionResult);
}
