//! Startup orchestration state machine.
//!
//! Sequences the whole pipeline:
//!
//! ```text
//! configure() ── declare events, init purchases, wire gate callbacks
//!      │
//! on_app_active() ── propagate user id, start remote fetch + consent race
//!      │
//! consent resolved ── mark event, arm gate timeout
//!      │
//! consent + remote config done ── configure attribution paths, sync server
//!      │
//! gate finished ── collect signals, resolve source, select paywall,
//!                  apply remote config, notify host (once)
//!      │
//! recompute() ── after first completion only: recompute and notify updates
//! ```
//!
//! States: `Unconfigured → Configuring → AttAndConfigReady →
//! ConfigurationFinished → Updated*` (only `Updated` is re-enterable).
//!
//! Degraded signals (fetch failure, consent timeout, sync failure) never
//! surface to the host; every run ends in a completed [`ResolutionResult`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use vantage_core::{
    apply_remote_config, AbTest, ConfigurationEvent, ConsentOutcome, RemoteConfigEntry,
    ResolutionResult, SignalBundle, SignalMap, SourceResolver, UserSource, VariantConfig,
    VariantSelector,
};

use crate::collaborators::{
    AnalyticsSink, AttributionClient, AttributionPaths, ConfigurationObserver, ConsentProvider,
    DeepLinkClient, PurchaseGateway, PurchaseRecord, RemoteConfigFetcher,
};
use crate::collector::SignalCollector;
use crate::consent_race::ConsentRace;
use crate::gate::ConfigurationGate;

/// Environment flag that bypasses the pipeline entirely (test seam).
pub const SKIP_CONFIG_ENV: &str = "VANTAGE_SKIP_CONFIG";
/// Network override used by the bypass.
pub const NETWORK_ENV: &str = "VANTAGE_NETWORK";
/// Active-paywall override used by the bypass.
pub const ACTIVE_PAYWALL_ENV: &str = "VANTAGE_ACTIVE_PAYWALL";
/// Prefix for per-entry remote-config value overrides.
pub const CONFIG_OVERRIDE_ENV_PREFIX: &str = "VANTAGE_CONFIG_";

/// Remote key carrying an install-path override for the attribution server.
const INSTALL_PATH_KEY: &str = "install_server_path";
/// Remote key carrying a purchase-path override for the attribution server.
const PURCHASE_PATH_KEY: &str = "purchase_server_path";

/// Analytics event emitted once, on first configuration.
const TEST_DISTRIBUTION_EVENT: &str = "test_distribution";

/// Orchestrator tuning and host-declared configuration.
#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Consent race timeout (prompt vs. timer)
    pub consent_timeout: Duration,
    /// Gate timeout before a degraded finish
    pub configuration_timeout: Duration,
    /// Default attribution-server URL paths
    pub attribution_paths: AttributionPaths,
    /// Channel substituted for `restricted` deep-link traffic
    pub restricted_fallback: Option<UserSource>,
    /// Host-declared remotely-overridable entries
    pub remote_entries: Vec<RemoteConfigEntry>,
    /// Host-declared events gating configuration beyond the internal set
    pub extra_events: Vec<ConfigurationEvent>,
    /// Store product identifiers for the purchase subsystem
    pub product_ids: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            consent_timeout: Duration::from_secs(5),
            configuration_timeout: Duration::from_secs(10),
            attribution_paths: AttributionPaths::default(),
            restricted_fallback: None,
            remote_entries: Vec::new(),
            extra_events: Vec::new(),
            product_ids: Vec::new(),
        }
    }
}

/// The collaborator set the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub consent: Arc<dyn ConsentProvider>,
    pub remote_config: Arc<dyn RemoteConfigFetcher>,
    pub attribution: Arc<dyn AttributionClient>,
    pub deep_link: Arc<dyn DeepLinkClient>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub purchases: Arc<dyn PurchaseGateway>,
    pub observer: Arc<dyn ConfigurationObserver>,
}

/// Orchestration lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    /// `configure()` not called yet
    Unconfigured,
    /// Configured; waiting on events
    Configuring,
    /// Consent and remote config done; attribution sync in flight
    AttAndConfigReady,
    /// First result delivered to the host
    ConfigurationFinished,
    /// A recomputation delivered an updated result
    Updated,
}

/// Sequences consent, remote configuration and attribution into one
/// [`ResolutionResult`] per run.
pub struct Orchestrator {
    config: OrchestratorConfig,
    parts: Collaborators,
    gate: ConfigurationGate,
    collector: SignalCollector,
    /// Process-wide consent latch shared with the race
    consent_answered: Arc<AtomicBool>,
    /// `configure()` idempotence latch
    configured: AtomicBool,
    /// Remote fetch runs at most once per process
    fetch_started: AtomicBool,
    /// Set when the environment bypass produced the result
    bypassed: AtomicBool,
    state: Mutex<OrchestratorState>,
    remote_values: Arc<Mutex<SignalMap>>,
    remote_entries: Mutex<Vec<RemoteConfigEntry>>,
    consent_outcome: Mutex<Option<ConsentOutcome>>,
    latest: Mutex<Option<ResolutionResult>>,
}

impl Orchestrator {
    /// Create an orchestrator over its collaborators. Nothing runs until
    /// [`configure`](Self::configure) is called.
    pub fn new(config: OrchestratorConfig, parts: Collaborators) -> Arc<Self> {
        let remote_values = Arc::new(Mutex::new(SignalMap::new()));
        let collector = SignalCollector::new(
            Arc::clone(&parts.deep_link),
            Arc::clone(&parts.attribution),
            Arc::clone(&remote_values),
        );
        let remote_entries = Mutex::new(config.remote_entries.clone());
        Arc::new(Self {
            gate: ConfigurationGate::new(config.configuration_timeout),
            collector,
            consent_answered: Arc::new(AtomicBool::new(false)),
            configured: AtomicBool::new(false),
            fetch_started: AtomicBool::new(false),
            bypassed: AtomicBool::new(false),
            state: Mutex::new(OrchestratorState::Unconfigured),
            remote_values,
            remote_entries,
            consent_outcome: Mutex::new(None),
            latest: Mutex::new(None),
            config,
            parts,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OrchestratorState {
        *self.state.lock()
    }

    /// The most recent result, if any run has completed.
    pub fn latest_result(&self) -> Option<ResolutionResult> {
        self.latest.lock().clone()
    }

    /// The resolved consent outcome, once the race has run.
    pub fn consent_outcome(&self) -> Option<ConsentOutcome> {
        *self.consent_outcome.lock()
    }

    /// Host-declared entries with any remote overrides applied.
    pub fn remote_entries(&self) -> Vec<RemoteConfigEntry> {
        self.remote_entries.lock().clone()
    }

    /// Configure the pipeline. At most once per process; repeat calls are
    /// no-ops.
    pub fn configure(self: &Arc<Self>) {
        if self.configured.swap(true, Ordering::SeqCst) {
            tracing::debug!("configure called again; ignoring");
            return;
        }

        if std::env::var(SKIP_CONFIG_ENV).is_ok() {
            self.configure_from_environment();
            return;
        }

        *self.state.lock() = OrchestratorState::Configuring;

        let mut events = ConfigurationEvent::internal_set();
        events.extend(self.config.extra_events.iter().cloned());
        self.gate.declare_events(events);

        self.parts.purchases.initialize(&self.config.product_ids);

        let this = Arc::clone(self);
        self.gate.on_all_of(
            [
                ConfigurationEvent::ConsentAnswered,
                ConfigurationEvent::RemoteConfigLoaded,
            ],
            move || this.start_attribution_stage(),
        );

        let this = Arc::clone(self);
        self.gate.on_finished(move || this.finish_configuration());

        tracing::info!("orchestrator configured, waiting for app activation");
    }

    /// Application became active: propagate identity, start the remote
    /// fetch and run the consent race.
    ///
    /// Must be called within a tokio runtime context. Safe to call on every
    /// activation; the consent race and fetch run at most once.
    pub fn on_app_active(self: &Arc<Self>) {
        if !self.configured.load(Ordering::SeqCst) {
            debug_assert!(false, "configure() must be called before on_app_active()");
            tracing::error!("on_app_active before configure; skipping");
            return;
        }
        if self.bypassed.load(Ordering::SeqCst) {
            return;
        }

        if let Some(user_id) = self
            .parts
            .attribution
            .unique_user_id()
            .filter(|id| !id.is_empty())
        {
            self.parts.deep_link.start(&user_id);
            self.parts.purchases.set_user_id(&user_id);
            self.parts.analytics.set_user_id(&user_id);
            self.parts.remote_config.set_user_id(&user_id);
            self.start_remote_fetch();
        } else {
            tracing::warn!("no attribution user id yet; remote fetch deferred");
        }

        self.start_consent_race();

        let purchases = Arc::clone(&self.parts.purchases);
        tokio::spawn(async move {
            purchases.update_product_status().await;
        });
    }

    /// Recompute the result after a later signal change and notify the
    /// host. Remote configuration is re-read from the backend first, so a
    /// refresh is visible in the updated result.
    ///
    /// A no-op before the first configuration has finished. Must be called
    /// within a tokio runtime context.
    pub fn recompute(self: &Arc<Self>) {
        if !self.gate.is_finished() || self.bypassed.load(Ordering::SeqCst) {
            tracing::debug!("recompute before first completion; ignoring");
            return;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.refresh_remote_values().await;
            let result = this.compute_result(false);
            *this.state.lock() = OrchestratorState::Updated;
            this.parts.observer.configuration_updated(result);
        });
    }

    /// Forward a completed purchase to the attribution server.
    pub async fn report_purchase(&self, record: PurchaseRecord) {
        self.parts.attribution.sync_purchase(record).await;
    }

    // =========================================================================
    // Internal stages
    // =========================================================================

    fn start_consent_race(self: &Arc<Self>) {
        let race = ConsentRace::new(
            Arc::clone(&self.parts.consent),
            Arc::clone(&self.parts.analytics),
            Arc::clone(&self.consent_answered),
            self.config.consent_timeout,
        );
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Some(outcome) = race.run().await {
                tracing::info!(
                    reported = outcome.reported,
                    effective = ?outcome.effective,
                    timed_out = outcome.timed_out,
                    "consent resolved"
                );
                *this.consent_outcome.lock() = Some(outcome);
                this.gate.start_timeout_timer();
                this.gate.mark_completed(ConfigurationEvent::ConsentAnswered);
            }
        });
    }

    fn start_remote_fetch(self: &Arc<Self>) {
        if self
            .fetch_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let keys = this.remote_fetch_keys();
            let values = match this.parts.remote_config.fetch(&keys).await {
                Ok(values) => values,
                Err(err) => {
                    tracing::warn!(%err, "remote config fetch failed, proceeding with empty map");
                    SignalMap::new()
                }
            };
            *this.remote_values.lock() = values;
            this.gate
                .mark_completed(ConfigurationEvent::RemoteConfigLoaded);
        });
    }

    /// Re-read the backend so a recomputation sees refreshed values. A
    /// failed refresh keeps the previously cached map instead of degrading
    /// an already-good cache to empty.
    async fn refresh_remote_values(&self) {
        let keys = self.remote_fetch_keys();
        match self.parts.remote_config.fetch(&keys).await {
            Ok(values) => *self.remote_values.lock() = values,
            Err(err) => {
                tracing::warn!(%err, "remote config refresh failed, keeping cached values");
            }
        }
    }

    /// Consent and remote config are both in: configure attribution URL
    /// paths (remote overrides win when non-empty) and sync the server.
    fn start_attribution_stage(self: &Arc<Self>) {
        *self.state.lock() = OrchestratorState::AttAndConfigReady;

        let paths = {
            let remote = self.remote_values.lock();
            let install = remote.get(INSTALL_PATH_KEY).filter(|v| !v.is_empty());
            let purchase = remote.get(PURCHASE_PATH_KEY).filter(|v| !v.is_empty());
            match (install, purchase) {
                (Some(install), Some(purchase)) => AttributionPaths {
                    install_path: install.clone(),
                    purchase_path: purchase.clone(),
                },
                _ => self.config.attribution_paths.clone(),
            }
        };
        self.parts.attribution.configure_paths(paths);

        let this = Arc::clone(self);
        tokio::spawn(async move {
            match this.parts.attribution.sync().await {
                Ok(_) => tracing::debug!("attribution sync completed"),
                Err(err) => tracing::warn!(%err, "attribution sync failed, continuing"),
            }
            this.gate
                .mark_completed(ConfigurationEvent::AttributionServerHandled);
        });
    }

    /// One-time completion: compute the result and hand it to the host.
    fn finish_configuration(self: &Arc<Self>) {
        let result = self.compute_result(true);
        *self.state.lock() = OrchestratorState::ConfigurationFinished;
        tracing::info!(
            user_source = %result.user_source,
            active_paywall = %result.active_paywall,
            "configuration finished"
        );
        self.parts.observer.configuration_finished(result);
    }

    fn compute_result(&self, first: bool) -> ResolutionResult {
        let signals = self.collector.collect();

        let resolver = SourceResolver {
            restricted_fallback: self.config.restricted_fallback,
        };
        let source = resolver.resolve(&signals);

        {
            let mut entries = self.remote_entries.lock();
            apply_remote_config(&mut entries, &signals.remote_config, source);
        }

        let variants = VariantConfig::from_remote(&signals.remote_config);
        self.emit_ab_test_analytics(&variants, source, first, &signals);

        let selection = VariantSelector.select(source, &variants, &signals);
        let result = ResolutionResult::from_selection(source, selection, &signals);
        *self.latest.lock() = Some(result.clone());
        result
    }

    /// AB-test exposure tagging: user properties on every computation, the
    /// distribution event only on first configuration.
    fn emit_ab_test_analytics(
        &self,
        variants: &VariantConfig,
        source: UserSource,
        first: bool,
        signals: &SignalBundle,
    ) {
        for test in AbTest::ALL {
            self.parts
                .analytics
                .set_user_property(test.config_key(), variants.raw_value(test));
        }
        if first {
            let mut params = SignalMap::new();
            params.insert("user_source".to_string(), source.as_str().to_string());
            params.insert(
                "network".to_string(),
                signals.network().unwrap_or_default().to_string(),
            );
            self.parts.analytics.log_event(TEST_DISTRIBUTION_EVENT, params);
        }
    }

    /// Environment bypass: synthesize the result from overrides and skip
    /// the pipeline. Test seam only.
    fn configure_from_environment(&self) {
        self.bypassed.store(true, Ordering::SeqCst);

        let network =
            std::env::var(NETWORK_ENV).unwrap_or_else(|_| UserSource::Organic.as_str().to_string());
        let paywall =
            std::env::var(ACTIVE_PAYWALL_ENV).unwrap_or_else(|_| "none".to_string());

        {
            let mut entries = self.remote_entries.lock();
            for entry in entries.iter_mut() {
                let var = format!(
                    "{}{}",
                    CONFIG_OVERRIDE_ENV_PREFIX,
                    entry.key.to_uppercase()
                );
                if let Ok(value) = std::env::var(var) {
                    entry.value = value;
                }
            }
        }

        self.parts.purchases.initialize(&self.config.product_ids);

        let result = ResolutionResult::synthetic(&network, paywall);
        *self.latest.lock() = Some(result.clone());
        *self.state.lock() = OrchestratorState::ConfigurationFinished;
        tracing::info!(network = %network, "configuration bypassed via environment");
        self.parts.observer.configuration_finished(result);
    }

    fn remote_fetch_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = AbTest::ALL
            .into_iter()
            .map(|test| test.config_key().to_string())
            .collect();
        keys.push("tiktok_full_access".to_string());
        keys.push(INSTALL_PATH_KEY.to_string());
        keys.push(PURCHASE_PATH_KEY.to_string());
        keys.extend(
            self.remote_entries
                .lock()
                .iter()
                .map(|entry| entry.key.clone()),
        );
        keys
    }
}
