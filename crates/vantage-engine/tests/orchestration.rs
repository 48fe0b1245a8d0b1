//! End-to-end orchestration tests over mock collaborators.
//!
//! Each test drives the full pipeline: configure, activate, then assert on
//! the result the host observer receives.

use std::sync::Arc;
use std::time::Duration;

use serial_test::serial;

use vantage_core::{ConsentStatus, RemoteConfigEntry, UserSource, DEFAULT_PAYWALL};
use vantage_engine::orchestrator::{
    ACTIVE_PAYWALL_ENV, CONFIG_OVERRIDE_ENV_PREFIX, NETWORK_ENV, SKIP_CONFIG_ENV,
};
use vantage_engine::testkit::{
    MockAttributionClient, MockConsentProvider, MockDeepLinkClient, MockPurchaseGateway,
    MockRemoteConfig, RecordingAnalytics, RecordingObserver,
};
use vantage_engine::{
    Collaborators, Orchestrator, OrchestratorConfig, OrchestratorState,
};

struct Pipeline {
    orchestrator: Arc<Orchestrator>,
    remote: Arc<MockRemoteConfig>,
    attribution: Arc<MockAttributionClient>,
    deep_link: Arc<MockDeepLinkClient>,
    analytics: Arc<RecordingAnalytics>,
    purchases: Arc<MockPurchaseGateway>,
    observer: Arc<RecordingObserver>,
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

fn pipeline(
    config: OrchestratorConfig,
    consent: MockConsentProvider,
    remote: MockRemoteConfig,
) -> Pipeline {
    init_tracing();
    let remote = Arc::new(remote);
    let attribution = Arc::new(MockAttributionClient::with_user_id("user-42"));
    let deep_link = Arc::new(MockDeepLinkClient::default());
    let analytics = Arc::new(RecordingAnalytics::default());
    let purchases = Arc::new(MockPurchaseGateway::default());
    let observer = Arc::new(RecordingObserver::default());
    let orchestrator = Orchestrator::new(
        config,
        Collaborators {
            consent: Arc::new(consent),
            remote_config: remote.clone(),
            attribution: attribution.clone(),
            deep_link: deep_link.clone(),
            analytics: analytics.clone(),
            purchases: purchases.clone(),
            observer: observer.clone(),
        },
    );
    Pipeline {
        orchestrator,
        remote,
        attribution,
        deep_link,
        analytics,
        purchases,
        observer,
    }
}

fn granted_pipeline(remote: MockRemoteConfig) -> Pipeline {
    pipeline(
        OrchestratorConfig::default(),
        MockConsentProvider::determined(ConsentStatus::Granted),
        remote,
    )
}

// =============================================================================
// Happy paths
// =============================================================================

#[tokio::test]
async fn test_paid_channel_resolves_and_selects_its_variant() {
    let p = granted_pipeline(MockRemoteConfig::with_values([
        ("ab_paywall_fb", "none_fb_wall"),
        ("ab_paywall_organic", "none_base"),
    ]));
    p.deep_link
        .set_result([("network", "web2app_fb_campaign_7")]);

    p.orchestrator.configure();
    p.orchestrator.on_app_active();

    let result = p.observer.wait_finished().await;
    assert_eq!(result.user_source, UserSource::Facebook);
    assert_eq!(result.active_paywall, "fb_wall");
    assert_eq!(result.per_channel_paywalls[&UserSource::Organic], "base");
    // Facebook surfaces the deep-link payload.
    assert_eq!(
        result.aux_signals.get("network").map(String::as_str),
        Some("web2app_fb_campaign_7")
    );
}

#[tokio::test]
async fn test_asa_resolution_surfaces_store_attribution() {
    let p = granted_pipeline(MockRemoteConfig::with_values([(
        "ab_paywall_asa",
        "search_wall",
    )]));
    p.attribution.set_install_result(vantage_core::StoreAttribution {
        is_ip_based: false,
        source_name: None,
        payload: [("campaignName".to_string(), "brand_us".to_string())]
            .into_iter()
            .collect(),
    });

    p.orchestrator.configure();
    p.orchestrator.on_app_active();

    let result = p.observer.wait_finished().await;
    assert_eq!(result.user_source, UserSource::Asa);
    assert_eq!(result.active_paywall, "search_wall");
    assert_eq!(
        result.aux_signals.get("campaignName").map(String::as_str),
        Some("brand_us")
    );
}

#[tokio::test]
async fn test_deep_link_value_indirection_overrides_channel_variant() {
    let p = granted_pipeline(MockRemoteConfig::with_values([
        ("ab_paywall_organic", "none_base"),
        ("promo_spring", "none_spring_wall"),
    ]));
    p.deep_link.set_result([("deep_link_value", "promo_spring")]);

    p.orchestrator.configure();
    p.orchestrator.on_app_active();

    let result = p.observer.wait_finished().await;
    assert_eq!(result.user_source, UserSource::Organic);
    assert_eq!(result.active_paywall, "spring_wall");
}

#[tokio::test]
async fn test_identity_propagates_to_all_collaborators() {
    let p = granted_pipeline(MockRemoteConfig::default());

    p.orchestrator.configure();
    p.orchestrator.on_app_active();
    p.observer.wait_finished().await;

    assert_eq!(p.deep_link.started_with().as_deref(), Some("user-42"));
    assert_eq!(p.analytics.user_id().as_deref(), Some("user-42"));
    assert_eq!(p.remote.user_id().as_deref(), Some("user-42"));
    assert!(p.purchases.status_updates() >= 1);
}

#[tokio::test]
async fn test_consent_outcome_recorded_for_determined_status() {
    let p = pipeline(
        OrchestratorConfig::default(),
        MockConsentProvider::determined(ConsentStatus::Denied),
        MockRemoteConfig::default(),
    );
    p.orchestrator.configure();
    p.orchestrator.on_app_active();
    p.observer.wait_finished().await;

    let outcome = p.orchestrator.consent_outcome().unwrap();
    assert!(!outcome.reported);
    assert_eq!(outcome.effective, ConsentStatus::Denied);
    assert!(!outcome.timed_out);
}

// =============================================================================
// Degraded paths
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_consent_timeout_still_finishes_configuration() {
    let config = OrchestratorConfig {
        consent_timeout: Duration::from_secs(5),
        configuration_timeout: Duration::from_secs(10),
        ..Default::default()
    };
    let p = pipeline(
        config,
        MockConsentProvider::unresponsive(),
        MockRemoteConfig::with_values([("ab_paywall_organic", "none_base")]),
    );

    p.orchestrator.configure();
    p.orchestrator.on_app_active();

    let result = p.observer.wait_finished().await;
    assert_eq!(result.active_paywall, "base");
    let outcome = p.orchestrator.consent_outcome().unwrap();
    assert!(outcome.timed_out);
    assert!(!outcome.reported);
}

#[tokio::test(start_paused = true)]
async fn test_slow_remote_fetch_finishes_degraded_on_gate_timeout() {
    let config = OrchestratorConfig {
        configuration_timeout: Duration::from_secs(10),
        ..Default::default()
    };
    let remote = MockRemoteConfig::with_values([("ab_paywall_organic", "none_base")]);
    remote.set_fetch_delay(Duration::from_secs(60));
    let p = pipeline(
        config,
        MockConsentProvider::determined(ConsentStatus::Granted),
        remote,
    );

    p.orchestrator.configure();
    p.orchestrator.on_app_active();

    let result = p.observer.wait_finished().await;
    // The fetch never landed: selection falls back to defaults.
    assert_eq!(result.active_paywall, DEFAULT_PAYWALL);
    assert_eq!(p.observer.finished_count(), 1);
}

#[tokio::test]
async fn test_missing_user_id_defers_fetch_but_still_finishes() {
    let consent = MockConsentProvider::determined(ConsentStatus::Granted);
    let remote = MockRemoteConfig::with_values([("ab_paywall_organic", "none_base")]);
    let consent = Arc::new(consent);
    let remote = Arc::new(remote);
    let attribution = Arc::new(MockAttributionClient::default());
    let deep_link = Arc::new(MockDeepLinkClient::default());
    let analytics = Arc::new(RecordingAnalytics::default());
    let purchases = Arc::new(MockPurchaseGateway::default());
    let observer = Arc::new(RecordingObserver::default());
    let orchestrator = Orchestrator::new(
        OrchestratorConfig {
            configuration_timeout: Duration::from_millis(50),
            ..Default::default()
        },
        Collaborators {
            consent,
            remote_config: remote.clone(),
            attribution,
            deep_link: deep_link.clone(),
            analytics,
            purchases,
            observer: observer.clone(),
        },
    );

    orchestrator.configure();
    orchestrator.on_app_active();

    observer.wait_finished().await;
    // No user id: the remote fetch never started and the deep-link client
    // was never bound, yet the gate timeout still completed the run.
    assert!(deep_link.started_with().is_none());
    assert!(remote.user_id().is_none());
    assert_eq!(observer.finished_count(), 1);
}

#[tokio::test]
async fn test_restricted_fallback_applies_when_configured() {
    let config = OrchestratorConfig {
        restricted_fallback: Some(UserSource::Facebook),
        ..Default::default()
    };
    let p = pipeline(
        config,
        MockConsentProvider::determined(ConsentStatus::Denied),
        MockRemoteConfig::with_values([("ab_paywall_fb", "none_fb_wall")]),
    );
    p.deep_link.set_result([("network", "restricted")]);

    p.orchestrator.configure();
    p.orchestrator.on_app_active();

    let result = p.observer.wait_finished().await;
    assert_eq!(result.user_source, UserSource::Facebook);
    assert_eq!(result.active_paywall, "fb_wall");
}

// =============================================================================
// Recompute / update flow
// =============================================================================

#[tokio::test]
async fn test_recompute_picks_up_changed_signals() {
    let p = granted_pipeline(MockRemoteConfig::with_values([
        ("ab_paywall_organic", "none_base"),
        ("ab_paywall_bing", "none_bing_wall"),
    ]));

    p.orchestrator.configure();
    p.orchestrator.on_app_active();
    let first = p.observer.wait_finished().await;
    assert_eq!(first.user_source, UserSource::Organic);

    // A deep link arrives after the first completion.
    p.deep_link.set_result([("network", "bing_int_42")]);
    p.orchestrator.recompute();

    let updated = p.observer.wait_updated(1).await;
    assert_eq!(updated.user_source, UserSource::Bing);
    assert_eq!(updated.active_paywall, "bing_wall");
    assert_eq!(p.orchestrator.state(), OrchestratorState::Updated);
    assert_eq!(p.observer.finished_count(), 1);
}

#[tokio::test]
async fn test_purchase_reported_through_attribution() {
    let p = granted_pipeline(MockRemoteConfig::default());
    p.orchestrator.configure();
    p.orchestrator.on_app_active();
    p.observer.wait_finished().await;

    p.orchestrator
        .report_purchase(vantage_engine::PurchaseRecord {
            product_id: "premium.yearly".into(),
            price: 59.99,
            currency: "EUR".into(),
            is_trial: true,
        })
        .await;

    let recorded = p.attribution.recorded_purchases();
    assert_eq!(recorded.len(), 1);
    assert!(recorded[0].is_trial);
}

#[tokio::test]
async fn test_result_snapshot_round_trips_through_json() {
    // Hosts persist the result across launches; the snapshot must survive
    // serialization unchanged.
    let p = granted_pipeline(MockRemoteConfig::with_values([(
        "ab_paywall_organic",
        "none_base",
    )]));
    p.orchestrator.configure();
    p.orchestrator.on_app_active();
    let result = p.observer.wait_finished().await;

    let json = serde_json::to_string(&result).unwrap();
    let restored: vantage_engine::ResolutionResult = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, result);
}

// =============================================================================
// Environment bypass seam
// =============================================================================

struct EnvGuard(Vec<&'static str>);

impl EnvGuard {
    fn set(vars: &[(&'static str, &str)]) -> Self {
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        Self(vars.iter().map(|(key, _)| *key).collect())
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.0 {
            std::env::remove_var(key);
        }
    }
}

#[tokio::test]
#[serial]
async fn test_env_bypass_synthesizes_result() {
    let _guard = EnvGuard::set(&[
        (SKIP_CONFIG_ENV, "1"),
        (NETWORK_ENV, "facebook"),
        (ACTIVE_PAYWALL_ENV, "qa_wall"),
    ]);
    let p = granted_pipeline(MockRemoteConfig::default());

    p.orchestrator.configure();

    let result = p.observer.wait_finished().await;
    assert_eq!(result.user_source, UserSource::Facebook);
    assert_eq!(result.active_paywall, "qa_wall");
    assert!(result
        .per_channel_paywalls
        .values()
        .all(|name| name == "qa_wall"));
    // The pipeline never ran.
    assert_eq!(p.attribution.sync_count(), 0);
    assert_eq!(
        p.orchestrator.state(),
        OrchestratorState::ConfigurationFinished
    );
}

#[tokio::test]
#[serial]
async fn test_env_bypass_defaults_to_organic_none() {
    let _guard = EnvGuard::set(&[(SKIP_CONFIG_ENV, "1")]);
    let p = granted_pipeline(MockRemoteConfig::default());

    p.orchestrator.configure();

    let result = p.observer.wait_finished().await;
    assert_eq!(result.user_source, UserSource::Organic);
    assert_eq!(result.active_paywall, "none");
}

#[tokio::test]
#[serial]
async fn test_env_bypass_overrides_declared_entries() {
    let _guard = EnvGuard::set(&[
        (SKIP_CONFIG_ENV, "1"),
        // CONFIG_OVERRIDE_ENV_PREFIX + uppercased entry key
        ("VANTAGE_CONFIG_ONBOARDING_STYLE", "compact"),
    ]);
    assert!("VANTAGE_CONFIG_ONBOARDING_STYLE".starts_with(CONFIG_OVERRIDE_ENV_PREFIX));

    let config = OrchestratorConfig {
        remote_entries: vec![RemoteConfigEntry::new(
            "onboarding_style",
            "full",
            [UserSource::Organic],
        )],
        ..Default::default()
    };
    let p = pipeline(
        config,
        MockConsentProvider::determined(ConsentStatus::Granted),
        MockRemoteConfig::default(),
    );

    p.orchestrator.configure();
    p.observer.wait_finished().await;

    let entries = p.orchestrator.remote_entries();
    assert_eq!(entries[0].value, "compact");
}

#[tokio::test]
#[serial]
async fn test_env_bypass_ignores_activation_and_recompute() {
    let _guard = EnvGuard::set(&[(SKIP_CONFIG_ENV, "1")]);
    let p = granted_pipeline(MockRemoteConfig::default());

    p.orchestrator.configure();
    p.observer.wait_finished().await;

    p.orchestrator.on_app_active();
    p.orchestrator.recompute();
    tokio::task::yield_now().await;

    assert_eq!(p.observer.updated_count(), 0);
    assert!(p.deep_link.started_with().is_none());
    assert_eq!(p.attribution.sync_count(), 0);
}
