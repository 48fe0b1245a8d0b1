//! Programmable mock collaborators for engine tests.
//!
//! Not part of the public API surface; kept in-tree so unit tests and the
//! integration suite share one set of mocks.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use vantage_core::{
    ConsentStatus, ResolutionResult, Result, SignalMap, StoreAttribution, VantageError,
};

use crate::collaborators::{
    AnalyticsSink, AttributionClient, AttributionPaths, ConfigurationObserver, ConsentProvider,
    DeepLinkClient, PurchaseGateway, PurchaseRecord, RemoteConfigFetcher,
};

fn map_of<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> SignalMap {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Consent
// =============================================================================

/// Consent prompt mock: pre-determined, answering after a delay, or silent.
pub struct MockConsentProvider {
    status: Mutex<ConsentStatus>,
    scheduled: Mutex<Option<(ConsentStatus, Instant)>>,
    response: Option<(ConsentStatus, Duration)>,
}

impl MockConsentProvider {
    /// Platform status already determined; the prompt is never shown.
    pub fn determined(status: ConsentStatus) -> Self {
        Self {
            status: Mutex::new(status),
            scheduled: Mutex::new(None),
            response: None,
        }
    }

    /// Prompt answers `status` after `delay`.
    pub fn answering(status: ConsentStatus, delay: Duration) -> Self {
        Self {
            status: Mutex::new(ConsentStatus::NotDetermined),
            scheduled: Mutex::new(None),
            response: Some((status, delay)),
        }
    }

    /// Prompt never resolves.
    pub fn unresponsive() -> Self {
        Self {
            status: Mutex::new(ConsentStatus::NotDetermined),
            scheduled: Mutex::new(None),
            response: None,
        }
    }

    /// Change the platform-reported status once `after` has elapsed,
    /// without the prompt ever resolving. Models a late answer.
    pub fn set_status_after(&self, status: ConsentStatus, after: Duration) {
        *self.scheduled.lock() = Some((status, Instant::now() + after));
    }
}

#[async_trait]
impl ConsentProvider for MockConsentProvider {
    fn status(&self) -> ConsentStatus {
        if let Some((status, at)) = *self.scheduled.lock() {
            if Instant::now() >= at {
                return status;
            }
        }
        *self.status.lock()
    }

    async fn request(&self) -> ConsentStatus {
        match self.response {
            Some((status, delay)) => {
                tokio::time::sleep(delay).await;
                *self.status.lock() = status;
                status
            }
            None => futures::future::pending().await,
        }
    }
}

// =============================================================================
// Remote config
// =============================================================================

/// Remote-config fetcher mock returning a fixed map, optionally failing.
#[derive(Default)]
pub struct MockRemoteConfig {
    values: Mutex<SignalMap>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    user_id: Mutex<Option<String>>,
}

impl MockRemoteConfig {
    pub fn with_values<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: Mutex::new(map_of(entries)),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let mock = Self::default();
        mock.fail.store(true, Ordering::SeqCst);
        mock
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Change one backend value; later fetches return the refreshed map.
    pub fn set_value(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.lock().clone()
    }
}

#[async_trait]
impl RemoteConfigFetcher for MockRemoteConfig {
    fn set_user_id(&self, user_id: &str) {
        *self.user_id.lock() = Some(user_id.to_string());
    }

    async fn fetch(&self, _keys: &[String]) -> Result<SignalMap> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(VantageError::internal("remote config backend unavailable"));
        }
        Ok(self.values.lock().clone())
    }
}

// =============================================================================
// Attribution server
// =============================================================================

/// Attribution-server mock with programmable install payload.
#[derive(Default)]
pub struct MockAttributionClient {
    user_id: Mutex<Option<String>>,
    install_result: Mutex<Option<StoreAttribution>>,
    configured_paths: Mutex<Option<AttributionPaths>>,
    sync_count: AtomicUsize,
    fail_sync: AtomicBool,
    purchases: Mutex<Vec<PurchaseRecord>>,
}

impl MockAttributionClient {
    pub fn with_user_id(user_id: &str) -> Self {
        Self {
            user_id: Mutex::new(Some(user_id.to_string())),
            ..Default::default()
        }
    }

    pub fn set_install_result(&self, result: StoreAttribution) {
        *self.install_result.lock() = Some(result);
    }

    pub fn set_sync_fails(&self, fails: bool) {
        self.fail_sync.store(fails, Ordering::SeqCst);
    }

    pub fn sync_count(&self) -> usize {
        self.sync_count.load(Ordering::SeqCst)
    }

    pub fn configured_paths(&self) -> Option<AttributionPaths> {
        self.configured_paths.lock().clone()
    }

    pub fn recorded_purchases(&self) -> Vec<PurchaseRecord> {
        self.purchases.lock().clone()
    }
}

#[async_trait]
impl AttributionClient for MockAttributionClient {
    fn unique_user_id(&self) -> Option<String> {
        self.user_id.lock().clone()
    }

    fn install_result(&self) -> Option<StoreAttribution> {
        self.install_result.lock().clone()
    }

    fn configure_paths(&self, paths: AttributionPaths) {
        *self.configured_paths.lock() = Some(paths);
    }

    async fn sync(&self) -> Result<StoreAttribution> {
        self.sync_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(VantageError::internal("attribution server unreachable"));
        }
        Ok(self.install_result.lock().clone().unwrap_or_default())
    }

    async fn sync_purchase(&self, record: PurchaseRecord) {
        self.purchases.lock().push(record);
    }
}

// =============================================================================
// Deep links
// =============================================================================

/// Deep-link client mock with a settable payload.
#[derive(Default)]
pub struct MockDeepLinkClient {
    result: Mutex<SignalMap>,
    started_with: Mutex<Option<String>>,
}

impl MockDeepLinkClient {
    pub fn set_result<'a>(&self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) {
        *self.result.lock() = map_of(entries);
    }

    pub fn started_with(&self) -> Option<String> {
        self.started_with.lock().clone()
    }
}

impl DeepLinkClient for MockDeepLinkClient {
    fn start(&self, user_id: &str) {
        *self.started_with.lock() = Some(user_id.to_string());
    }

    fn deep_link_result(&self) -> SignalMap {
        self.result.lock().clone()
    }
}

// =============================================================================
// Analytics
// =============================================================================

/// Analytics sink that records everything for assertions.
#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<(String, SignalMap)>>,
    properties: Mutex<SignalMap>,
    user_id: Mutex<Option<String>>,
}

impl RecordingAnalytics {
    pub fn events_named(&self, name: &str) -> Vec<SignalMap> {
        self.events
            .lock()
            .iter()
            .filter(|(event, _)| event == name)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.lock().get(key).cloned()
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.lock().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn set_user_id(&self, user_id: &str) {
        *self.user_id.lock() = Some(user_id.to_string());
    }

    fn log_event(&self, name: &str, params: SignalMap) {
        self.events.lock().push((name.to_string(), params));
    }

    fn set_user_property(&self, key: &str, value: &str) {
        self.properties
            .lock()
            .insert(key.to_string(), value.to_string());
    }
}

// =============================================================================
// Purchases
// =============================================================================

/// Purchase gateway mock recording initialization.
#[derive(Default)]
pub struct MockPurchaseGateway {
    initialized_with: Mutex<Option<Vec<String>>>,
    init_calls: AtomicUsize,
    user_id: Mutex<Option<String>>,
    status_updates: AtomicUsize,
}

impl MockPurchaseGateway {
    pub fn initialized_with(&self) -> Option<Vec<String>> {
        self.initialized_with.lock().clone()
    }

    /// Number of `initialize` calls, counted per call so a double
    /// initialization is visible.
    pub fn init_count(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn status_updates(&self) -> usize {
        self.status_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PurchaseGateway for MockPurchaseGateway {
    fn initialize(&self, product_ids: &[String]) {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        *self.initialized_with.lock() = Some(product_ids.to_vec());
    }

    fn set_user_id(&self, user_id: &str) {
        *self.user_id.lock() = Some(user_id.to_string());
    }

    async fn update_product_status(&self) {
        self.status_updates.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Host observer
// =============================================================================

/// Observer that records results and lets tests await the first one.
#[derive(Default)]
pub struct RecordingObserver {
    finished: Mutex<Vec<ResolutionResult>>,
    updated: Mutex<Vec<ResolutionResult>>,
    notify: Notify,
}

impl RecordingObserver {
    /// Wait until `configuration_finished` has been delivered.
    pub async fn wait_finished(&self) -> ResolutionResult {
        loop {
            if let Some(result) = self.finished.lock().first().cloned() {
                return result;
            }
            self.notify.notified().await;
        }
    }

    /// Wait until at least `count` update notifications arrived.
    pub async fn wait_updated(&self, count: usize) -> ResolutionResult {
        loop {
            {
                let updated = self.updated.lock();
                if updated.len() >= count {
                    if let Some(result) = updated.last().cloned() {
                        return result;
                    }
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn finished_count(&self) -> usize {
        self.finished.lock().len()
    }

    pub fn updated_count(&self) -> usize {
        self.updated.lock().len()
    }
}

impl ConfigurationObserver for RecordingObserver {
    fn configuration_finished(&self, result: ResolutionResult) {
        self.finished.lock().push(result);
        self.notify.notify_one();
    }

    fn configuration_updated(&self, result: ResolutionResult) {
        self.updated.lock().push(result);
        self.notify.notify_one();
    }
}
