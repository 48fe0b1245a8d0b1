//! Vantage Engine - Startup Orchestration Runtime
//!
//! The runtime layer over [`vantage_core`]: drives the consent race, the
//! remote-configuration fetch and the attribution-server sync through a
//! completion gate, then runs the pure decision pipeline and hands the
//! host one [`ResolutionResult`] per run.
//!
//! ```text
//!       ConsentRace ──┐
//!                     ├─→ ConfigurationGate ─→ SignalCollector
//!   remote fetch ─────┘          │                    │
//!                                └── Orchestrator ────┴─→ ResolutionResult
//! ```
//!
//! # Design Principles
//!
//! - Liveness over completeness: every run finishes, with timeouts turning
//!   missing signals into degraded-but-complete results.
//! - Collaborators are traits ([`collaborators`]); the engine never binds
//!   to a vendor SDK or wire format.
//! - Concurrency is first-wins: races resolve through compare-exchange
//!   latches and losers run to completion rather than being cancelled.

#![forbid(unsafe_code)]

/// Collaborator trait interfaces
pub mod collaborators;

/// Signal snapshotting before resolution
pub mod collector;

/// Consent prompt vs. timeout race
pub mod consent_race;

/// Named-event completion gate
pub mod gate;

/// The orchestration state machine
pub mod orchestrator;

/// Programmable mock collaborators for tests
pub mod testkit;

// === Public API Re-exports ===

pub use collaborators::{
    AnalyticsSink, AttributionClient, AttributionPaths, ConfigurationObserver, ConsentProvider,
    DeepLinkClient, PurchaseGateway, PurchaseRecord, RemoteConfigFetcher,
};
pub use collector::SignalCollector;
pub use consent_race::ConsentRace;
pub use gate::ConfigurationGate;
pub use orchestrator::{Collaborators, Orchestrator, OrchestratorConfig, OrchestratorState};

pub use vantage_core::ResolutionResult;
