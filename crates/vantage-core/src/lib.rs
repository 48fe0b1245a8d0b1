//! Vantage Core - Attribution & Variant Decision Model
//!
//! This crate provides the pure data model and decision logic for the
//! acquisition-attribution and remote-configuration pipeline. It contains no
//! runtime, no I/O and no collaborator bindings; everything here is a
//! deterministic function of its inputs.
//!
//! # Decision pipeline
//!
//! ```text
//! SignalBundle → SourceResolver → UserSource
//!                       ↓
//!              VariantSelector → PaywallSelection
//!                       ↓
//!              ResolutionResult (handed to the host)
//! ```
//!
//! # Design Principles
//!
//! - Resolution and selection are pure: identical signals always produce
//!   identical results, so precedence bugs are reproducible in unit tests.
//! - Configuration keys are a closed typed set ([`AbTest`]); only truly
//!   host-defined remote keys use the dynamic string-keyed path.
//! - Degraded signals (missing maps, unrecognized networks) resolve to safe
//!   defaults instead of errors.

#![forbid(unsafe_code)]

/// Acquisition channel classification
pub mod source;

/// Consent status and race outcome types
pub mod consent;

/// Named configuration-completion events
pub mod events;

/// Raw signal bundle collected before resolution
pub mod signals;

/// AB-test slots and paywall naming
pub mod variants;

/// Attribution source precedence policy
pub mod resolver;

/// Paywall variant selection
pub mod selector;

/// Source-gated remote configuration application
pub mod remote;

/// Final resolution output
pub mod resolution;

/// Unified error handling
pub mod errors;

// === Public API Re-exports ===

pub use consent::{ConsentOutcome, ConsentStatus};
pub use errors::{Result, VantageError};
pub use events::ConfigurationEvent;
pub use remote::{apply_remote_config, RemoteConfigEntry};
pub use resolution::ResolutionResult;
pub use resolver::SourceResolver;
pub use selector::{AuxSignal, PaywallSelection, VariantSelector};
pub use signals::{SignalBundle, SignalMap, StoreAttribution};
pub use source::UserSource;
pub use variants::{paywall_name_from_value, AbTest, VariantConfig, DEFAULT_PAYWALL};
