//! Named configuration-completion events.
//!
//! The startup sequence is gated on a declared set of events, each marked
//! completed exactly once. The internal set covers consent, remote config
//! and attribution sync; hosts may declare additional events of their own
//! through [`ConfigurationEvent::Custom`].

use serde::{Deserialize, Serialize};

/// A named token tracked by the configuration gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigurationEvent {
    /// The consent race resolved (prompt answer or timeout)
    ConsentAnswered,
    /// The remote-configuration fetch finished (possibly degraded to empty)
    RemoteConfigLoaded,
    /// The attribution-server sync finished (success or failure)
    AttributionServerHandled,
    /// A host-declared event, compared by name
    Custom(String),
}

impl ConfigurationEvent {
    /// The three events every configuration run declares.
    pub fn internal_set() -> Vec<ConfigurationEvent> {
        vec![
            Self::ConsentAnswered,
            Self::RemoteConfigLoaded,
            Self::AttributionServerHandled,
        ]
    }

    /// Stable name used for logging and host-side declaration.
    pub fn name(&self) -> &str {
        match self {
            Self::ConsentAnswered => "consent_answered",
            Self::RemoteConfigLoaded => "remote_config_loaded",
            Self::AttributionServerHandled => "attribution_server_handled",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for ConfigurationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_set_has_three_events() {
        let events = ConfigurationEvent::internal_set();
        assert_eq!(events.len(), 3);
        assert!(events.contains(&ConfigurationEvent::ConsentAnswered));
    }

    #[test]
    fn test_custom_events_compare_by_name() {
        let a = ConfigurationEvent::Custom("onboarding_shown".into());
        let b = ConfigurationEvent::Custom("onboarding_shown".into());
        assert_eq!(a, b);
        assert_eq!(a.name(), "onboarding_shown");
    }
}
