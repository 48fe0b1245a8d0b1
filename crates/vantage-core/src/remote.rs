//! Source-gated application of remote configuration.
//!
//! Remote overrides are strictly additive and opt-in per source: an entry
//! keeps its compile-time default unless the active source is in its
//! declared active-for set *and* a remote value exists for its key.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::signals::SignalMap;
use crate::source::UserSource;

/// A configurable entry the host exposes for remote override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfigEntry {
    /// Remote-config key this entry reads from
    pub key: String,
    /// Current value (compile-time default until overridden)
    pub value: String,
    /// Sources this entry accepts remote overrides for
    pub active_for: BTreeSet<UserSource>,
}

impl RemoteConfigEntry {
    /// Create an entry with its compile-time default value.
    pub fn new(
        key: impl Into<String>,
        default_value: impl Into<String>,
        active_for: impl IntoIterator<Item = UserSource>,
    ) -> Self {
        Self {
            key: key.into(),
            value: default_value.into(),
            active_for: active_for.into_iter().collect(),
        }
    }
}

/// Overwrite entry values from `remote` where the active source allows it.
pub fn apply_remote_config(
    entries: &mut [RemoteConfigEntry],
    remote: &SignalMap,
    active_source: UserSource,
) {
    for entry in entries {
        if entry.active_for.is_empty() || !entry.active_for.contains(&active_source) {
            continue;
        }
        if let Some(remote_value) = remote.get(&entry.key) {
            entry.value = remote_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_with(key: &str, value: &str) -> SignalMap {
        [(key.to_string(), value.to_string())].into_iter().collect()
    }

    #[test]
    fn test_override_applies_for_declared_source() {
        let mut entries = vec![RemoteConfigEntry::new(
            "subscription_screen_style",
            "classic",
            [UserSource::Organic, UserSource::Facebook],
        )];
        apply_remote_config(
            &mut entries,
            &remote_with("subscription_screen_style", "modern"),
            UserSource::Facebook,
        );
        assert_eq!(entries[0].value, "modern");
    }

    #[test]
    fn test_undeclared_source_keeps_default() {
        let mut entries = vec![RemoteConfigEntry::new(
            "subscription_screen_style",
            "classic",
            [UserSource::Organic],
        )];
        // A remote value exists, but tiktok was never declared.
        apply_remote_config(
            &mut entries,
            &remote_with("subscription_screen_style", "modern"),
            UserSource::Tiktok,
        );
        assert_eq!(entries[0].value, "classic");
    }

    #[test]
    fn test_empty_active_for_never_overrides() {
        let mut entries = vec![RemoteConfigEntry::new("k", "default", [])];
        apply_remote_config(&mut entries, &remote_with("k", "remote"), UserSource::Organic);
        assert_eq!(entries[0].value, "default");
    }

    #[test]
    fn test_missing_remote_value_keeps_default() {
        let mut entries = vec![RemoteConfigEntry::new("k", "default", [UserSource::Organic])];
        apply_remote_config(&mut entries, &SignalMap::new(), UserSource::Organic);
        assert_eq!(entries[0].value, "default");
    }
}
