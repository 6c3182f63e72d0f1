//! Correlation signals captured once per activation.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Click identifiers, advertising pixel cookies and analytics session cookies
/// read at activation time.
pub const DEFAULT_SIGNALS: &[&str] = &[
    "_fbp",
    "_fbc",
    "fbclid",
    "gclid",
    "_gcl_aw",
    "_ga",
    "_gid",
    "ttclid",
    "_ttp",
    "msclkid",
    "_uetsid",
    "_uetvid",
    "_shopify_y",
    "_shopify_s",
];

/// Immutable mapping from each requested signal name to its value, or `None`
/// when the store had nothing (or failed) for that name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContextSnapshot {
    signals: BTreeMap<String, Option<String>>,
}

impl ContextSnapshot {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.signals.get(name).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    pub fn present(&self) -> impl Iterator<Item = (&str, &str)> {
        self.signals
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name.as_str(), v)))
    }

    /// `name=value` pairs joined by `; `, or `None` when no signal was found.
    pub fn cookie_header(&self) -> Option<String> {
        let header = self
            .present()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        (!header.is_empty()).then_some(header)
    }
}

impl FromIterator<(String, Option<String>)> for ContextSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self {
            signals: iter.into_iter().collect(),
        }
    }
}

/// Read every name independently; a failed read is recorded as absent and
/// never stops the remaining reads.
pub async fn capture_context(store: &dyn KeyValueStore, names: &[&str]) -> ContextSnapshot {
    let mut signals = BTreeMap::new();
    for &name in names {
        let value = match store.get(name).await {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(signal = name, error = %e, "context signal unreadable");
                None
            }
        };
        signals.insert(name.to_string(), value);
    }

    let snapshot = ContextSnapshot { signals };
    debug!(
        requested = names.len(),
        present = snapshot.present().count(),
        "captured context"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn covers_exactly_the_requested_names() {
        let store = MemoryStore::new()
            .with_entry("_fbp", "fb.1.123")
            .with_entry("unrelated", "x");

        let snapshot = capture_context(&store, &["_fbp", "gclid"]).await;

        let body = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(body.as_object().map(|m| m.len()), Some(2));
        assert_eq!(snapshot.get("_fbp"), Some("fb.1.123"));
        assert!(snapshot.contains("gclid"));
        assert_eq!(snapshot.get("gclid"), None);
        assert!(!snapshot.contains("unrelated"));
    }

    #[tokio::test]
    async fn one_failing_read_does_not_abort_the_rest() {
        let store = MemoryStore::new()
            .with_entry("_fbp", "fb.1")
            .with_entry("_ga", "GA1.2")
            .fail_key("_fbp");

        let snapshot = capture_context(&store, &["_fbp", "_ga"]).await;

        assert_eq!(snapshot.get("_fbp"), None);
        assert_eq!(snapshot.get("_ga"), Some("GA1.2"));
    }

    #[test]
    fn cookie_header_joins_present_signals() {
        let snapshot: ContextSnapshot = [
            ("_fbp".to_string(), Some("fb.1".to_string())),
            ("_ga".to_string(), Some("GA1".to_string())),
            ("gclid".to_string(), None),
        ]
        .into_iter()
        .collect();

        assert_eq!(snapshot.cookie_header().as_deref(), Some("_fbp=fb.1; _ga=GA1"));
    }

    #[test]
    fn empty_snapshot_has_no_cookie_header() {
        assert_eq!(ContextSnapshot::default().cookie_header(), None);
    }
}
