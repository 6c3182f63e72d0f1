//! Visitor identity and per-activation session tokens.

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use rand::{RngCore, SeedableRng, TryRngCore, rngs::OsRng, rngs::StdRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::store::KeyValueStore;

pub const VISITOR_ID_KEY: &str = "muid";

/// One year.
pub const VISITOR_ID_MAX_AGE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Durable pseudonymous visitor identifier, persisted under [`VISITOR_ID_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VisitorIdentity(String);

impl VisitorIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Random identifier held in memory for one activation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a UUID v4 string from the OS random source, falling back to a
/// time-seeded pseudo-random generator when the OS source is unavailable.
pub fn generate_identifier() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string(),
        Err(e) => {
            warn!(error = %e, "secure random source unavailable, using pseudo-random identifier");
            let seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default();
            pseudo_random_identifier(&mut StdRng::seed_from_u64(seed))
        }
    }
}

/// UUID v4 shaped identifier from an arbitrary (not necessarily secure) source.
pub fn pseudo_random_identifier(rng: &mut impl RngCore) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

pub fn new_session_token() -> SessionToken {
    SessionToken(generate_identifier())
}

/// Read the visitor identity from the store, creating and persisting a new
/// one when it is missing or unreadable. Never fails: if persisting does not
/// work the fresh identity is still used for this activation.
pub async fn resolve_visitor_identity(store: &dyn KeyValueStore) -> VisitorIdentity {
    match store.get(VISITOR_ID_KEY).await {
        Ok(Some(existing)) if !existing.is_empty() => {
            debug!(muid = %existing, "found existing visitor identity");
            return VisitorIdentity(existing);
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not read visitor identity"),
    }

    let identity = VisitorIdentity(generate_identifier());
    match store
        .set(VISITOR_ID_KEY, identity.as_str(), VISITOR_ID_MAX_AGE)
        .await
    {
        Ok(()) => info!(muid = %identity, "created visitor identity"),
        Err(e) => warn!(error = %e, muid = %identity, "visitor identity not persisted"),
    }
    identity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn assert_uuid_v4_shape(id: &str) {
        assert_eq!(id.len(), 36);
        for (i, c) in id.chars().enumerate() {
            if [8, 13, 18, 23].contains(&i) {
                assert_eq!(c, '-', "position {i} in {id}");
            } else {
                assert!(c.is_ascii_hexdigit() && !c.is_ascii_uppercase(), "{id}");
            }
        }
        assert_eq!(&id[14..15], "4");
        assert!(matches!(&id[19..20], "8" | "9" | "a" | "b"), "{id}");
    }

    #[test]
    fn generated_identifiers_are_uuid_v4() {
        for _ in 0..64 {
            assert_uuid_v4_shape(&generate_identifier());
        }
    }

    #[test]
    fn pseudo_random_fallback_is_uuid_v4() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..64 {
            assert_uuid_v4_shape(&pseudo_random_identifier(&mut rng));
        }
    }

    #[test]
    fn session_tokens_differ_per_activation() {
        assert_ne!(new_session_token(), new_session_token());
    }

    #[tokio::test]
    async fn existing_identity_is_returned_unchanged() {
        let store = MemoryStore::new().with_entry(VISITOR_ID_KEY, "known-visitor");
        let identity = resolve_visitor_identity(&store).await;
        assert_eq!(identity.as_str(), "known-visitor");
    }

    #[tokio::test]
    async fn missing_identity_is_created_and_persisted() {
        let store = MemoryStore::new();
        let identity = resolve_visitor_identity(&store).await;

        assert_uuid_v4_shape(identity.as_str());
        let entry = store.entry(VISITOR_ID_KEY).unwrap();
        assert_eq!(entry.value, identity.as_str());
        assert!(entry.expires_at.unwrap() > chrono::Utc::now() + chrono::Duration::days(364));

        let again = resolve_visitor_identity(&store).await;
        assert_eq!(again, identity);
    }

    #[tokio::test]
    async fn unreadable_store_still_yields_an_identity() {
        let store = MemoryStore::new().fail_key(VISITOR_ID_KEY);
        let identity = resolve_visitor_identity(&store).await;
        assert_uuid_v4_shape(identity.as_str());
    }

    #[tokio::test]
    async fn failed_persist_is_not_fatal() {
        let store = MemoryStore::new().fail_writes();
        let identity = resolve_visitor_identity(&store).await;
        assert_uuid_v4_shape(identity.as_str());
        assert!(store.entry(VISITOR_ID_KEY).is_none());
    }
}
