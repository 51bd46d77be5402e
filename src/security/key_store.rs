//! Credential Store
//! Mission: Exactly one live API key per identity, no stale key ever validates

use crate::security::crypto::derive_api_key;
use crate::security::rate_limit::RateLimiterRegistry;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Capability seam for the credential store so the gate and handlers can be
/// tested against fakes.
pub trait ApiKeyStore: Send + Sync {
    /// Return the existing key for `identity`, or derive and install one.
    /// Idempotent until the next rotation.
    fn issue_or_get(&self, identity: &str) -> String;

    /// Replace the identity's key with a freshly derived one. The old key
    /// stops validating the instant this returns.
    fn rotate(&self, identity: &str) -> String;

    /// Resolve the identity currently bound to `api_key`, if any.
    fn lookup(&self, api_key: &str) -> Option<String>;
}

/// Capability seam for per-key admission control.
pub trait RateLimitService: Send + Sync {
    /// Take one unit of quota for `api_key`; false means denied (not an error).
    fn try_acquire(&self, api_key: &str) -> bool;

    /// Drop any quota state held for `api_key`.
    fn discard(&self, api_key: &str);
}

/// The two directions of the credential binding, kept exact inverses of one
/// another. Guarded as a single unit so no caller ever observes a key mapping
/// to an identity whose own entry points at a different key.
#[derive(Default)]
struct KeyBindings {
    identity_to_key: HashMap<String, String>,
    key_to_identity: HashMap<String, String>,
}

/// In-memory credential store with per-key rate limiting.
///
/// One instance is constructed at startup and shared via `Arc`; state does
/// not survive a restart (clients simply re-authenticate). The binding maps
/// and the limiter registry are guarded separately so issuance and admission
/// checks never contend on the same lock.
pub struct ApiKeyService {
    salt: String,
    bindings: Mutex<KeyBindings>,
    limiters: Arc<RateLimiterRegistry>,
    rotation_seq: AtomicU64,
}

impl ApiKeyService {
    pub fn new(salt: impl Into<String>, rate_limit_qps: u32) -> Self {
        Self {
            salt: salt.into(),
            bindings: Mutex::new(KeyBindings::default()),
            limiters: Arc::new(RateLimiterRegistry::new(rate_limit_qps)),
            rotation_seq: AtomicU64::new(0),
        }
    }

    /// Nonce for rotation-time derivation: wall-clock nanos plus a process
    /// counter, never reused across calls, so repeated rotations can never
    /// reproduce an earlier key.
    fn next_rotation_nonce(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = self.rotation_seq.fetch_add(1, Ordering::Relaxed);
        format!("{nanos}-{seq}")
    }

    #[cfg(test)]
    fn binding_count(&self) -> usize {
        let bindings = self.bindings.lock();
        debug_assert_eq!(
            bindings.identity_to_key.len(),
            bindings.key_to_identity.len()
        );
        bindings.identity_to_key.len()
    }

    #[cfg(test)]
    pub(crate) fn limiters(&self) -> &RateLimiterRegistry {
        &self.limiters
    }
}

impl ApiKeyStore for ApiKeyService {
    fn issue_or_get(&self, identity: &str) -> String {
        assert!(!identity.is_empty(), "identity must be non-empty");

        // Single lock over both map directions makes the check-then-act
        // linearizable: concurrent first issuances for one identity all
        // observe the same installed key.
        let mut bindings = self.bindings.lock();
        if let Some(existing) = bindings.identity_to_key.get(identity) {
            return existing.clone();
        }

        let api_key = derive_api_key(&self.salt, identity);
        bindings
            .identity_to_key
            .insert(identity.to_string(), api_key.clone());
        bindings
            .key_to_identity
            .insert(api_key.clone(), identity.to_string());

        info!(identity, "Issued API key");
        api_key
    }

    fn rotate(&self, identity: &str) -> String {
        assert!(!identity.is_empty(), "identity must be non-empty");

        let nonce = self.next_rotation_nonce();
        let new_key = derive_api_key(&self.salt, &format!("{identity}:{nonce}"));

        let old_key = {
            let mut bindings = self.bindings.lock();
            let old_key = bindings.identity_to_key.remove(identity);
            if let Some(old) = &old_key {
                bindings.key_to_identity.remove(old);
            }
            bindings
                .identity_to_key
                .insert(identity.to_string(), new_key.clone());
            bindings
                .key_to_identity
                .insert(new_key.clone(), identity.to_string());
            old_key
        };

        // Outside the binding lock: the old key already fails lookup, so its
        // bucket can be dropped without coordinating with the gate.
        if let Some(old) = old_key {
            self.limiters.discard(&old);
        }

        info!(identity, "Rotated API key");
        new_key
    }

    fn lookup(&self, api_key: &str) -> Option<String> {
        self.bindings.lock().key_to_identity.get(api_key).cloned()
    }
}

impl RateLimitService for ApiKeyService {
    fn try_acquire(&self, api_key: &str) -> bool {
        self.limiters.admit(api_key)
    }

    fn discard(&self, api_key: &str) {
        self.limiters.discard(api_key);
    }
}
