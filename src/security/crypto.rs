//! API Key Derivation
//! Mission: Deterministic, collision-resistant key material from salt + input

use sha2::{Digest, Sha256};

/// Expected length of a derived API key (hex-encoded SHA-256).
pub const API_KEY_LEN: usize = 64;

/// Derive an API key from the configured salt and an input string.
///
/// Computes SHA-256 over `salt + ":" + input` and returns the lowercase hex
/// digest. Deterministic: the same `(salt, input)` pair always yields the
/// same key, which is what makes first issuance idempotent.
pub fn derive_api_key(salt: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
