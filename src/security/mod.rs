//! Security Module
//! Mission: API key issuance, per-key rate limiting, and the bearer auth gate

pub mod crypto;
pub mod key_store;
pub mod middleware;
pub mod rate_limit;

pub use key_store::{ApiKeyService, ApiKeyStore, RateLimitService};
pub use middleware::{bearer_auth_middleware, ApiIdentity, GateState};
pub use rate_limit::RateLimiterRegistry;
