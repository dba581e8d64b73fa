//! Authentication: the password gate, the stored session token and the
//! session guard that protects the school page.
//!
//! ## Token lifecycle
//!
//! - The gate posts the password to `/api/school-authenticate`. On success the
//!   returned token and the issue time are written to a [`store::TokenStore`]
//!   under [`TOKEN_KEY`] and [`TOKEN_TIME_KEY`].
//! - On entry to the protected page the [`guard::SessionGuard`] checks the
//!   token age locally, then asks `/api/verify-session` once. A verified
//!   session refreshes the stored issue time; anything else clears storage.
//!
//! Nothing here hashes or protects the password. The remote service owns
//! every security decision.

#[cfg(feature = "http")]
pub mod client;
pub mod guard;
pub mod store;

use crate::shared::HOUR_MS;
use serde::{Deserialize, Serialize};

pub use guard::{GuardState, RejectReason, Rejection, SessionGuard};
pub use store::{FileStore, MemoryStore, TokenStore};

/// Storage key of the session token.
pub const TOKEN_KEY: &str = "schoolAuthToken";
/// Storage key of the token issue time (Unix milliseconds, decimal string).
pub const TOKEN_TIME_KEY: &str = "schoolAuthTime";
/// Oldest token the guard will send for verification.
pub const TOKEN_MAX_AGE_MS: i64 = 12 * HOUR_MS;

// ============================================================================
// Session token
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    /// Unix milliseconds.
    pub issued_at: i64,
}

impl AuthToken {
    pub fn age(&self, now_ms: i64) -> i64 {
        now_ms - self.issued_at
    }

    /// Young enough to be worth verifying. A token exactly 12h old still is.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        self.age(now_ms) <= TOKEN_MAX_AGE_MS
    }
}

/// Result of a successful password submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    /// Page to navigate to.
    pub redirect: &'static str,
    pub token: AuthToken,
}

// ============================================================================
// Wire types
// ============================================================================

/// `POST /api/school-authenticate` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /api/verify-session` body. The token is also sent as a bearer header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub authenticated: Option<bool>,
    #[serde(default)]
    pub success: Option<bool>,
}

impl VerifyResponse {
    /// The backend answers with either flag.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated == Some(true) || self.success == Some(true)
    }
}
