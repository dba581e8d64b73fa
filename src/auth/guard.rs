//! Session guard for the protected page.
//!
//! ```text
//! Unchecked ──(fresh token)──▶ Verifying ──(verified)──▶ Authenticated
//!     │                            │
//!     └──(missing/expired)──▶ Rejected ◀──(any failure)──┘
//! ```
//!
//! Rejected and Authenticated are terminal. Verification is never retried.

use super::store::{clear_token, load_token, touch_token, TokenStore};
use super::{AuthToken, VerifyResponse};
use crate::error::{DashError, HttpError};
use crate::network::pages;
use std::time::Duration;

/// Redirect delay after a verification request that never got a response.
pub const NETWORK_FAILURE_REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoToken,
    Expired,
    /// The server answered 401 or 403.
    ServerRejected,
    /// Any other non-2xx answer.
    ServerError,
    NetworkError,
    /// 2xx, but neither `authenticated` nor `success` was set.
    NotAuthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub redirect_to: &'static str,
    pub redirect_after: Duration,
}

impl Rejection {
    fn new(reason: RejectReason) -> Self {
        let redirect_after = match reason {
            RejectReason::NetworkError => NETWORK_FAILURE_REDIRECT_DELAY,
            _ => Duration::ZERO,
        };
        Self {
            reason,
            redirect_to: pages::HOME,
            redirect_after,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Unchecked,
    Verifying(AuthToken),
    Authenticated,
    Rejected(Rejection),
}

impl GuardState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GuardState::Authenticated | GuardState::Rejected(_))
    }
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    state: GuardState,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionGuard {
    pub fn new() -> Self {
        Self {
            state: GuardState::Unchecked,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// The "Authenticating..." overlay stays up until a terminal state.
    pub fn overlay_visible(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Token to verify, while in `Verifying`.
    pub fn pending_token(&self) -> Option<&AuthToken> {
        match &self.state {
            GuardState::Verifying(t) => Some(t),
            _ => None,
        }
    }

    /// Local check. Moves `Unchecked` to `Verifying` or `Rejected`.
    ///
    /// An unreadable store counts as no token.
    pub fn begin(&mut self, store: &dyn TokenStore, now_ms: i64) -> Result<&GuardState, DashError> {
        if self.state != GuardState::Unchecked {
            return Ok(&self.state);
        }
        let stored = match load_token(store) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "stored session unreadable");
                if let Err(e) = clear_token(store) {
                    tracing::debug!(error = %e, "could not clear unreadable session");
                }
                self.state = GuardState::Rejected(Rejection::new(RejectReason::NoToken));
                return Ok(&self.state);
            }
        };
        self.state = match stored {
            Some(token) if token.is_fresh(now_ms) => GuardState::Verifying(token),
            Some(token) => {
                tracing::info!(age_ms = token.age(now_ms), "stored session expired");
                Self::reject(store, RejectReason::Expired)?
            }
            None => Self::reject(store, RejectReason::NoToken)?,
        };
        Ok(&self.state)
    }

    /// Apply the verification result. Ignored unless `Verifying`.
    pub fn complete(
        &mut self,
        store: &dyn TokenStore,
        result: Result<VerifyResponse, HttpError>,
        now_ms: i64,
    ) -> Result<&GuardState, DashError> {
        if !matches!(self.state, GuardState::Verifying(_)) {
            return Ok(&self.state);
        }
        self.state = match result {
            Ok(resp) if resp.is_authenticated() => {
                touch_token(store, now_ms)?;
                GuardState::Authenticated
            }
            Ok(_) => Self::reject(store, RejectReason::NotAuthenticated)?,
            Err(e) if e.is_auth_rejection() => Self::reject(store, RejectReason::ServerRejected)?,
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "session verification unreachable");
                Self::reject(store, RejectReason::NetworkError)?
            }
            Err(e) => {
                tracing::warn!(error = %e, "session verification failed");
                Self::reject(store, RejectReason::ServerError)?
            }
        };
        Ok(&self.state)
    }

    fn reject(store: &dyn TokenStore, reason: RejectReason) -> Result<GuardState, DashError> {
        clear_token(store)?;
        Ok(GuardState::Rejected(Rejection::new(reason)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::{save_token, FileStore, MemoryStore};
    use crate::auth::TOKEN_KEY;
    use crate::shared::HOUR_MS;

    fn store_with(issued_at: i64) -> MemoryStore {
        let store = MemoryStore::new();
        save_token(
            &store,
            &AuthToken {
                token: "tok".into(),
                issued_at,
            },
        )
        .unwrap();
        store
    }

    fn rejection(guard: &SessionGuard) -> Rejection {
        match guard.state() {
            GuardState::Rejected(r) => r.clone(),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_no_token_rejects_immediately() {
        let store = MemoryStore::new();
        let mut guard = SessionGuard::new();
        guard.begin(&store, 0).unwrap();
        let r = rejection(&guard);
        assert_eq!(r.reason, RejectReason::NoToken);
        assert_eq!(r.redirect_to, "../");
        assert_eq!(r.redirect_after, Duration::ZERO);
    }

    #[test]
    fn test_thirteen_hour_token_rejected_without_verification() {
        let store = store_with(0);
        let mut guard = SessionGuard::new();
        guard.begin(&store, 13 * HOUR_MS).unwrap();
        assert_eq!(rejection(&guard).reason, RejectReason::Expired);
        assert!(guard.pending_token().is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_verified_session_refreshes_time() {
        let store = store_with(0);
        let mut guard = SessionGuard::new();
        guard.begin(&store, HOUR_MS).unwrap();
        assert_eq!(guard.pending_token().map(|t| t.token.as_str()), Some("tok"));
        assert!(guard.overlay_visible());

        let resp = VerifyResponse {
            authenticated: Some(true),
            success: None,
        };
        guard.complete(&store, Ok(resp), 2 * HOUR_MS).unwrap();
        assert_eq!(guard.state(), &GuardState::Authenticated);
        assert!(!guard.overlay_visible());
        assert_eq!(load_token(&store).unwrap().unwrap().issued_at, 2 * HOUR_MS);
    }

    #[test]
    fn test_unauthenticated_answer_rejects_immediately() {
        let store = store_with(0);
        let mut guard = SessionGuard::new();
        guard.begin(&store, 1).unwrap();
        guard
            .complete(&store, Ok(VerifyResponse::default()), 2)
            .unwrap();
        let r = rejection(&guard);
        assert_eq!(r.reason, RejectReason::NotAuthenticated);
        assert_eq!(r.redirect_after, Duration::ZERO);
        assert_eq!(load_token(&store).unwrap(), None);
    }

    #[test]
    fn test_failure_classification() {
        let cases = [
            (HttpError::Forbidden, RejectReason::ServerRejected, Duration::ZERO),
            (HttpError::Unauthorized, RejectReason::ServerRejected, Duration::ZERO),
            (
                HttpError::ServerError {
                    status: 502,
                    body: String::new(),
                },
                RejectReason::ServerError,
                Duration::ZERO,
            ),
            (HttpError::Timeout, RejectReason::NetworkError, Duration::from_secs(2)),
        ];
        for (error, reason, delay) in cases {
            let store = store_with(0);
            let mut guard = SessionGuard::new();
            guard.begin(&store, 1).unwrap();
            guard.complete(&store, Err(error), 2).unwrap();
            let r = rejection(&guard);
            assert_eq!(r.reason, reason);
            assert_eq!(r.redirect_after, delay);
        }
    }

    #[test]
    fn test_unreadable_store_rejects_as_no_token() {
        let path = std::env::temp_dir().join(format!("stardash-guard-{}.json", std::process::id()));
        std::fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);

        let mut guard = SessionGuard::new();
        let state = guard.begin(&store, 0).unwrap().clone();
        let _ = std::fs::remove_file(&path);

        match state {
            GuardState::Rejected(r) => {
                assert_eq!(r.reason, RejectReason::NoToken);
                assert_eq!(r.redirect_to, "../");
                assert_eq!(r.redirect_after, Duration::ZERO);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(!guard.overlay_visible());
    }

    #[test]
    fn test_terminal_states_ignore_further_input() {
        let store = MemoryStore::new();
        let mut guard = SessionGuard::new();
        guard.begin(&store, 0).unwrap();
        let resp = VerifyResponse {
            authenticated: Some(true),
            success: None,
        };
        guard.complete(&store, Ok(resp), 1).unwrap();
        assert!(matches!(guard.state(), GuardState::Rejected(_)));
        guard.begin(&store, 2).unwrap();
        assert!(matches!(guard.state(), GuardState::Rejected(_)));
    }
}
