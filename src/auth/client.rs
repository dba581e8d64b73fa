//! Auth sub-client: password gate, session check, logout.

use crate::auth::guard::{GuardState, SessionGuard};
use crate::auth::store::{clear_token, load_token, save_token};
use crate::auth::{AuthToken, AuthenticateRequest, GateOutcome, VerifyResponse};
use crate::client::DashboardClient;
use crate::error::{AuthError, DashError, HttpError};
use crate::network::pages;
use crate::shared::now_ms;

/// Sub-client for the password gate and the school session.
pub struct Auth<'a> {
    pub(crate) client: &'a DashboardClient,
}

impl<'a> Auth<'a> {
    /// Submit the gate password.
    ///
    /// On success the session token is persisted and the caller navigates to
    /// [`GateOutcome::redirect`]. Every failure leaves the gate open for
    /// another attempt.
    pub async fn submit_password(&self, password: &str) -> Result<GateOutcome, DashError> {
        if password.trim().is_empty() {
            return Err(AuthError::EmptyPassword.into());
        }
        if self.client.config.wake_up_before_login {
            self.wake_up().await;
        }

        let request = AuthenticateRequest {
            password: password.to_string(),
        };
        let response = match self.client.http.school_authenticate(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "password submission failed");
                return Err(AuthError::LoginFailed(login_failure(&e)).into());
            }
        };

        if !response.success {
            return Err(AuthError::InvalidPassword.into());
        }
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let token = AuthToken {
            token,
            issued_at: now_ms(),
        };
        save_token(self.client.store.as_ref(), &token)?;
        tracing::info!("gate passed");

        Ok(GateOutcome {
            redirect: pages::SCHOOL,
            token,
        })
    }

    /// Ping the backend so a cold instance starts. Failure is ignored.
    pub async fn wake_up(&self) {
        if let Err(e) = self.client.http.wake_up().await {
            tracing::debug!(error = %e, "wake-up ping failed");
        }
    }

    /// One remote validation of `token`.
    pub async fn verify_session(&self, token: &str) -> Result<VerifyResponse, HttpError> {
        self.client.http.verify_session(token).await
    }

    /// Run the session guard to a terminal state.
    ///
    /// A stored token older than twelve hours is rejected without a network
    /// call. Otherwise it is verified once and never retried.
    pub async fn check_session(&self) -> Result<GuardState, DashError> {
        let store = self.client.store.as_ref();
        let mut guard = SessionGuard::new();
        let token = match guard.begin(store, now_ms())? {
            GuardState::Verifying(token) => token.token.clone(),
            other => return Ok(other.clone()),
        };
        let result = self.verify_session(&token).await;
        Ok(guard.complete(store, result, now_ms())?.clone())
    }

    pub fn stored_token(&self) -> Result<Option<AuthToken>, DashError> {
        load_token(self.client.store.as_ref())
    }

    /// Forget the stored session.
    pub fn logout(&self) -> Result<(), DashError> {
        clear_token(self.client.store.as_ref())
    }
}

fn login_failure(error: &HttpError) -> String {
    if error.is_transport() {
        error.to_string()
    } else {
        "Invalid password or server error".to_string()
    }
}
