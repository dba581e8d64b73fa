//! Unified error types.

use thiserror::Error;

/// Top-level crate error.
#[derive(Error, Debug)]
pub enum DashError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Empty payload: {0}")]
    EmptyPayload(String),

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl HttpError {
    /// Whether the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        match self {
            #[cfg(feature = "http")]
            HttpError::Reqwest(e) => e.status().is_none() && !e.is_decode(),
            HttpError::Timeout => true,
            HttpError::MaxRetriesExceeded { .. } => true,
            _ => false,
        }
    }

    /// Whether the server explicitly rejected the credentials (401/403).
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, HttpError::Unauthorized | HttpError::Forbidden)
    }
}

/// WebSocket errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Password gate and session errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please enter a password")]
    EmptyPassword,

    #[error("Invalid password.")]
    InvalidPassword,

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Authentication succeeded but no token was returned")]
    MissingToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_messages_match_ui_copy() {
        assert_eq!(AuthError::EmptyPassword.to_string(), "Please enter a password");
        assert_eq!(AuthError::InvalidPassword.to_string(), "Invalid password.");
    }

    #[test]
    fn test_auth_rejection_classification() {
        assert!(HttpError::Unauthorized.is_auth_rejection());
        assert!(HttpError::Forbidden.is_auth_rejection());
        assert!(!HttpError::Timeout.is_auth_rejection());
        assert!(HttpError::Timeout.is_transport());
        assert!(!HttpError::ServerError {
            status: 500,
            body: String::new()
        }
        .is_transport());
    }

    #[test]
    fn test_ws_error_messages() {
        assert_eq!(WsError::NotConnected.to_string(), "Not connected");
        let err: DashError = WsError::ConnectionFailed("refused".into()).into();
        assert_eq!(err.to_string(), "WebSocket error: Connection failed: refused");
        assert_eq!(
            AuthError::MissingToken.to_string(),
            "Authentication succeeded but no token was returned"
        );
    }

    #[test]
    fn test_http_error_converts_into_dash_error() {
        let err: DashError = HttpError::NotFound("history".into()).into();
        assert!(matches!(err, DashError::Http(HttpError::NotFound(_))));
    }
}
