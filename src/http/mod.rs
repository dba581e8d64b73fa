//! HTTP client layer: `DashHttp` with per-endpoint retry policies.

pub mod client;
pub mod retry;

#[cfg(test)]
pub(crate) mod fixture;

pub use client::DashHttp;
pub use retry::{RetryConfig, RetryPolicy};

use crate::error::HttpError;

/// Whether a call got as far as the server. Such calls count against the
/// upstream rate limit even when the response was an error.
pub(crate) fn reached_server<T>(result: &Result<T, HttpError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => !e.is_transport(),
    }
}
