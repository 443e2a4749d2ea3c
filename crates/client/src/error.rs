// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::Deserialize;
use std::fmt;

/// Failure taxonomy for calls made through the auth client.
///
/// Cloneable because a single renewal outcome is fanned out to every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No response received (offline, DNS, transport timeout).
    Network(String),
    /// The login endpoint rejected the supplied username/password (any 4xx),
    /// or they were missing. Server errors on login surface as `Status`.
    InvalidCredentials(String),
    /// A protected endpoint answered `401`.
    ExpiredCredential,
    /// The renewal call itself failed.
    RenewalFailed(String),
    /// Synthetic rejection for waiters drained by session teardown.
    SessionExpired,
    /// Any other non-2xx response. `body` is the raw response text.
    Status { status: u16, body: String },
    /// A 2xx response whose body did not have the expected shape.
    Decode(String),
}

impl AuthError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Self::ExpiredCredential => "EXPIRED_CREDENTIAL",
            Self::RenewalFailed(_) => "RENEWAL_FAILED",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Status { .. } => "HTTP_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// HTTP status associated with this error, `0` when no response was received.
    ///
    /// Credential rejections all report `401`: the login form treats a 400,
    /// 403 or 422 answer the same way as a wrong password.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Network(_) | Self::Decode(_) => 0,
            Self::InvalidCredentials(_)
            | Self::ExpiredCredential
            | Self::RenewalFailed(_)
            | Self::SessionExpired => 401,
            Self::Status { status, .. } => *status,
        }
    }

    /// Message suitable for showing to an end user.
    ///
    /// Prefers the backend's `detail` field (a plain string, or the first
    /// entry of a validation error list), then a generic message per status.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the server. Check your network connection.".to_owned()
            }
            Self::InvalidCredentials(detail) if !detail.is_empty() => detail.clone(),
            Self::RenewalFailed(_) | Self::SessionExpired => {
                "Your session has expired. Please sign in again.".to_owned()
            }
            Self::Status { status, body } => {
                extract_detail(body).unwrap_or_else(|| generic_status_message(*status).to_owned())
            }
            Self::Decode(_) => "An unexpected error occurred in the application.".to_owned(),
            Self::InvalidCredentials(_) | Self::ExpiredCredential => {
                generic_status_message(401).to_owned()
            }
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "{}: {msg}", self.as_str()),
            Self::InvalidCredentials(msg) => write!(f, "{}: {msg}", self.as_str()),
            Self::RenewalFailed(msg) => write!(f, "{}: {msg}", self.as_str()),
            Self::Decode(msg) => write!(f, "{}: {msg}", self.as_str()),
            Self::Status { status, .. } => write!(f, "{} ({status})", self.as_str()),
            Self::ExpiredCredential | Self::SessionExpired => f.write_str(self.as_str()),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

/// Error body shape returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: Option<Detail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Validation(Vec<ValidationItem>),
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    msg: String,
}

/// Pull the backend's `detail` message out of an error body, if present.
pub fn extract_detail(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    match envelope.detail? {
        Detail::Message(msg) => Some(msg),
        Detail::Validation(items) => items.into_iter().next().map(|item| item.msg),
    }
}

fn generic_status_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request. Check the submitted data.",
        401 => "Unauthorized. Invalid credentials or expired session.",
        403 => "Forbidden. You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        409 => "Conflict. The resource already exists.",
        500 => "Internal server error. Try again later.",
        _ => "Unknown server error.",
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
