// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential lifecycle: single-flight renewal and the once-per-process bootstrap.
//!
//! The long-lived renewal credential is an http-only cookie owned by the
//! transport's cookie jar; only the short-lived access token passes through here.

pub mod bootstrap;
pub mod coordinator;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

pub const LOGIN_PATH: &str = "/auth/login/";
pub const REFRESH_PATH: &str = "/auth/refresh/";
pub const PROFILE_PATH: &str = "/auth/me/";
pub const LOGOUT_PATH: &str = "/auth/logout/";

/// Body of a successful `/auth/refresh/` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Body of a `/auth/login/` response. Fields are optional so a malformed
/// response can be told apart from a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user_data: Option<Identity>,
}
