// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active session management endpoints.

use serde::{Deserialize, Serialize};

use crate::client::AuthClient;
use crate::error::AuthError;
use crate::transport::{ApiRequest, Transport};

/// A server-side session (one issued renewal cookie).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub token_id: i64,
    pub usuario_id: i64,
    pub nombre_usuario: String,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub apellido: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub client_type: Option<String>,
    pub created_at: String,
    pub expires_at: String,
}

/// All active sessions in the system (admin only).
pub async fn list_all<T: Transport>(
    client: &AuthClient<T>,
) -> Result<Vec<ActiveSession>, AuthError> {
    client.get_json("/auth/sessions/admin/").await
}

/// Active sessions of the current user.
pub async fn list_mine<T: Transport>(
    client: &AuthClient<T>,
) -> Result<Vec<ActiveSession>, AuthError> {
    client.get_json("/auth/sessions/").await
}

/// Revoke one session by token id (admin only).
pub async fn revoke<T: Transport>(client: &AuthClient<T>, token_id: i64) -> Result<(), AuthError> {
    client.dispatch(ApiRequest::post(format!("/auth/sessions/{token_id}/revoke_admin/"))).await?;
    Ok(())
}

/// Close every session of the current user, this one included.
///
/// The local session is torn down afterwards since its renewal cookie is gone.
pub async fn logout_all<T: Transport>(client: &AuthClient<T>) -> Result<(), AuthError> {
    client.dispatch(ApiRequest::post("/auth/logout_all/")).await?;
    client.teardown(false).await;
    Ok(())
}
