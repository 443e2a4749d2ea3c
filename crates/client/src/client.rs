// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authenticated API client.
//!
//! Every call the dashboard makes goes through [`AuthClient::dispatch`], which
//! attaches the current access credential, and on a `401` from a protected
//! endpoint renews the credential once (shared with any concurrent failures)
//! and replays the call.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::credential::bootstrap::BootstrapGate;
use crate::credential::coordinator::RenewalCoordinator;
use crate::credential::{LoginResponse, LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH};
use crate::error::{extract_detail, AuthError};
use crate::identity::Identity;
use crate::state::{Credential, SessionState};
use crate::transport::classify::is_credential_issuing;
use crate::transport::http::HttpTransport;
use crate::transport::outbound::attach_credential;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Session-aware API client. Cheap to clone; clones share one session.
pub struct AuthClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
    state: Arc<SessionState>,
    coordinator: Arc<RenewalCoordinator<T>>,
    bootstrap: Arc<BootstrapGate>,
}

impl<T: Transport> Clone for AuthClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
            coordinator: Arc::clone(&self.coordinator),
            bootstrap: Arc::clone(&self.bootstrap),
        }
    }
}

impl AuthClient<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> AuthClient<T> {
    pub fn new(transport: T) -> Self {
        let transport = Arc::new(transport);
        let state = Arc::new(SessionState::new());
        let coordinator = RenewalCoordinator::new(Arc::clone(&transport), Arc::clone(&state));
        Self { transport, state, coordinator, bootstrap: Arc::new(BootstrapGate::new()) }
    }

    pub fn session_state(&self) -> &SessionState {
        &self.state
    }

    pub fn coordinator(&self) -> &Arc<RenewalCoordinator<T>> {
        &self.coordinator
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.bootstrap.is_bootstrapping()
    }

    /// True if the current user holds any of `roles`.
    pub fn has_role(&self, roles: &[&str]) -> bool {
        self.state.identity().is_some_and(|identity| identity.has_any_role(roles))
    }

    /// Interactive login. On success the session holds the returned identity
    /// and access token; the renewal cookie lands in the transport's jar.
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "username and password are required".to_owned(),
            ));
        }

        let request =
            ApiRequest::post(LOGIN_PATH).form(&[("username", username), ("password", password)]);
        let resp = self.send_once(&request).await?;
        if resp.status.is_server_error() {
            info!(user = %username, status = %resp.status, "login unavailable");
            return Err(status_error(resp));
        }
        if !resp.is_success() {
            let detail = extract_detail(&resp.text())
                .unwrap_or_else(|| format!("login rejected ({})", resp.status));
            info!(user = %username, status = %resp.status, "login failed");
            return Err(AuthError::InvalidCredentials(detail));
        }

        let parsed: Result<LoginResponse, _> = resp.json();
        let (token, identity) = match parsed {
            Ok(LoginResponse { access_token: Some(token), user_data: Some(identity), .. })
                if !token.is_empty() =>
            {
                (token, identity)
            }
            _ => {
                warn!("login response missing access token or user data");
                self.state.clear();
                return Err(AuthError::InvalidCredentials("malformed login response".to_owned()));
            }
        };

        self.state.establish(identity.clone(), Credential::new(token));
        info!(user = %identity.nombre_usuario, "login succeeded");
        Ok(identity)
    }

    /// End the session locally and ask the server to drop the renewal cookie.
    /// Never fails; the session is always empty afterwards.
    pub async fn logout(&self) {
        self.teardown(true).await;
        info!("logged out");
    }

    /// Clear the session, reject queued renewal waiters with
    /// `SessionExpired`, and optionally notify the server (best effort).
    pub async fn teardown(&self, notify_server: bool) {
        let (drained, previous) = self.coordinator.teardown();
        if drained > 0 {
            debug!(waiters = drained, "rejected queued renewal waiters");
        }
        if !notify_server {
            return;
        }

        let mut request = ApiRequest::post(LOGOUT_PATH);
        if let Some(session) = previous.as_ref() {
            request.set_bearer(&session.credential);
        }
        match self.transport.send(&request).await {
            Ok(resp) if resp.is_success() => {}
            Ok(resp) => warn!(status = %resp.status, "server logout rejected"),
            Err(e) => warn!(err = %e, "server logout failed"),
        }
    }

    /// Send a call through the interceptor chain.
    ///
    /// A `401` from a protected endpoint triggers one shared renewal and one
    /// replay with the renewed credential. Everything else is returned as-is.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let resp = self.send_once(&request).await?;
        if resp.is_success() {
            return Ok(resp);
        }
        if resp.status != StatusCode::UNAUTHORIZED || is_credential_issuing(&request.path) {
            return Err(status_error(resp));
        }

        debug!(path = %request.path, "credential expired, renewing");
        let credential = self.coordinator.acquire().await?;

        let mut replay = request;
        if !replay.set_bearer(&credential) {
            warn!(path = %replay.path, "renewed credential is not a valid header value");
        }
        debug!(path = %replay.path, "replaying call with renewed credential");
        let resp = self.send_once(&replay).await?;
        if resp.is_success() {
            return Ok(resp);
        }
        if resp.status == StatusCode::UNAUTHORIZED {
            return Err(AuthError::ExpiredCredential);
        }
        Err(status_error(resp))
    }

    /// `dispatch` a GET and decode the JSON body.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, AuthError> {
        self.dispatch(ApiRequest::get(path)).await?.json()
    }

    /// `dispatch` a JSON POST and return the decoded body (`null` when empty).
    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        self.dispatch(ApiRequest::post(path).json(body)).await?.json_value()
    }

    /// Fetch `/auth/me/`. Returns `None` when the server says the session is
    /// not valid (401/403 or a failed renewal).
    pub async fn current_profile(&self) -> Result<Option<Identity>, AuthError> {
        match self.get_json::<Identity>(PROFILE_PATH).await {
            Ok(identity) => Ok(Some(identity)),
            Err(
                AuthError::ExpiredCredential
                | AuthError::RenewalFailed(_)
                | AuthError::SessionExpired,
            ) => Ok(None),
            Err(AuthError::Status { status: 401 | 403, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Restore an existing session from the renewal cookie, once per process.
    ///
    /// Later and concurrent callers wait for the first run to finish. A
    /// missing session is not an error: the client just stays anonymous.
    pub async fn bootstrap(&self) {
        if !self.bootstrap.try_claim() {
            self.bootstrap.wait().await;
            return;
        }
        let _finish = self.bootstrap.finish_on_drop();

        // A login or logout while the restore is in flight wins over it.
        let epoch = self.state.epoch();
        match self.restore_session(epoch).await {
            Ok(identity) => {
                info!(user = %identity.nombre_usuario, "existing session restored");
            }
            Err(e) => {
                self.state.clear_if(epoch);
                info!(reason = %e, "no existing session");
            }
        }
    }

    /// Wait until the first bootstrap has completed.
    pub async fn wait_bootstrapped(&self) {
        self.bootstrap.wait().await;
    }

    async fn restore_session(&self, epoch: u64) -> Result<Identity, AuthError> {
        let credential = self.coordinator.acquire().await?;
        // Pass the fresh credential explicitly; the session holds no identity yet.
        let request = ApiRequest::get(PROFILE_PATH).bearer(&credential);
        let resp = self.transport.send(&request).await?;
        if !resp.is_success() {
            return Err(status_error(resp));
        }
        let identity: Identity = resp.json()?;
        if !self.state.establish_if(epoch, identity.clone(), credential) {
            return Err(AuthError::SessionExpired);
        }
        Ok(identity)
    }

    /// One trip through the outbound interceptor and the transport.
    async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        let mut outgoing = request.clone();
        let credential = self.state.credential();
        attach_credential(&mut outgoing, credential.as_ref());
        self.transport.send(&outgoing).await
    }
}

fn status_error(resp: ApiResponse) -> AuthError {
    AuthError::Status { status: resp.status.as_u16(), body: resp.text() }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
