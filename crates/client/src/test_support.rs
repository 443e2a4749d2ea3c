// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: an in-memory payroll backend and helpers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use tokio::sync::Semaphore;

use crate::credential::{LOGIN_PATH, LOGOUT_PATH, PROFILE_PATH, REFRESH_PATH};
use crate::error::AuthError;
use crate::identity::Identity;
use crate::transport::{ApiRequest, ApiResponse, RequestBody, Transport};

pub fn identity(username: &str) -> Identity {
    Identity {
        usuario_id: 1,
        nombre_usuario: username.to_owned(),
        correo: format!("{username}@example.com"),
        nombre: username.to_owned(),
        apellido: String::new(),
        es_activo: true,
        roles: vec!["capturista".to_owned()],
    }
}

/// In-memory backend.
///
/// Protected paths answer 200 only for `Bearer <valid token>`. Refresh issues
/// the next token from `refresh_tokens` (or fails with `refresh_status`), and
/// can be held back with [`gate_refresh`](Self::gate_refresh).
pub struct MockBackend {
    requests: Mutex<Vec<ApiRequest>>,
    valid_token: Mutex<Option<String>>,
    refresh_tokens: Mutex<Vec<String>>,
    refresh_status: Mutex<Option<u16>>,
    refresh_gate: Mutex<Option<Arc<Semaphore>>>,
    profile_gate: Mutex<Option<Arc<Semaphore>>>,
    refresh_calls: AtomicUsize,
    logout_fails: AtomicBool,
    always_unauthorized: AtomicBool,
    profile_status: Mutex<Option<u16>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            valid_token: Mutex::new(None),
            refresh_tokens: Mutex::new(Vec::new()),
            refresh_status: Mutex::new(None),
            refresh_gate: Mutex::new(None),
            profile_gate: Mutex::new(None),
            refresh_calls: AtomicUsize::new(0),
            logout_fails: AtomicBool::new(false),
            always_unauthorized: AtomicBool::new(false),
            profile_status: Mutex::new(None),
        }
    }

    /// Tokens handed out by successive refresh calls (last one repeats).
    pub fn with_refresh_tokens(self, tokens: &[&str]) -> Self {
        *self.refresh_tokens.lock() = tokens.iter().rev().map(|t| (*t).to_owned()).collect();
        self
    }

    /// Make every refresh call fail with `status`.
    pub fn with_refresh_failure(self, status: u16) -> Self {
        *self.refresh_status.lock() = Some(status);
        self
    }

    /// Protected endpoints reject every credential, fresh or not.
    pub fn always_unauthorized(self) -> Self {
        self.always_unauthorized.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_failing_logout(self) -> Self {
        self.logout_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_profile_status(self, status: u16) -> Self {
        *self.profile_status.lock() = Some(status);
        self
    }

    /// Hold refresh calls until [`release_refresh`](Self::release_refresh).
    pub fn gate_refresh(self) -> Self {
        *self.refresh_gate.lock() = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release_refresh(&self) {
        release(&self.refresh_gate);
    }

    /// Hold `/auth/me/` answers until [`release_profile`](Self::release_profile).
    /// The bearer is checked on arrival, before the hold.
    pub fn gate_profile(self) -> Self {
        *self.profile_gate.lock() = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn release_profile(&self) {
        release(&self.profile_gate);
    }

    /// Invalidate the current access token (server-side expiry).
    pub fn expire_tokens(&self) {
        *self.valid_token.lock() = None;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Recorded requests to `path`, in arrival order.
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests.lock().iter().filter(|r| r.path == path).cloned().collect()
    }

    /// `Authorization` headers seen on requests to `path`.
    pub fn bearers_to(&self, path: &str) -> Vec<Option<String>> {
        self.requests_to(path)
            .iter()
            .map(|r| {
                r.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_owned)
            })
            .collect()
    }

    fn bearer_is_valid(&self, request: &ApiRequest) -> bool {
        let presented = request
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match (presented, self.valid_token.lock().as_deref()) {
            (Some(presented), Some(valid)) => presented == valid,
            _ => false,
        }
    }

    async fn refresh(&self) -> ApiResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.refresh_gate).await;
        if let Some(status) = *self.refresh_status.lock() {
            return respond(status, serde_json::json!({ "detail": "Refresh token inválido" }));
        }
        let token = {
            let mut tokens = self.refresh_tokens.lock();
            if tokens.len() > 1 {
                tokens.pop()
            } else {
                tokens.last().cloned()
            }
        };
        match token {
            Some(token) => {
                *self.valid_token.lock() = Some(token.clone());
                respond(200, serde_json::json!({ "access_token": token, "token_type": "bearer" }))
            }
            None => respond(401, serde_json::json!({ "detail": "No session" })),
        }
    }

    fn login(&self, request: &ApiRequest) -> ApiResponse {
        let field = |name: &str| match &request.body {
            RequestBody::Form(fields) => {
                fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
            }
            _ => None,
        };
        let username = field("username").unwrap_or_default();
        if username == "outage" {
            return respond(503, serde_json::json!({ "detail": "Servicio no disponible" }));
        }
        if field("password").as_deref() != Some("pw") {
            return respond(401, serde_json::json!({ "detail": "Credenciales inválidas" }));
        }
        let token = format!("login-{username}");
        *self.valid_token.lock() = Some(token.clone());
        respond(
            200,
            serde_json::json!({
                "access_token": token,
                "token_type": "bearer",
                "user_data": identity(&username),
            }),
        )
    }
}

impl Transport for Arc<MockBackend> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        self.requests.lock().push(request.clone());
        // Let other tasks interleave like a real network hop would.
        tokio::task::yield_now().await;

        let path = request.path.as_str();
        let resp = match (&request.method, path) {
            (&Method::POST, REFRESH_PATH) => self.refresh().await,
            (&Method::POST, LOGIN_PATH) => self.login(request),
            (&Method::POST, LOGOUT_PATH) => {
                if self.logout_fails.load(Ordering::SeqCst) {
                    return Err(AuthError::Network("connection reset".to_owned()));
                }
                respond(200, serde_json::json!({ "ok": true }))
            }
            (_, "/offline/") => return Err(AuthError::Network("connection refused".to_owned())),
            (_, "/boom/") => respond(500, serde_json::json!({ "detail": "kaput" })),
            (&Method::GET, PROFILE_PATH) => {
                let forced = *self.profile_status.lock();
                let authorized = self.bearer_is_valid(request);
                pass(&self.profile_gate).await;
                match forced {
                    Some(status) => respond(status, serde_json::json!({ "detail": "forced" })),
                    None if authorized => {
                        respond(200, serde_json::to_value(identity("bob")).unwrap_or_default())
                    }
                    None => respond(401, serde_json::json!({ "detail": "Not authenticated" })),
                }
            }
            _ => {
                if !self.always_unauthorized.load(Ordering::SeqCst) && self.bearer_is_valid(request)
                {
                    respond(200, serde_json::json!({ "path": path }))
                } else {
                    respond(401, serde_json::json!({ "detail": "Not authenticated" }))
                }
            }
        };
        Ok(resp)
    }
}

/// Wait for a permit when `gate` is set.
async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
    let gate = gate.lock().clone();
    if let Some(gate) = gate {
        if let Ok(permit) = gate.acquire().await {
            permit.forget();
        }
    }
}

fn release(gate: &Mutex<Option<Arc<Semaphore>>>) {
    if let Some(gate) = gate.lock().as_ref() {
        gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }
}

fn respond(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse {
        status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        headers: HeaderMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

/// Poll `cond` until it holds, yielding to other tasks. Fails after 5s.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> anyhow::Result<()> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("condition not reached within 5s"))
}
