// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reqwest-backed transport for the payroll backend.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;

use crate::config::ClientConfig;
use crate::error::AuthError;
use crate::transport::{ApiRequest, ApiResponse, RequestBody, Transport};

/// HTTP transport for one backend base URL.
///
/// The cookie jar is enabled so the server's http-only renewal cookie is
/// stored on login and replayed on refresh without this crate touching it.
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        // reqwest is built without a bundled provider; first caller installs ring.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let mut headers = HeaderMap::new();
        headers.insert("X-Client-Type", HeaderValue::from_str(&config.client_type)?);
        let client = Client::builder()
            .timeout(config.timeout())
            .cookie_store(true)
            .default_headers(headers)
            .build()?;
        Ok(Self { base_url: config.api_url.trim_end_matches('/').to_owned(), client })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        let mut req = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .headers(request.headers.clone());
        req = match &request.body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(value),
            RequestBody::Form(fields) => req.form(fields),
        };

        let resp = req.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(ApiResponse { status, headers, body })
    }
}
