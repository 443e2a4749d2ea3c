// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use reqwest::header::AUTHORIZATION;

use super::*;

fn auth_header(request: &ApiRequest) -> Option<String> {
    request.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

#[test]
fn attaches_bearer_to_protected_call() {
    let mut req = ApiRequest::get("/usuarios/");
    let cred = Credential::new("abc");

    assert!(attach_credential(&mut req, Some(&cred)));
    assert_eq!(auth_header(&req).as_deref(), Some("Bearer abc"));
}

#[test]
fn skips_credential_issuing_endpoints() {
    let cred = Credential::new("abc");
    for path in ["/auth/login/", "/auth/refresh/"] {
        let mut req = ApiRequest::post(path);
        assert!(!attach_credential(&mut req, Some(&cred)));
        assert!(auth_header(&req).is_none(), "{path} must not carry a bearer");
    }
}

#[test]
fn passes_through_without_credential() {
    let mut req = ApiRequest::get("/areas/");
    assert!(!attach_credential(&mut req, None));
    assert!(auth_header(&req).is_none());
}

#[test]
fn explicit_header_wins_over_session_credential() {
    let mut req = ApiRequest::get("/auth/me/").bearer(&Credential::new("fresh"));
    assert!(!attach_credential(&mut req, Some(&Credential::new("stale"))));
    assert_eq!(auth_header(&req).as_deref(), Some("Bearer fresh"));
}

#[test]
fn rejects_credential_with_invalid_header_bytes() {
    let mut req = ApiRequest::get("/areas/");
    assert!(!attach_credential(&mut req, Some(&Credential::new("bad\ntoken"))));
    assert!(auth_header(&req).is_none());
}
