// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::state::Credential;
use crate::transport::classify::is_credential_issuing;
use crate::transport::ApiRequest;

/// Attach the session credential to a protected request.
///
/// Leaves the request untouched when it targets a credential-issuing
/// endpoint, when there is no credential, or when the caller already set an
/// explicit `Authorization` header. Returns whether a header was attached.
pub fn attach_credential(request: &mut ApiRequest, credential: Option<&Credential>) -> bool {
    if is_credential_issuing(&request.path) || request.has_authorization() {
        return false;
    }
    match credential {
        Some(credential) => {
            let attached = request.set_bearer(credential);
            if !attached {
                tracing::warn!(path = %request.path, "credential is not a valid header value");
            }
            attached
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
