// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Route prefixes that issue credentials rather than consume them.
const CREDENTIAL_ISSUING: &[&str] = &["/auth/login", "/auth/refresh"];

/// True if `target` (a path or absolute URL) is the login or refresh endpoint.
///
/// Such calls never get a bearer attached and never trigger renewal.
pub fn is_credential_issuing(target: &str) -> bool {
    let target = target.to_ascii_lowercase();
    CREDENTIAL_ISSUING.iter().any(|prefix| {
        target.match_indices(prefix).any(|(idx, _)| {
            let rest = &target[idx + prefix.len()..];
            matches!(rest.chars().next(), None | Some('/') | Some('?') | Some('#'))
        })
    })
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
