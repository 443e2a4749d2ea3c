// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use parking_lot::RwLock;

use crate::identity::Identity;

/// Short-lived bearer token. Treated as an opaque capability string.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value for this credential.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// An authenticated session: identity and credential always travel together.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub credential: Credential,
}

/// Process-wide session slot.
///
/// Writers are login, bootstrap, renewal success, and teardown. Every read
/// sees either the old or the new session, never a mix of the two. The lock
/// is never held across an `.await`.
///
/// The epoch advances on every `establish` and `clear`. A writer that started
/// from an older epoch (a renewal or bootstrap outlived by a logout or a new
/// login) uses the `_if` variants and leaves the newer session alone.
#[derive(Debug, Default)]
pub struct SessionState {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    epoch: u64,
    session: Option<Session>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.read().session.as_ref().map(|s| s.identity.clone())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.inner.read().session.as_ref().map(|s| s.credential.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().session.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.inner.read().epoch
    }

    /// Install a full session (login).
    pub fn establish(&self, identity: Identity, credential: Credential) {
        let mut inner = self.inner.write();
        inner.epoch += 1;
        inner.session = Some(Session { identity, credential });
    }

    /// Install a full session unless the state moved past `epoch`.
    pub fn establish_if(&self, epoch: u64, identity: Identity, credential: Credential) -> bool {
        let mut inner = self.inner.write();
        if inner.epoch != epoch {
            return false;
        }
        inner.epoch += 1;
        inner.session = Some(Session { identity, credential });
        true
    }

    /// Swap in a renewed credential for the session of `epoch`.
    ///
    /// Returns `false` (and stores nothing) when there is no session to renew
    /// or it was replaced since.
    pub fn renew_if(&self, epoch: u64, credential: Credential) -> bool {
        let mut inner = self.inner.write();
        if inner.epoch != epoch {
            return false;
        }
        match inner.session.as_mut() {
            Some(session) => {
                session.credential = credential;
                true
            }
            None => false,
        }
    }

    /// Clear the session. Returns the session that was removed, if any.
    pub fn clear(&self) -> Option<Session> {
        let mut inner = self.inner.write();
        inner.epoch += 1;
        inner.session.take()
    }

    /// [`clear`](Self::clear), only if nothing was written since `epoch`.
    pub fn clear_if(&self, epoch: u64) -> Option<Session> {
        let mut inner = self.inner.write();
        if inner.epoch != epoch {
            return None;
        }
        inner.epoch += 1;
        inner.session.take()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
