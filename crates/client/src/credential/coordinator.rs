// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight access token renewal.
//!
//! However many callers ask for a renewed credential at once, exactly one
//! `POST /auth/refresh/` is issued and its outcome is handed to all of them.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::credential::{TokenResponse, REFRESH_PATH};
use crate::error::AuthError;
use crate::state::{Credential, Session, SessionState};
use crate::transport::{ApiRequest, Transport};

type Waiter = oneshot::Sender<Result<Credential, AuthError>>;

/// The renewal currently in flight and everyone waiting on it.
struct InFlight {
    generation: u64,
    /// Session epoch when the renewal started.
    epoch: u64,
    waiters: Vec<Waiter>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    in_flight: Option<InFlight>,
}

/// Coalesces concurrent renewal requests into one network call.
///
/// The slot lock is synchronous and never held across an `.await`, so the
/// check for an in-flight renewal and the claim of the slot are one step.
/// Lock order is slot, then session.
pub struct RenewalCoordinator<T: Transport> {
    transport: Arc<T>,
    state: Arc<SessionState>,
    slot: Mutex<Slot>,
}

impl<T: Transport> RenewalCoordinator<T> {
    pub fn new(transport: Arc<T>, state: Arc<SessionState>) -> Arc<Self> {
        Arc::new(Self { transport, state, slot: Mutex::new(Slot::default()) })
    }

    /// Whether a renewal call is outstanding.
    pub fn in_flight(&self) -> bool {
        self.slot.lock().in_flight.is_some()
    }

    /// Number of callers waiting on the outstanding renewal (the initiator included).
    pub fn waiting(&self) -> usize {
        self.slot.lock().in_flight.as_ref().map_or(0, |f| f.waiters.len())
    }

    /// Obtain a renewed access credential, joining an in-flight renewal if
    /// there is one.
    ///
    /// The network call runs in its own task, so dropping this future never
    /// leaves the slot occupied.
    pub async fn acquire(self: &Arc<Self>) -> Result<Credential, AuthError> {
        let (tx, rx) = oneshot::channel();
        let started = {
            let mut slot = self.slot.lock();
            match slot.in_flight.as_mut() {
                Some(flight) => {
                    flight.waiters.push(tx);
                    debug!(waiters = flight.waiters.len(), "renewal in flight, queued");
                    None
                }
                None => {
                    slot.generation += 1;
                    let generation = slot.generation;
                    let epoch = self.state.epoch();
                    slot.in_flight = Some(InFlight { generation, epoch, waiters: vec![tx] });
                    Some(generation)
                }
            }
        };

        if let Some(generation) = started {
            debug!(generation, "starting credential renewal");
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let outcome = this.request_renewal().await;
                this.settle(generation, outcome);
            });
        }

        rx.await.unwrap_or(Err(AuthError::SessionExpired))
    }

    /// Drain every waiter with `reason` and free the slot.
    ///
    /// A renewal still on the wire when this runs has its result discarded.
    /// Returns the number of waiters rejected.
    pub fn reset(&self, reason: AuthError) -> usize {
        let waiters = self.slot.lock().in_flight.take().map(|f| f.waiters).unwrap_or_default();
        reject_all(waiters, &reason)
    }

    /// Local session teardown: reject waiters with `SessionExpired`, free the
    /// slot, and clear the session in one critical section.
    ///
    /// Returns the number of waiters rejected and the session that was cleared.
    pub fn teardown(&self) -> (usize, Option<Session>) {
        let (waiters, previous) = {
            let mut slot = self.slot.lock();
            let waiters = slot.in_flight.take().map(|f| f.waiters).unwrap_or_default();
            (waiters, self.state.clear())
        };
        (reject_all(waiters, &AuthError::SessionExpired), previous)
    }

    async fn request_renewal(&self) -> Result<Credential, AuthError> {
        let resp = self
            .transport
            .send(&ApiRequest::post(REFRESH_PATH))
            .await
            .map_err(|e| AuthError::RenewalFailed(e.to_string()))?;
        if !resp.is_success() {
            return Err(AuthError::RenewalFailed(format!("refresh returned {}", resp.status)));
        }
        let token: TokenResponse =
            resp.json().map_err(|e| AuthError::RenewalFailed(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(AuthError::RenewalFailed("refresh returned an empty token".to_owned()));
        }
        Ok(Credential::new(token.access_token))
    }

    fn settle(&self, generation: u64, outcome: Result<Credential, AuthError>) {
        let mut slot = self.slot.lock();
        let epoch = match slot.in_flight.as_ref() {
            Some(flight) if flight.generation == generation => flight.epoch,
            _ => {
                debug!(generation, "renewal settled after teardown, discarding result");
                return;
            }
        };

        match outcome {
            Ok(credential) => {
                // Session first, so anyone woken below already sees the new credential.
                // A session established after this renewal started is left alone.
                let renewed = self.state.renew_if(epoch, credential.clone());
                let waiters = slot.in_flight.take().map(|f| f.waiters).unwrap_or_default();
                drop(slot);
                debug!(generation, waiters = waiters.len(), renewed, "credential renewed");
                for waiter in waiters {
                    let _ = waiter.send(Ok(credential.clone()));
                }
            }
            Err(reason) => {
                let waiters = slot.in_flight.take().map(|f| f.waiters).unwrap_or_default();
                let had_session = self.state.clear_if(epoch).is_some();
                drop(slot);
                warn!(generation, err = %reason, "credential renewal failed");
                let count = reject_all(waiters, &reason);
                if had_session {
                    info!(waiters = count, "session torn down after failed renewal");
                }
            }
        }
    }
}

fn reject_all(waiters: Vec<Waiter>, reason: &AuthError) -> usize {
    let count = waiters.len();
    for waiter in waiters {
        let _ = waiter.send(Err(reason.clone()));
    }
    count
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
