// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Once-per-process guard for the session bootstrap sequence.
///
/// The first caller of [`try_claim`](Self::try_claim) runs the sequence;
/// everyone else waits on the loading flag.
pub struct BootstrapGate {
    claimed: AtomicBool,
    done: watch::Sender<bool>,
}

impl Default for BootstrapGate {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapGate {
    pub fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self { claimed: AtomicBool::new(false), done }
    }

    /// Claim the right to run the bootstrap. True exactly once.
    pub fn try_claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    /// True until the bootstrap has completed once.
    pub fn is_bootstrapping(&self) -> bool {
        !*self.done.borrow()
    }

    /// Drop the loading flag when the returned guard goes out of scope.
    pub fn finish_on_drop(&self) -> FinishGuard<'_> {
        FinishGuard { gate: self }
    }

    /// Wait until the bootstrap has completed.
    pub async fn wait(&self) {
        let mut rx = self.done.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }
}

/// Marks the bootstrap finished on drop, whether the sequence succeeded,
/// failed, or was abandoned midway.
pub struct FinishGuard<'a> {
    gate: &'a BootstrapGate,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.gate.done.send_replace(true);
    }
}
