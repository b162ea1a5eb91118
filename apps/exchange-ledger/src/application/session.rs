//! Ledger Session Boundary
//!
//! Every read-modify-write across the ledger's tables runs while holding a
//! [`LedgerSession`]. The interactive workflows and the periodic rollup share
//! one [`LedgerGate`], so their mutations never interleave. Read-only queries
//! and export snapshots do not take the gate.
//!
//! The gate also publishes an epoch that is odd while a session is open and
//! even otherwise. A reader that sees the same even epoch before and after
//! copying the tables has a copy no workflow was halfway through.

use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard, watch};

/// Mutual-exclusion boundary shared by every mutating path.
#[derive(Debug)]
pub struct LedgerGate {
    lock: Mutex<()>,
    epoch: watch::Sender<u64>,
}

impl Default for LedgerGate {
    fn default() -> Self {
        Self {
            lock: Mutex::new(()),
            epoch: watch::Sender::new(0),
        }
    }
}

impl LedgerGate {
    /// Create an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access.
    pub async fn begin(&self) -> LedgerSession<'_> {
        let guard = self.lock.lock().await;
        self.open(guard)
    }

    /// Exclusive access if nobody holds the gate right now.
    #[must_use]
    pub fn try_begin(&self) -> Option<LedgerSession<'_>> {
        self.lock.try_lock().ok().map(|guard| self.open(guard))
    }

    fn open<'a>(&'a self, guard: MutexGuard<'a, ()>) -> LedgerSession<'a> {
        self.epoch.send_modify(|epoch| *epoch += 1);
        LedgerSession {
            gate: self,
            _guard: guard,
            opened_at: Instant::now(),
        }
    }

    /// Current epoch; odd while a session is open.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        *self.epoch.borrow()
    }

    /// Wait until no session is open and return the epoch at that moment.
    pub async fn idle(&self) -> u64 {
        let mut epochs = self.epoch.subscribe();
        match epochs.wait_for(|epoch| epoch % 2 == 0).await {
            Ok(epoch) => *epoch,
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.epoch(),
        }
    }
}

/// Proof of exclusive access. Mutating ledger methods take `&LedgerSession`.
#[derive(Debug)]
pub struct LedgerSession<'a> {
    gate: &'a LedgerGate,
    _guard: MutexGuard<'a, ()>,
    opened_at: Instant,
}

impl LedgerSession<'_> {
    /// Milliseconds since the session was opened.
    #[must_use]
    pub fn elapsed_ms(&self) -> u128 {
        self.opened_at.elapsed().as_millis()
    }
}

impl Drop for LedgerSession<'_> {
    fn drop(&mut self) {
        // Runs before the guard field is released.
        self.gate.epoch.send_modify(|epoch| *epoch += 1);
    }
}
