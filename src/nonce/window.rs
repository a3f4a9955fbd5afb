//! Sliding counter window and cross-off tracking.
//!
//! This is the single serialization point of the service: `latest`,
//! `earliest`, and the cross-off set answer every admission question, and
//! the authority mutates them only under its lock.

use std::collections::HashSet;

use crate::nonce::error::NonceError;

/// Outcome of checking a decoded counter against the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// In window, not previously redeemed; now crossed off.
    Valid,
    /// Below the window floor; too old to still be tracked for uniqueness.
    Expired,
    /// Already present in the cross-off set.
    AlreadyUsed,
    /// Above the highest counter ever issued by this window.
    NotYetIssued,
}

/// The range of possibly-valid counters and the set of redeemed ones.
///
/// `latest` is the highest counter ever issued; `earliest` the lowest still
/// eligible for redemption. Each issuance past the configured maximum slides
/// `earliest` forward and evicts cross-off entries that fall below it, so
/// memory stays bounded by the window size no matter how many nonces are
/// issued.
///
/// The struct is deliberately not thread-safe on its own; the authority owns
/// one instance behind a mutex and is the only caller.
#[derive(Debug)]
pub struct ReplayWindow {
    latest: u64,
    earliest: u64,
    max_window: u64,
    crossed_off: HashSet<u64>,
}

impl ReplayWindow {
    /// Creates a window starting at `seed` with maximum size `max_window`.
    ///
    /// The first counter issued is `seed + 1`.
    pub fn new(seed: u64, max_window: u64) -> Self {
        Self {
            latest: seed,
            earliest: seed,
            max_window,
            crossed_off: HashSet::new(),
        }
    }

    /// Issues the next counter.
    ///
    /// Increments `latest` and, once the window is full, advances `earliest`
    /// in lockstep, evicting the cross-off entry that slid out.
    ///
    /// # Errors
    ///
    /// Returns `NonceError::Exhausted` if the counter would wrap.
    pub fn advance(&mut self) -> Result<u64, NonceError> {
        self.latest = self.latest.checked_add(1).ok_or(NonceError::Exhausted)?;
        if self.latest - self.earliest > self.max_window {
            let stale = self.earliest;
            self.earliest += 1;
            self.crossed_off.remove(&stale);
        }
        Ok(self.latest)
    }

    /// Checks a counter for redeemability and crosses it off when valid.
    ///
    /// A counter present in the cross-off set can never be redeemed again;
    /// the already-used answer takes precedence over expiry for counters
    /// sitting exactly on the window floor.
    pub fn check_and_mark(&mut self, counter: u64) -> RedeemOutcome {
        if counter > self.latest {
            return RedeemOutcome::NotYetIssued;
        }
        if counter < self.earliest {
            return RedeemOutcome::Expired;
        }
        if self.crossed_off.contains(&counter) {
            return RedeemOutcome::AlreadyUsed;
        }
        self.crossed_off.insert(counter);
        RedeemOutcome::Valid
    }

    /// Number of counters currently crossed off.
    pub fn crossed_off_len(&self) -> usize {
        self.crossed_off.len()
    }

    #[cfg(test)]
    pub(crate) fn bounds(&self) -> (u64, u64) {
        (self.earliest, self.latest)
    }
}
