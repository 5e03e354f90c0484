//! Shared state for the worker pool: nonce issuance, early stop and the
//! best-proof cell.
use crate::core::FixedWord;
use crate::types::Proof;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Atomically distributed, monotonically increasing nonces.
///
/// Nonces are `base + offset` where only the offset is atomic, so any 256-bit
/// start value works and issuance never wraps back below `base`. Once
/// `base + offset` would pass `FixedWord::MAX` the source reports exhaustion.
#[derive(Debug)]
pub struct NonceSource {
    base: FixedWord,
    offset: AtomicU64,
    exhausted: AtomicBool,
}

impl NonceSource {
    pub const fn new(base: FixedWord) -> Self {
        Self {
            base,
            offset: AtomicU64::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Reserve and return the next nonce, or `None` past `FixedWord::MAX`.
    #[inline]
    pub fn fetch(&self) -> Option<FixedWord> {
        let offset = self.offset.fetch_add(1, Ordering::Relaxed);
        let nonce = self.base.checked_add(FixedWord::from(offset));
        if nonce.is_none() {
            self.exhausted.store(true, Ordering::SeqCst);
        }
        nonce
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct StopFlag {
    stop: AtomicBool,
}

impl StopFlag {
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn force_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Lower the flag again. Only for flags that outlive a single run.
    pub fn clear(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// What [`BestProof::offer`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// First qualifying proof of the run; the stop flag is now set.
    Accepted,
    /// Strictly smaller than the previous best and replaced it.
    Replaced,
    /// Not better than the current best.
    Discarded,
}

/// Single "current best" cell guarded by a mutex.
#[derive(Debug, Default)]
pub struct BestProof {
    best: Mutex<Option<Proof>>,
}

impl BestProof {
    pub const fn new() -> Self {
        Self {
            best: Mutex::new(None),
        }
    }

    /// Publish a qualifying candidate.
    ///
    /// The empty check and the comparison both happen under the lock, so two
    /// near-simultaneous finds always settle on the smaller result.
    pub fn offer(&self, candidate: Proof, stop: &StopFlag) -> Offer {
        let mut slot = self.best.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            None => {
                *slot = Some(candidate);
                stop.force_stop();
                Offer::Accepted
            }
            Some(current) if candidate.result < current.result => {
                *slot = Some(candidate);
                Offer::Replaced
            }
            Some(_) => Offer::Discarded,
        }
    }

    pub fn get(&self) -> Option<Proof> {
        *self.best.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_inner(self) -> Option<Proof> {
        self.best.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
