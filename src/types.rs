use crate::core::{word_to_hex, FixedWord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A nonce and the work result it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proof {
    pub nonce: FixedWord,
    pub result: FixedWord,
}

impl Proof {
    /// Nonce in decimal.
    pub fn nonce_decimal(&self) -> String {
        self.nonce.to_string()
    }

    /// Result as fixed-width `0x` hex.
    pub fn result_hex(&self) -> String {
        word_to_hex(&self.result)
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce: {}\nProof: {}", self.nonce_decimal(), self.result_hex())
    }
}

/// Execution summary of one search run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchStats {
    pub evaluations: u64,
    pub elapsed_ms: u128,
    pub threads: usize,
}

impl SearchStats {
    pub fn evaluations_per_second(&self) -> f64 {
        if self.elapsed_ms == 0 {
            return 0.0;
        }
        self.evaluations as f64 * 1000.0 / self.elapsed_ms as f64
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub proof: Proof,
    pub stats: SearchStats,
}
