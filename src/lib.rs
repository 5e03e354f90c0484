//! Memory-hard proof-of-work over a seeded word table.
//!
//! A puzzle header is committed to a single 256-bit word. For each candidate
//! nonce the work function derives five polynomial coefficients from the
//! nonce, evaluates the polynomial at ten prime residues of the commitment and
//! XOR-folds the ten selected table words into the commitment. A proof is a
//! nonce whose folded result is at or below the header's target.
//!
//! ```no_run
//! use foldpow::{PuzzleHeader, Puzzle, SearchEngineBuilder, WordTable};
//! use foldpow::{target_from_shift, DEFAULT_SEED, DEFAULT_TABLE_WORDS};
//! use std::sync::Arc;
//!
//! let table = WordTable::from_phrase(DEFAULT_SEED.as_bytes(), DEFAULT_TABLE_WORDS)?;
//! let header = PuzzleHeader::new(
//!     PuzzleHeader::solver_from_name(b"miner"),
//!     0u64.into(),
//!     0u64.into(),
//!     target_from_shift(20),
//!     0u64.into(),
//! );
//! let puzzle = Puzzle::new(header, Arc::new(table));
//! let mut engine = SearchEngineBuilder::default().build_validated()?;
//! let outcome = engine.solve(&puzzle)?;
//! println!("{}", outcome.proof);
//! # Ok::<(), foldpow::Error>(())
//! ```
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod header;
pub mod stream;
pub mod table;
pub mod types;
pub mod work;

pub use crate::config::{HeaderConfig, MinerConfig};
pub use crate::core::{hash_to_word, keccak256, target_from_shift, word_to_hex, FixedWord};
pub use crate::engine::{Puzzle, SearchEngine, SearchEngineBuilder, DEFAULT_START_NONCE};
pub use crate::error::{Error, VerifyError};
pub use crate::header::{commit, PuzzleHeader, HEADER_BYTES};
pub use crate::stream::{BestProof, NonceSource, Offer, StopFlag};
pub use crate::table::{WordTable, DEFAULT_SEED, DEFAULT_TABLE_WORDS};
pub use crate::types::{Proof, SearchOutcome, SearchStats};
pub use crate::work::{evaluate, fold_indices, Evaluator, WorkParams, FOLD_PRIMES};
