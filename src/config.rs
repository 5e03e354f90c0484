//! JSON miner configuration.
//!
//! Every field is optional; an empty document describes the reference puzzle
//! (seed `"This is the seed."`, a 2^16-word table, solver `keccak("miner")`,
//! target `(2^256 - 1) >> 20`).
use crate::core::{target_from_shift, FixedWord};
use crate::engine::{default_threads, SearchEngine, SearchEngineBuilder, DEFAULT_START_NONCE};
use crate::error::Error;
use crate::header::PuzzleHeader;
use crate::table::{WordTable, DEFAULT_SEED, DEFAULT_TABLE_WORDS};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SOLVER_NAME: &str = "miner";
pub const DEFAULT_TARGET_SHIFT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    /// Explicit solver word; wins over `solver_name`.
    pub solver: Option<FixedWord>,
    pub solver_name: String,
    pub block_number: FixedWord,
    pub block_hash: FixedWord,
    /// Explicit target; wins over `target_shift`.
    pub target: Option<FixedWord>,
    pub target_shift: u32,
    pub height: FixedWord,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            solver: None,
            solver_name: DEFAULT_SOLVER_NAME.to_owned(),
            block_number: FixedWord::zero(),
            block_hash: FixedWord::zero(),
            target: None,
            target_shift: DEFAULT_TARGET_SHIFT,
            height: FixedWord::zero(),
        }
    }
}

impl HeaderConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.target.is_none() && self.target_shift > 255 {
            return Err(Error::InvalidConfig(format!(
                "target_shift must be <= 255, got {}",
                self.target_shift
            )));
        }
        Ok(())
    }

    pub fn to_header(&self) -> Result<PuzzleHeader, Error> {
        self.validate()?;
        let solver = self
            .solver
            .unwrap_or_else(|| PuzzleHeader::solver_from_name(self.solver_name.as_bytes()));
        let target = self
            .target
            .unwrap_or_else(|| target_from_shift(self.target_shift));
        Ok(PuzzleHeader::new(
            solver,
            self.block_number,
            self.block_hash,
            target,
            self.height,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MinerConfig {
    pub seed: String,
    pub table_words: usize,
    /// Worker count; `None` uses the available parallelism.
    pub threads: Option<usize>,
    /// First nonce to try; any 256-bit word, written as `0x` hex.
    pub start_nonce: FixedWord,
    pub header: HeaderConfig,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_owned(),
            table_words: DEFAULT_TABLE_WORDS,
            threads: None,
            start_nonce: FixedWord::from(DEFAULT_START_NONCE),
            header: HeaderConfig::default(),
        }
    }
}

impl MinerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.table_words < 2 {
            return Err(Error::InvalidConfig("table_words must be >= 2".into()));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        self.header.validate()
    }

    pub fn threads(&self) -> usize {
        self.threads.unwrap_or_else(default_threads)
    }

    /// Generate the word table described by `seed` and `table_words`.
    pub fn build_table(&self) -> Result<WordTable, Error> {
        WordTable::from_phrase(self.seed.as_bytes(), self.table_words)
    }

    pub fn build_header(&self) -> Result<PuzzleHeader, Error> {
        self.header.to_header()
    }

    pub fn build_engine(&self) -> Result<SearchEngine, Error> {
        SearchEngineBuilder::default()
            .threads(self.threads())
            .start_nonce(self.start_nonce)
            .build_validated()
    }
}
