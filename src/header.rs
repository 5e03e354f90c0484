//! Puzzle header and its commitment hash.
use crate::core::{hash_to_word, FixedWord, WORD_BYTES};
use serde::{Deserialize, Serialize};

/// Number of words in a serialized header.
pub const HEADER_WORDS: usize = 5;

/// Exact serialized size of a [`PuzzleHeader`].
pub const HEADER_BYTES: usize = HEADER_WORDS * WORD_BYTES;

/// Fixed-layout puzzle the search commits to.
///
/// Field order is part of the commitment: reordering fields changes every
/// commitment and therefore every proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PuzzleHeader {
    pub solver: FixedWord,
    pub block_number: FixedWord,
    pub block_hash: FixedWord,
    pub target: FixedWord,
    pub height: FixedWord,
}

impl PuzzleHeader {
    pub fn new(
        solver: FixedWord,
        block_number: FixedWord,
        block_hash: FixedWord,
        target: FixedWord,
        height: FixedWord,
    ) -> Self {
        Self {
            solver,
            block_number,
            block_hash,
            target,
            height,
        }
    }

    /// Solver identity derived from a name, as `keccak256(name)`.
    pub fn solver_from_name(name: &[u8]) -> FixedWord {
        hash_to_word(&[name])
    }

    /// Serialize the five fields back to back.
    ///
    /// Each field is written in the arithmetic type's native little-endian word
    /// order, with no separators or length prefixes.
    pub fn to_bytes(&self) -> [u8; HEADER_BYTES] {
        let mut out = [0u8; HEADER_BYTES];
        let fields = [
            &self.solver,
            &self.block_number,
            &self.block_hash,
            &self.target,
            &self.height,
        ];
        for (chunk, field) in out.chunks_exact_mut(WORD_BYTES).zip(fields) {
            chunk.copy_from_slice(&field.to_little_endian());
        }
        out
    }

    /// Hash the serialized header into a single word.
    pub fn commit(&self) -> FixedWord {
        hash_to_word(&[&self.to_bytes()[..]])
    }
}

/// Free-function form of [`PuzzleHeader::commit`].
pub fn commit(header: &PuzzleHeader) -> FixedWord {
    header.commit()
}
