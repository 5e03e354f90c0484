//! Seeded word table: the memory the work function folds over.
//!
//! Entry `i` is `keccak256(seed_be || be32(i))` read as a big-endian word, so
//! every entry depends only on the seed and its own index.
use crate::core::{hash_to_word, FixedWord, WORD_BYTES};
use crate::error::Error;

/// Memory budget of the default table (2 MiB).
pub const DEFAULT_TABLE_BYTES: usize = 2 << 20;

/// Number of words in the default table (2^16).
pub const DEFAULT_TABLE_WORDS: usize = DEFAULT_TABLE_BYTES / WORD_BYTES;

/// Seed phrase of the reference puzzle.
pub const DEFAULT_SEED: &str = "This is the seed.";

/// Derive the generator seed from a phrase.
pub fn seed_from_phrase(phrase: &[u8]) -> FixedWord {
    hash_to_word(&[phrase])
}

/// Compute the single table entry at `index`.
pub fn table_word(seed: &FixedWord, index: u64) -> FixedWord {
    let seed_be = seed.to_big_endian();
    let index_be = FixedWord::from(index).to_big_endian();
    hash_to_word(&[&seed_be[..], &index_be[..]])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTable {
    words: Vec<FixedWord>,
}

impl WordTable {
    /// Fill `count` words from `seed`.
    ///
    /// The whole table is reserved before hashing starts; a failed reservation
    /// is reported as [`Error::Allocation`] and nothing is kept.
    pub fn generate(seed: FixedWord, count: usize) -> Result<Self, Error> {
        if count < 2 {
            return Err(Error::InvalidConfig(
                "table must hold at least 2 words".into(),
            ));
        }
        let mut words = Vec::new();
        words
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation { words: count })?;

        let seed_be = seed.to_big_endian();
        for i in 0..count as u64 {
            let index_be = FixedWord::from(i).to_big_endian();
            words.push(hash_to_word(&[&seed_be[..], &index_be[..]]));
        }
        log::info!(
            target: "foldpow",
            "generated word table: {} words ({} KiB)",
            count,
            count * WORD_BYTES / 1024
        );
        Ok(Self { words })
    }

    /// Derive the seed from `phrase` and generate the table.
    pub fn from_phrase(phrase: &[u8], count: usize) -> Result<Self, Error> {
        Self::generate(seed_from_phrase(phrase), count)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FixedWord> {
        self.words.get(index)
    }

    pub fn words(&self) -> &[FixedWord] {
        &self.words
    }

    /// Modulus applied to folded indices: `len - 1`.
    ///
    /// With the default table this is `0xffff`, so the last word is never
    /// selected.
    pub fn index_modulus(&self) -> FixedWord {
        FixedWord::from(self.words.len() as u64 - 1)
    }
}
