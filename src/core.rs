//! Word type and hash glue shared by the table, header and work modules.
use primitive_types::U256;
use sha3::{Digest, Keccak256};

/// 256-bit unsigned word with wrapping arithmetic.
pub type FixedWord = U256;

/// Width of a [`FixedWord`] in bytes.
pub const WORD_BYTES: usize = 32;

/// Keccak-256 over the concatenation of `parts`.
pub fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash `parts` and read the digest as a big-endian word.
pub fn hash_to_word(parts: &[&[u8]]) -> FixedWord {
    FixedWord::from_big_endian(&keccak256(parts))
}

/// Render a word as `0x` followed by exactly 64 hex digits.
pub fn word_to_hex(word: &FixedWord) -> String {
    format!("0x{}", hex::encode(word.to_big_endian()))
}

/// `(2^256 - 1) >> shift`; the usual way to express a target by difficulty bits.
pub fn target_from_shift(shift: u32) -> FixedWord {
    FixedWord::MAX >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn split_input_hashes_like_contiguous() {
        let split = keccak256(&[b"This is ".as_slice(), b"the seed.".as_slice()]);
        assert_eq!(split, keccak256(&[b"This is the seed.".as_slice()]));
    }

    #[test]
    fn hex_is_fixed_width() {
        let hex = word_to_hex(&FixedWord::from(0xabu64));
        assert_eq!(hex.len(), 66);
        assert!(hex.starts_with("0x"));
        assert!(hex.ends_with("00ab"));
    }

    #[test]
    fn target_shift_clears_high_bits() {
        let target = target_from_shift(20);
        assert_eq!(target.leading_zeros(), 20);
        assert_eq!(target + FixedWord::one(), FixedWord::one() << 236u32);
        assert_eq!(target_from_shift(0), FixedWord::MAX);
    }
}
