//! The memory-hard work function.
//!
//! Five coefficients are taken from the nonce (`nonce mod p_j + 1`). For each
//! of ten fold primes the commitment residue `x = commitment mod p_k` is pushed
//! through the degree-4 polynomial with those coefficients, and the value,
//! reduced by the table's index modulus, picks a word that is XORed into the
//! result. Ten data-dependent table reads per evaluation.
use crate::core::FixedWord;
use crate::table::WordTable;

/// Number of folding rounds (one per prime).
pub const FOLD_ROUNDS: usize = 10;

/// Number of polynomial coefficients (degree 4).
pub const COEFFICIENTS: usize = 5;

/// Fold primes, largest first. The first [`COEFFICIENTS`] of them also reduce
/// the nonce into coefficients.
pub const FOLD_PRIMES: [u64; FOLD_ROUNDS] = [
    0xfffd, 0xfffb, 0xfff7, 0xfff1, 0xffef, 0xffe5, 0xffdf, 0xffd9, 0xffd3, 0xffd1,
];

/// Prime moduli lifted to words once, so the hot loop never converts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkParams {
    primes: [FixedWord; FOLD_ROUNDS],
}

impl WorkParams {
    pub fn new(primes: [u64; FOLD_ROUNDS]) -> Self {
        Self {
            primes: primes.map(FixedWord::from),
        }
    }

    pub fn primes(&self) -> &[FixedWord; FOLD_ROUNDS] {
        &self.primes
    }

    /// `coeff[j] = (nonce mod p_j) + 1` for the first five primes.
    pub fn coefficients(&self, nonce: &FixedWord) -> [FixedWord; COEFFICIENTS] {
        let mut coeffs = [FixedWord::zero(); COEFFICIENTS];
        for (coeff, prime) in coeffs.iter_mut().zip(&self.primes) {
            *coeff = (*nonce % *prime).overflowing_add(FixedWord::one()).0;
        }
        coeffs
    }
}

impl Default for WorkParams {
    fn default() -> Self {
        Self::new(FOLD_PRIMES)
    }
}

/// Work function bound to one commitment.
///
/// `commitment mod p_k` does not depend on the nonce, so the residues are
/// computed once here instead of on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluator {
    commitment: FixedWord,
    params: WorkParams,
    residues: [FixedWord; FOLD_ROUNDS],
}

impl Evaluator {
    pub fn new(commitment: FixedWord, params: WorkParams) -> Self {
        let residues = params.primes.map(|prime| commitment % prime);
        Self {
            commitment,
            params,
            residues,
        }
    }

    pub fn commitment(&self) -> &FixedWord {
        &self.commitment
    }

    pub fn params(&self) -> &WorkParams {
        &self.params
    }

    /// Table indices selected for `nonce`, in fold order.
    pub fn indices(&self, nonce: &FixedWord, table: &WordTable) -> [usize; FOLD_ROUNDS] {
        let coeffs = self.params.coefficients(nonce);
        let modulus = table.index_modulus();
        self.residues.map(|x| fold_index(&x, &coeffs, &modulus))
    }

    /// Fold the ten selected words into the commitment.
    pub fn evaluate(&self, nonce: &FixedWord, table: &WordTable) -> FixedWord {
        let words = table.words();
        self.indices(nonce, table)
            .into_iter()
            .fold(self.commitment, |acc, index| acc ^ words[index])
    }
}

/// Horner evaluation of the coefficient polynomial at `x`, reduced by `modulus`.
///
/// Arithmetic wraps at 256 bits; the result is always `< modulus`.
fn fold_index(
    x: &FixedWord,
    coeffs: &[FixedWord; COEFFICIENTS],
    modulus: &FixedWord,
) -> usize {
    let mut v = coeffs[COEFFICIENTS - 1];
    for coeff in coeffs[..COEFFICIENTS - 1].iter().rev() {
        v = v.overflowing_mul(*x).0.overflowing_add(*coeff).0;
    }
    (v % *modulus).low_u64() as usize
}

/// Evaluate the work function for `(commitment, nonce)` over `table`.
///
/// Equivalent to `Evaluator::new(commitment, WorkParams::default()).evaluate(..)`;
/// prefer an [`Evaluator`] when evaluating many nonces for one commitment.
pub fn evaluate(commitment: FixedWord, nonce: FixedWord, table: &WordTable) -> FixedWord {
    Evaluator::new(commitment, WorkParams::default()).evaluate(&nonce, table)
}

/// The ten table indices `evaluate` would read for `(commitment, nonce)`.
pub fn fold_indices(
    commitment: FixedWord,
    nonce: FixedWord,
    table: &WordTable,
) -> [usize; FOLD_ROUNDS] {
    Evaluator::new(commitment, WorkParams::default()).indices(&nonce, table)
}
