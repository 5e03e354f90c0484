//! Parallel nonce search.
//!
//! Workers share one [`NonceSource`], a run-local [`StopFlag`] and a
//! [`BestProof`] cell. The first qualifying result stops the run; results
//! published by workers that were already mid-evaluation may still replace it
//! if strictly smaller, so the reported proof is the minimum over everything
//! published.
use crate::core::{word_to_hex, FixedWord};
use crate::error::{Error, VerifyError};
use crate::header::PuzzleHeader;
use crate::stream::{BestProof, NonceSource, Offer, StopFlag};
use crate::table::WordTable;
use crate::types::{Proof, SearchOutcome, SearchStats};
use crate::work::{Evaluator, WorkParams};
use derive_builder::Builder;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// First nonce handed out by a fresh engine.
pub const DEFAULT_START_NONCE: u64 = 1;

/// Worker count used when none is configured.
pub fn default_threads() -> usize {
    thread::available_parallelism()
        .map(|nz| nz.get())
        .unwrap_or(1)
}

/// Everything a worker needs to evaluate and judge a nonce. Immutable.
#[derive(Debug, Clone)]
pub struct Puzzle {
    header: PuzzleHeader,
    evaluator: Evaluator,
    table: Arc<WordTable>,
}

impl Puzzle {
    pub fn new(header: PuzzleHeader, table: Arc<WordTable>) -> Self {
        Self::with_params(header, table, WorkParams::default())
    }

    pub fn with_params(header: PuzzleHeader, table: Arc<WordTable>, params: WorkParams) -> Self {
        let evaluator = Evaluator::new(header.commit(), params);
        Self {
            header,
            evaluator,
            table,
        }
    }

    pub fn header(&self) -> &PuzzleHeader {
        &self.header
    }

    pub fn commitment(&self) -> &FixedWord {
        self.evaluator.commitment()
    }

    pub fn target(&self) -> &FixedWord {
        &self.header.target
    }

    pub fn table(&self) -> &Arc<WordTable> {
        &self.table
    }

    #[inline]
    pub fn evaluate(&self, nonce: &FixedWord) -> FixedWord {
        self.evaluator.evaluate(nonce, &self.table)
    }

    /// Recompute the work for `proof.nonce` and check it against the claim and
    /// the target.
    pub fn verify(&self, proof: &Proof) -> Result<(), VerifyError> {
        let result = self.evaluate(&proof.nonce);
        if result != proof.result {
            return Err(VerifyError::ResultMismatch);
        }
        if result > *self.target() {
            return Err(VerifyError::AboveTarget);
        }
        Ok(())
    }
}

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct SearchEngine {
    #[builder(default = "default_threads()")]
    pub threads: usize,
    #[builder(default = "FixedWord::from(DEFAULT_START_NONCE)")]
    pub start_nonce: FixedWord,
    /// Evaluations performed by the current run. Reset when `solve` starts.
    #[builder(default = "Arc::new(AtomicU64::new(0))")]
    pub progress: Arc<AtomicU64>,
    /// Raise to abandon a run from outside; checked before every evaluation.
    /// `solve` lowers it again once its workers have drained.
    #[builder(default = "Arc::new(StopFlag::new())")]
    pub cancel: Arc<StopFlag>,
}

impl SearchEngine {
    fn validate(&self) -> Result<(), Error> {
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        Ok(())
    }

    /// Search until some worker finds `result <= target`, then report the best
    /// proof published by the pool.
    ///
    /// There is no timeout. Returns [`Error::Cancelled`] if `cancel` was raised
    /// before any proof was accepted, and [`Error::NonceSpaceExhausted`] if
    /// every nonce from `start_nonce` up to `FixedWord::MAX` was tried.
    ///
    /// Takes `&mut self` because `progress` and `cancel` belong to one run at
    /// a time. Engines that share those `Arc`s must not solve concurrently.
    pub fn solve(&mut self, puzzle: &Puzzle) -> Result<SearchOutcome, Error> {
        self.validate()?;
        self.progress.store(0, Ordering::SeqCst);

        let nonces = Arc::new(NonceSource::new(self.start_nonce));
        let stop = Arc::new(StopFlag::new());
        let best = Arc::new(BestProof::new());

        log::info!(
            target: "foldpow",
            "search started: threads={}, start_nonce={}, target={}",
            self.threads,
            self.start_nonce,
            word_to_hex(puzzle.target())
        );
        let started = Instant::now();

        let mut joins = Vec::with_capacity(self.threads);
        for _ in 0..self.threads {
            let worker_puzzle = puzzle.clone();
            let worker_nonces = nonces.clone();
            let worker_stop = stop.clone();
            let worker_cancel = self.cancel.clone();
            let worker_best = best.clone();
            let worker_progress = self.progress.clone();
            let join = thread::spawn(move || {
                worker_loop(
                    worker_puzzle,
                    worker_nonces,
                    worker_stop,
                    worker_cancel,
                    worker_best,
                    worker_progress,
                );
            });
            joins.push(join);
        }

        let panicked = join_handles(joins);
        self.cancel.clear();
        let stats = SearchStats {
            evaluations: self.progress.load(Ordering::SeqCst),
            elapsed_ms: started.elapsed().as_millis(),
            threads: self.threads,
        };
        if panicked {
            return Err(Error::WorkerPanicked);
        }

        match best.get() {
            Some(proof) => {
                log::info!(
                    target: "foldpow",
                    "search finished: nonce={}, evaluations={}, elapsed_ms={}",
                    proof.nonce,
                    stats.evaluations,
                    stats.elapsed_ms
                );
                Ok(SearchOutcome { proof, stats })
            }
            None if nonces.is_exhausted() => {
                log::info!(
                    target: "foldpow",
                    "nonce space exhausted after {} evaluations",
                    stats.evaluations
                );
                Err(Error::NonceSpaceExhausted)
            }
            None => {
                log::info!(
                    target: "foldpow",
                    "search cancelled after {} evaluations",
                    stats.evaluations
                );
                Err(Error::Cancelled)
            }
        }
    }
}

impl SearchEngineBuilder {
    fn validate(&self) -> Result<(), Error> {
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig("threads must be >= 1".into()));
        }
        Ok(())
    }

    pub fn build_validated(self) -> Result<SearchEngine, Error> {
        self.validate()?;
        self.build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Raises the run's stop flag if the owning worker unwinds, so the rest of the
/// pool exits and `solve` can report the panic.
struct StopOnPanic<'a>(&'a StopFlag);

impl Drop for StopOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.force_stop();
        }
    }
}

fn worker_loop(
    puzzle: Puzzle,
    nonces: Arc<NonceSource>,
    stop: Arc<StopFlag>,
    cancel: Arc<StopFlag>,
    best: Arc<BestProof>,
    progress: Arc<AtomicU64>,
) {
    let _guard = StopOnPanic(&stop);
    let target = *puzzle.target();
    while !stop.should_stop() && !cancel.should_stop() {
        let Some(nonce) = nonces.fetch() else {
            break;
        };
        let result = puzzle.evaluate(&nonce);
        progress.fetch_add(1, Ordering::Relaxed);
        if result > target {
            continue;
        }
        match best.offer(Proof { nonce, result }, &stop) {
            Offer::Accepted => {
                log::debug!(target: "foldpow", "proof accepted: nonce={nonce}");
            }
            Offer::Replaced => {
                log::debug!(target: "foldpow", "proof replaced by smaller result: nonce={nonce}");
            }
            Offer::Discarded => {
                log::debug!(target: "foldpow", "candidate discarded: nonce={nonce}");
            }
        }
    }
}

/// Join every worker; returns whether any of them panicked.
fn join_handles(joins: Vec<thread::JoinHandle<()>>) -> bool {
    let mut panicked = false;
    for handle in joins {
        panicked |= handle.join().is_err();
    }
    panicked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target_from_shift;
    use crate::table::{DEFAULT_SEED, DEFAULT_TABLE_WORDS};

    fn header_with_target(target: FixedWord) -> PuzzleHeader {
        PuzzleHeader::new(
            PuzzleHeader::solver_from_name(b"miner"),
            FixedWord::zero(),
            FixedWord::zero(),
            target,
            FixedWord::zero(),
        )
    }

    fn small_puzzle(shift: u32) -> Puzzle {
        let table = WordTable::from_phrase(b"engine tests", 1024).expect("table");
        Puzzle::new(header_with_target(target_from_shift(shift)), Arc::new(table))
    }

    fn engine(threads: usize) -> SearchEngine {
        SearchEngineBuilder::default()
            .threads(threads)
            .build_validated()
            .expect("build engine")
    }

    #[test]
    fn trivial_target_returns_first_nonce() {
        let puzzle = small_puzzle(0);
        let outcome = engine(1).solve(&puzzle).expect("solve");
        assert_eq!(outcome.proof.nonce, FixedWord::from(DEFAULT_START_NONCE));
        assert_eq!(outcome.stats.evaluations, 1);
        puzzle.verify(&outcome.proof).expect("proof verifies");
    }

    #[test]
    fn single_thread_matches_linear_scan() {
        let puzzle = small_puzzle(6);
        let start = 100u64;
        let mut engine = SearchEngineBuilder::default()
            .threads(1)
            .start_nonce(FixedWord::from(start))
            .build_validated()
            .expect("build engine");
        let outcome = engine.solve(&puzzle).expect("solve");

        let expected = (start..)
            .map(FixedWord::from)
            .find(|nonce| puzzle.evaluate(nonce) <= *puzzle.target())
            .expect("some nonce qualifies");
        assert_eq!(outcome.proof.nonce, expected);
        assert_eq!(
            outcome.stats.evaluations,
            expected.low_u64() - start + 1
        );
    }

    #[test]
    fn search_continues_past_u64_nonces() {
        let table = WordTable::from_phrase(b"engine tests", 1024).expect("table");
        let last_u64 = FixedWord::from(u64::MAX);
        let crossed = FixedWord::one() << 64u32;
        let unsolvable = Puzzle::new(header_with_target(FixedWord::zero()), Arc::new(table));
        let target = unsolvable.evaluate(&crossed);
        let puzzle = Puzzle::new(header_with_target(target), unsolvable.table().clone());

        let mut engine = SearchEngineBuilder::default()
            .threads(1)
            .start_nonce(last_u64)
            .build_validated()
            .expect("build engine");
        let outcome = engine.solve(&puzzle).expect("solve");

        let expected = if puzzle.evaluate(&last_u64) <= target {
            last_u64
        } else {
            crossed
        };
        assert_eq!(outcome.proof.nonce, expected);
        assert!(outcome.proof.nonce >= last_u64);
        puzzle.verify(&outcome.proof).expect("proof verifies");
    }

    #[test]
    fn exhausted_nonce_space_is_reported() {
        let table = WordTable::from_phrase(b"engine tests", 1024).expect("table");
        let puzzle = Puzzle::new(header_with_target(FixedWord::zero()), Arc::new(table));
        let mut engine = SearchEngineBuilder::default()
            .threads(2)
            .start_nonce(FixedWord::MAX - FixedWord::from(3u64))
            .build_validated()
            .expect("build engine");
        let err = engine.solve(&puzzle).expect_err("no nonce qualifies");
        assert!(matches!(err, Error::NonceSpaceExhausted));
        assert_eq!(engine.progress.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn multi_thread_reports_minimum_of_published_candidates() {
        let puzzle = small_puzzle(5);
        let mut engine = engine(4);
        let outcome = engine.solve(&puzzle).expect("solve");
        puzzle.verify(&outcome.proof).expect("proof verifies");

        // Every evaluated nonce lies in [start, start + evaluations).
        let start = DEFAULT_START_NONCE;
        let end = start + outcome.stats.evaluations;
        let best = (start..end)
            .map(|n| puzzle.evaluate(&FixedWord::from(n)))
            .filter(|result| result <= puzzle.target())
            .min()
            .expect("at least one qualifying candidate");
        assert_eq!(outcome.proof.result, best);
        assert_eq!(outcome.stats.threads, 4);
    }

    #[test]
    fn progress_counts_evaluations() {
        let puzzle = small_puzzle(4);
        let mut engine = engine(2);
        let outcome = engine.solve(&puzzle).expect("solve");
        assert_eq!(engine.progress.load(Ordering::SeqCst), outcome.stats.evaluations);
        assert!(outcome.stats.evaluations >= 1);
    }

    #[test]
    fn cancelled_before_start_reports_cancelled() {
        let puzzle = small_puzzle(255);
        let mut engine = engine(2);
        engine.cancel.force_stop();
        let err = engine.solve(&puzzle).expect_err("should be cancelled");
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn cancelled_engine_can_run_again() {
        let mut engine = engine(2);
        engine.cancel.force_stop();
        let err = engine.solve(&small_puzzle(255)).expect_err("should be cancelled");
        assert!(matches!(err, Error::Cancelled));
        assert!(!engine.cancel.should_stop());

        let puzzle = small_puzzle(2);
        let outcome = engine.solve(&puzzle).expect("second run solves");
        puzzle.verify(&outcome.proof).expect("proof verifies");
        assert_eq!(engine.progress.load(Ordering::SeqCst), outcome.stats.evaluations);
    }

    #[test]
    fn cancel_from_another_thread_stops_unreachable_search() {
        let table = WordTable::from_phrase(b"engine tests", 1024).expect("table");
        let puzzle = Puzzle::new(header_with_target(FixedWord::zero()), Arc::new(table));
        let mut engine = engine(2);
        let cancel = engine.cancel.clone();
        let progress = engine.progress.clone();
        let canceller = thread::spawn(move || {
            while progress.load(Ordering::Relaxed) < 100 {
                thread::yield_now();
            }
            cancel.force_stop();
        });
        let err = engine.solve(&puzzle).expect_err("should be cancelled");
        canceller.join().expect("canceller");
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn builder_rejects_zero_threads() {
        let err = SearchEngineBuilder::default()
            .threads(0)
            .build_validated()
            .expect_err("zero threads");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn builder_defaults() {
        let engine = SearchEngineBuilder::default()
            .build_validated()
            .expect("defaults are valid");
        assert_eq!(engine.start_nonce, FixedWord::from(DEFAULT_START_NONCE));
        assert!(engine.threads >= 1);
        assert!(!engine.cancel.should_stop());
    }

    #[test]
    fn verify_rejects_tampered_proofs() {
        let puzzle = small_puzzle(3);
        let outcome = engine(1).solve(&puzzle).expect("solve");

        let mut wrong_result = outcome.proof;
        wrong_result.result = wrong_result.result ^ FixedWord::one();
        assert_eq!(puzzle.verify(&wrong_result), Err(VerifyError::ResultMismatch));

        let harder = Puzzle::new(
            header_with_target(FixedWord::zero()),
            puzzle.table().clone(),
        );
        let claimed = Proof {
            nonce: outcome.proof.nonce,
            result: harder.evaluate(&outcome.proof.nonce),
        };
        assert_eq!(harder.verify(&claimed), Err(VerifyError::AboveTarget));
    }

    fn reference_puzzle(shift: u32) -> Puzzle {
        let table = WordTable::from_phrase(DEFAULT_SEED.as_bytes(), DEFAULT_TABLE_WORDS)
            .expect("reference table");
        Puzzle::new(header_with_target(target_from_shift(shift)), Arc::new(table))
    }

    #[test]
    fn reference_puzzle_at_reduced_difficulty() {
        let puzzle = reference_puzzle(8);
        let outcome = engine(default_threads()).solve(&puzzle).expect("solve");
        let recomputed = crate::work::evaluate(*puzzle.commitment(), outcome.proof.nonce, puzzle.table());
        assert_eq!(recomputed, outcome.proof.result);
        assert!(recomputed <= target_from_shift(8));
    }

    #[test]
    #[ignore = "expects ~2^20 evaluations; run with --release --ignored"]
    fn reference_puzzle_full_difficulty() {
        let puzzle = reference_puzzle(20);
        let outcome = engine(default_threads()).solve(&puzzle).expect("solve");
        let recomputed = crate::work::evaluate(*puzzle.commitment(), outcome.proof.nonce, puzzle.table());
        assert_eq!(recomputed, outcome.proof.result);
        assert!(recomputed <= target_from_shift(20));
    }
}
