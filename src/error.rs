use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("claimed result does not match recomputed work")]
    ResultMismatch,
    #[error("proof result exceeds target")]
    AboveTarget,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("failed to allocate word table of {words} words")]
    Allocation { words: usize },
    #[error("search cancelled before a proof was found")]
    Cancelled,
    #[error("nonce space exhausted before a proof was found")]
    NonceSpaceExhausted,
    #[error("search worker panicked")]
    WorkerPanicked,
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Json(#[from] serde_json::Error),
}
