use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("content normalized to zero bytes")]
    EmptyContent,

    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("card with hash {hash} already exists")]
    HashConflict { hash: String },

    #[error("page {page_number} is out of range (total pages: {total_pages})")]
    PageOutOfRange { page_number: u64, total_pages: u64 },

    #[error("no stronger algorithm available above {0}")]
    NoStrongerAlgorithm(String),

    #[error("upgrade from {from} to {to} did not strengthen the digest")]
    UpgradeFailed { from: String, to: String },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage engine failure: {0}")]
    EngineFailure(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
