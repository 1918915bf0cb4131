//! Error types for store loading, querying, and building.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store was built for a different API version and must be rebuilt.
    #[error("incompatible store format: API version {found}, engine expects {expected}")]
    IncompatibleFormat { found: u32, expected: u32 },

    #[error("{what}: size mismatch (expected {expected} bytes, found {actual})")]
    SizeMismatch {
        what: &'static str,
        expected: u64,
        actual: u64,
    },

    /// Structural violation detected while probing or decoding.
    #[error("corrupt store: {0}")]
    CorruptStore(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Rejected by the store writer.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        StoreError::CorruptStore(msg.into())
    }

    /// True for structural damage found in an already-open store.
    ///
    /// Such errors fail the one query that hit them; the engine stays usable.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::CorruptStore(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
