//! Indexer type definitions.

use thiserror::Error;

use crate::config::MatcherError;

#[derive(Error, Debug)]
pub enum IndexerError {
    /// Catalog patterns could not be compiled
    #[error("Invalid file patterns: {0}")]
    Matcher(#[from] MatcherError),
    /// The workspace path is not usable
    #[error("Invalid workspace path: {0}")]
    InvalidPath(String),
    /// A background parse task panicked or was cancelled
    #[error("Indexing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
