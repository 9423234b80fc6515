//! Indexer error types.

use thiserror::Error;

/// Errors raised while indexing a workspace.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Pattern compilation or traversal failure.
    #[error("indexing error: {0}")]
    Error(String),
}
