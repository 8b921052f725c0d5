use thiserror::Error;

use crate::store::gateway::StoreError;

/// Shared failure type for the data repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} not found: {1}")]
    NotFound(String, String),
}
