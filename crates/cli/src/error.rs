use graph::GraphError;
use thiserror::Error;

/// Fatal errors of an inventory run.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}
