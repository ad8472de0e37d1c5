//! Error type for Microsoft Graph operations.

use thiserror::Error;

/// Errors that can occur while talking to Microsoft Graph or the identity platform.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Microsoft Graph returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from Microsoft Graph: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Missing required permission scopes: {}", .0.join(", "))]
    MissingScopes(Vec<String>),

    #[error("Batch of {size} requests exceeds the Graph limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
}

impl From<shared::token::TokenError> for GraphError {
    fn from(err: shared::token::TokenError) -> Self {
        GraphError::Authentication(err.to_string())
    }
}
