//! Wire envelope of the Graph `$batch` endpoint.
//!
//! The request list is always serialized as a JSON array, including when it
//! holds a single sub-request.

use domain::models::{BatchRequest, BatchResponse};
use serde::{Deserialize, Serialize};

/// `{"requests": [...]}`
#[derive(Debug, Serialize)]
pub struct BatchRequestEnvelope<'a> {
    pub requests: &'a [BatchRequest],
}

/// `{"responses": [...]}`
#[derive(Debug, Deserialize)]
pub struct BatchResponseEnvelope {
    #[serde(default)]
    pub responses: Vec<BatchResponse>,
}
