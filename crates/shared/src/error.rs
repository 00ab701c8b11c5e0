use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body the form service sends with a success status, e.g. when the
/// document is requested before it has been rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{error}")]
pub struct ServiceError {
    pub error: String,
}

impl ServiceError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
