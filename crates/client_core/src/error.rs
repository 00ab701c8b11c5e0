use reqwest::StatusCode;
use thiserror::Error;

/// User-triggered operations of the form workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadNextBatch,
    SubmitAnswers,
    GenerateArtifact,
    GenerateDocument,
    Restart,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::LoadNextBatch => "load_next_batch",
            Operation::SubmitAnswers => "submit_answers",
            Operation::GenerateArtifact => "generate_artifact",
            Operation::GenerateDocument => "generate_document",
            Operation::Restart => "restart",
        }
    }

    /// Status text shown when the operation fails, whatever the cause.
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::LoadNextBatch => "Error loading questions",
            Operation::SubmitAnswers => "Error submitting answers",
            Operation::GenerateArtifact => "Error generating JSON",
            Operation::GenerateDocument => "Error downloading document",
            Operation::Restart => "Error restarting form",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid service url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service answered {status} for {route}")]
    Status {
        route: &'static str,
        status: StatusCode,
    },
    #[error("malformed response from {route}: {source}")]
    Decode {
        route: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response body from {route}")]
    EmptyBody { route: &'static str },
    #[error("service reported an error for {route}: {message}")]
    Service { route: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{in_flight} is still in flight")]
    Busy { in_flight: Operation },
    #[error("{operation} failed: {source}")]
    RequestFailed {
        operation: Operation,
        #[source]
        source: TransportError,
    },
    #[error("question batch has {questions} questions but {variables} variables")]
    BatchShapeMismatch { questions: usize, variables: usize },
    #[error("document rendering failed: {source}")]
    RenderFailed {
        #[source]
        source: TransportError,
    },
    #[error("document retrieval failed: {source}")]
    RetrieveFailed {
        #[source]
        source: TransportError,
    },
    #[error("document delivery failed: {source}")]
    DeliveryFailed { source: anyhow::Error },
}

impl WorkflowError {
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowError::Busy { .. })
    }

    /// True when the batch load failed, including the load chained after an
    /// accepted submit or restart. The server cursor may already have moved,
    /// so the only safe follow-up is another load.
    pub fn needs_reload(&self) -> bool {
        matches!(
            self,
            WorkflowError::RequestFailed {
                operation: Operation::LoadNextBatch,
                ..
            } | WorkflowError::BatchShapeMismatch { .. }
        )
    }
}
