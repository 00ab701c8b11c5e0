use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Answers keyed by the variable name the service asked for.
pub type AnswerMap = HashMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    #[default]
    Collecting,
    /// The service returned no questions but says another batch follows.
    EmptyBatchPending,
    Complete,
}

impl WorkflowPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowPhase::Collecting => "collecting",
            WorkflowPhase::EmptyBatchPending => "empty_batch_pending",
            WorkflowPhase::Complete => "complete",
        }
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
