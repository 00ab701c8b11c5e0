//! Pure state transitions for the form workflow.

use shared::{domain::WorkflowPhase, protocol::QuestionBatch};

use crate::{error::Operation, state::WorkflowState};

pub const DOCUMENT_DELIVERED_STATUS: &str = "Document downloaded successfully!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Started(Operation),
    BatchLoaded(QuestionBatch),
    AnswerRecorded { key: String, value: String },
    /// Answers were stored; the next batch is fetched under the same busy span.
    AnswersAccepted,
    ArtifactGenerated { message: String },
    DocumentDelivered,
    /// Server cursor was reset; the first batch is fetched under the same busy span.
    RestartAccepted,
    Failed(Operation),
}

pub fn phase_for(batch: &QuestionBatch) -> WorkflowPhase {
    match (batch.is_empty(), batch.next) {
        (false, _) => WorkflowPhase::Collecting,
        (true, true) => WorkflowPhase::EmptyBatchPending,
        (true, false) => WorkflowPhase::Complete,
    }
}

pub fn reduce(mut state: WorkflowState, event: WorkflowEvent) -> WorkflowState {
    match event {
        WorkflowEvent::Started(operation) => {
            state.in_flight = Some(operation);
        }
        WorkflowEvent::BatchLoaded(batch) => {
            state.phase = phase_for(&batch);
            state.batch = batch;
            state.status.clear();
            state.in_flight = None;
        }
        WorkflowEvent::AnswerRecorded { key, value } => {
            state.answers.insert(key, value);
        }
        WorkflowEvent::AnswersAccepted => {
            state.answers.clear();
            state.in_flight = Some(Operation::LoadNextBatch);
        }
        WorkflowEvent::ArtifactGenerated { message } => {
            state.status = message;
            state.in_flight = None;
        }
        WorkflowEvent::DocumentDelivered => {
            state.status = DOCUMENT_DELIVERED_STATUS.to_string();
            state.in_flight = None;
        }
        WorkflowEvent::RestartAccepted => {
            state.answers.clear();
            state.batch = QuestionBatch::default();
            state.phase = WorkflowPhase::Collecting;
            state.status.clear();
            state.in_flight = Some(Operation::LoadNextBatch);
        }
        WorkflowEvent::Failed(operation) => {
            state.status = operation.failure_message().to_string();
            state.in_flight = None;
        }
    }
    state
}
