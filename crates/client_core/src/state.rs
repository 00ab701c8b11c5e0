use shared::{
    domain::{AnswerMap, WorkflowPhase},
    protocol::QuestionBatch,
};

use crate::error::Operation;

/// Everything the presentation layer renders. Owned by the controller and
/// handed out as snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowState {
    pub batch: QuestionBatch,
    pub answers: AnswerMap,
    pub phase: WorkflowPhase,
    /// Operation currently awaiting the service, if any.
    pub in_flight: Option<Operation>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingField<'a> {
    pub prompt: &'a str,
    pub key: &'a str,
    pub answer: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    SubmitAnswers,
    ReloadBatch,
    GenerateArtifact,
    GenerateDocument,
    ReviewDocument,
    Restart,
}

impl UserAction {
    pub fn label(self) -> &'static str {
        match self {
            UserAction::SubmitAnswers => "Next",
            UserAction::ReloadBatch => "Reload questions",
            UserAction::GenerateArtifact => "Generate JSON File",
            UserAction::GenerateDocument => "Generate Document",
            UserAction::ReviewDocument => "Review Document",
            UserAction::Restart => "Restart",
        }
    }

    pub fn operation(self) -> Operation {
        match self {
            UserAction::SubmitAnswers => Operation::SubmitAnswers,
            UserAction::ReloadBatch => Operation::LoadNextBatch,
            UserAction::GenerateArtifact => Operation::GenerateArtifact,
            UserAction::GenerateDocument | UserAction::ReviewDocument => Operation::GenerateDocument,
            UserAction::Restart => Operation::Restart,
        }
    }
}

const COLLECTING_ACTIONS: &[UserAction] = &[UserAction::SubmitAnswers];
const EMPTY_PENDING_ACTIONS: &[UserAction] = &[UserAction::SubmitAnswers, UserAction::ReloadBatch];
const COMPLETE_ACTIONS: &[UserAction] = &[
    UserAction::GenerateArtifact,
    UserAction::GenerateDocument,
    UserAction::ReviewDocument,
    UserAction::Restart,
];

impl WorkflowState {
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending_fields(&self) -> Vec<PendingField<'_>> {
        if self.phase == WorkflowPhase::Complete {
            return Vec::new();
        }
        self.batch
            .fields()
            .map(|(prompt, key)| PendingField {
                prompt,
                key,
                answer: self.answers.get(key).map(String::as_str),
            })
            .collect()
    }

    /// Actions worth offering in the current phase; nothing while busy.
    pub fn available_actions(&self) -> &'static [UserAction] {
        if self.is_busy() {
            return &[];
        }
        match self.phase {
            WorkflowPhase::Collecting => COLLECTING_ACTIONS,
            WorkflowPhase::EmptyBatchPending => EMPTY_PENDING_ACTIONS,
            WorkflowPhase::Complete => COMPLETE_ACTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collecting_state() -> WorkflowState {
        WorkflowState {
            batch: QuestionBatch::new(
                vec!["Project name?".into(), "Sponsor?".into()],
                vec!["project".into(), "sponsor".into()],
                true,
            ),
            ..WorkflowState::default()
        }
    }

    #[test]
    fn pending_fields_carry_current_answers() {
        let mut state = collecting_state();
        state.answers.insert("sponsor".into(), "Ministry".into());

        let fields = state.pending_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key, "project");
        assert_eq!(fields[0].answer, None);
        assert_eq!(fields[1].prompt, "Sponsor?");
        assert_eq!(fields[1].answer, Some("Ministry"));
    }

    #[test]
    fn complete_phase_hides_fields_and_offers_final_actions() {
        let mut state = collecting_state();
        state.phase = WorkflowPhase::Complete;
        assert!(state.pending_fields().is_empty());
        assert!(state.available_actions().contains(&UserAction::Restart));
        assert!(!state.available_actions().contains(&UserAction::SubmitAnswers));
    }

    #[test]
    fn busy_state_offers_nothing() {
        let mut state = collecting_state();
        state.in_flight = Some(Operation::SubmitAnswers);
        assert!(state.available_actions().is_empty());
    }

    #[test]
    fn review_runs_the_document_operation() {
        assert_eq!(
            UserAction::ReviewDocument.operation(),
            UserAction::GenerateDocument.operation()
        );
    }
}
