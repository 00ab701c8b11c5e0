use std::sync::Arc;

use shared::domain::WorkflowPhase;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

pub mod delivery;
pub mod error;
pub mod reducer;
pub mod state;
pub mod transport;

pub use delivery::{DeliveredDocument, DocumentSink, FileDocumentSink, MissingDocumentSink};
pub use error::{Operation, TransportError, WorkflowError};
pub use reducer::{reduce, WorkflowEvent};
pub use state::{PendingField, UserAction, WorkflowState};
pub use transport::{FormService, HttpFormService};

const STATE_CHANNEL_CAPACITY: usize = 64;

/// Drives the question/answer/generation workflow against a [`FormService`].
///
/// Every public operation except [`WizardController::snapshot`] is rejected
/// with [`WorkflowError::Busy`] while another operation is awaiting the
/// service. The state lock is never held across a service call.
pub struct WizardController {
    service: Arc<dyn FormService>,
    sink: Arc<dyn DocumentSink>,
    state: Mutex<WorkflowState>,
    events: broadcast::Sender<WorkflowState>,
}

impl WizardController {
    pub fn new(service: Arc<dyn FormService>) -> Arc<Self> {
        Self::new_with_sink(service, Arc::new(MissingDocumentSink))
    }

    pub fn new_with_sink(
        service: Arc<dyn FormService>,
        sink: Arc<dyn DocumentSink>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        Arc::new(Self {
            service,
            sink,
            state: Mutex::new(WorkflowState::default()),
            events,
        })
    }

    pub async fn snapshot(&self) -> WorkflowState {
        self.state.lock().await.clone()
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowState> {
        self.events.subscribe()
    }

    fn commit(
        &self,
        guard: &mut MutexGuard<'_, WorkflowState>,
        event: WorkflowEvent,
    ) -> WorkflowState {
        let next = reduce(std::mem::take(&mut **guard), event);
        **guard = next.clone();
        let _ = self.events.send(next.clone());
        next
    }

    async fn apply(&self, event: WorkflowEvent) -> WorkflowState {
        let mut guard = self.state.lock().await;
        self.commit(&mut guard, event)
    }

    async fn begin(&self, operation: Operation) -> Result<WorkflowState, WorkflowError> {
        let mut guard = self.state.lock().await;
        if let Some(in_flight) = guard.in_flight {
            warn!(%operation, %in_flight, "rejected operation while busy");
            return Err(WorkflowError::Busy { in_flight });
        }
        debug!(%operation, "operation started");
        Ok(self.commit(&mut guard, WorkflowEvent::Started(operation)))
    }

    async fn fail(&self, operation: Operation, err: WorkflowError) -> WorkflowError {
        error!(%operation, error = %err, "workflow operation failed");
        self.apply(WorkflowEvent::Failed(operation)).await;
        err
    }

    pub async fn load_next_batch(&self) -> Result<WorkflowPhase, WorkflowError> {
        self.begin(Operation::LoadNextBatch).await?;
        self.fetch_batch().await
    }

    /// Runs under a busy span already opened by the caller.
    async fn fetch_batch(&self) -> Result<WorkflowPhase, WorkflowError> {
        let operation = Operation::LoadNextBatch;
        let batch = match self.service.fetch_questions().await {
            Ok(batch) => batch,
            Err(source) => {
                return Err(self
                    .fail(operation, WorkflowError::RequestFailed { operation, source })
                    .await)
            }
        };

        if !batch.is_well_formed() {
            let err = WorkflowError::BatchShapeMismatch {
                questions: batch.questions.len(),
                variables: batch.variables.len(),
            };
            return Err(self.fail(operation, err).await);
        }

        let questions = batch.questions.len();
        let more = batch.next;
        let state = self.apply(WorkflowEvent::BatchLoaded(batch)).await;
        info!(questions, more, phase = %state.phase, "question batch loaded");
        if state.phase == WorkflowPhase::EmptyBatchPending {
            warn!("service returned an empty batch but reports more to come");
        }
        Ok(state.phase)
    }

    pub async fn set_answer(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let mut guard = self.state.lock().await;
        if let Some(in_flight) = guard.in_flight {
            return Err(WorkflowError::Busy { in_flight });
        }
        self.commit(
            &mut guard,
            WorkflowEvent::AnswerRecorded {
                key: key.into(),
                value: value.into(),
            },
        );
        Ok(())
    }

    /// Sends every collected answer; on success the answers are dropped and
    /// the next batch is loaded before the operation returns.
    pub async fn submit_answers(&self) -> Result<WorkflowPhase, WorkflowError> {
        let operation = Operation::SubmitAnswers;
        let snapshot = self.begin(operation).await?;

        match self.service.submit_answers(&snapshot.answers).await {
            Ok(message) => {
                info!(
                    answers = snapshot.answers.len(),
                    ack = message.as_deref().unwrap_or(""),
                    "answers submitted"
                );
                self.apply(WorkflowEvent::AnswersAccepted).await;
                self.fetch_batch().await
            }
            Err(source) => Err(self
                .fail(operation, WorkflowError::RequestFailed { operation, source })
                .await),
        }
    }

    /// Asks the service to write the structured-data artifact and returns its
    /// message, which also becomes the status.
    pub async fn generate_artifact(&self) -> Result<String, WorkflowError> {
        let operation = Operation::GenerateArtifact;
        self.begin(operation).await?;

        match self.service.generate_json().await {
            Ok(message) => {
                info!(response = %message, "artifact generated");
                self.apply(WorkflowEvent::ArtifactGenerated {
                    message: message.clone(),
                })
                .await;
                Ok(message)
            }
            Err(source) => Err(self
                .fail(operation, WorkflowError::RequestFailed { operation, source })
                .await),
        }
    }

    /// Renders the document server-side, downloads it and hands it to the
    /// configured sink. Each step has its own error variant; the status text
    /// is the same for all of them.
    pub async fn generate_document(&self) -> Result<DeliveredDocument, WorkflowError> {
        let operation = Operation::GenerateDocument;
        self.begin(operation).await?;

        if let Err(source) = self.service.render_document().await {
            return Err(self
                .fail(operation, WorkflowError::RenderFailed { source })
                .await);
        }

        let bytes = match self.service.download_document().await {
            Ok(bytes) => bytes,
            Err(source) => {
                return Err(self
                    .fail(operation, WorkflowError::RetrieveFailed { source })
                    .await)
            }
        };

        let delivered = match self.sink.deliver(bytes).await {
            Ok(delivered) => delivered,
            Err(source) => {
                return Err(self
                    .fail(operation, WorkflowError::DeliveryFailed { source })
                    .await)
            }
        };

        self.apply(WorkflowEvent::DocumentDelivered).await;
        info!(
            path = %delivered.path.display(),
            size_bytes = delivered.size_bytes,
            "document delivered"
        );
        Ok(delivered)
    }

    /// Resets the server-side cursor, clears local progress and loads the
    /// first batch again.
    pub async fn restart(&self) -> Result<WorkflowPhase, WorkflowError> {
        let operation = Operation::Restart;
        self.begin(operation).await?;

        match self.service.restart().await {
            Ok(message) => {
                info!(ack = message.as_deref().unwrap_or(""), "form restarted");
                self.apply(WorkflowEvent::RestartAccepted).await;
                self.fetch_batch().await
            }
            Err(source) => Err(self
                .fail(operation, WorkflowError::RequestFailed { operation, source })
                .await),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
