//! Line-oriented terminal front end over the workflow controller.

use std::sync::Arc;

use anyhow::Result;
use client_core::{UserAction, WizardController, WorkflowError, WorkflowState};
use shared::domain::WorkflowPhase;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;

pub struct Session<R, W> {
    controller: Arc<WizardController>,
    input: Lines<R>,
    output: W,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(controller: Arc<WizardController>, input: R, output: W) -> Self {
        Self {
            controller,
            input: input.lines(),
            output,
        }
    }

    /// Walks the form until the input ends or the user quits.
    pub async fn run(mut self) -> Result<()> {
        self.say("PC-1 Form Generator").await?;
        if let Err(err) = self.controller.load_next_batch().await {
            debug!(error = %err, "initial load failed");
        }

        loop {
            let state = self.controller.snapshot().await;
            if !state.status.is_empty() {
                self.say(&format!("» {}", state.status)).await?;
            }

            let keep_going = match state.phase {
                WorkflowPhase::Collecting if state.batch.is_empty() => self.offer_reload().await?,
                WorkflowPhase::Collecting => self.collect(&state).await?,
                WorkflowPhase::EmptyBatchPending => self.confirm_empty_step().await?,
                WorkflowPhase::Complete => self.final_menu(&state).await?,
            };
            if !keep_going {
                return Ok(());
            }
        }
    }

    async fn say(&mut self, line: &str) -> Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;
        Ok(self
            .input
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    async fn collect(&mut self, state: &WorkflowState) -> Result<bool> {
        for field in state.pending_fields() {
            let prompt = match field.answer {
                Some(current) => format!("{} [{}]: ", field.prompt, current),
                None => format!("{}: ", field.prompt),
            };
            let Some(line) = self.ask(&prompt).await? else {
                return Ok(false);
            };
            if line.is_empty() && field.answer.is_some() {
                continue;
            }
            if let Err(err) = self.controller.set_answer(field.key, line).await {
                debug!(error = %err, key = field.key, "answer not recorded");
            }
        }

        loop {
            match self.controller.submit_answers().await {
                Ok(_) => return Ok(true),
                Err(err) if err.needs_reload() => return self.recover_batch(&err).await,
                Err(err) => {
                    debug!(error = %err, "submit failed");
                    let status = self.controller.snapshot().await.status;
                    self.say(&format!("» {status}")).await?;
                    match self.ask("Retry? [Y/n/q] ").await?.as_deref() {
                        None | Some("q") => return Ok(false),
                        Some("n") => return Ok(true),
                        Some(_) => continue,
                    }
                }
            }
        }
    }

    /// The answers were accepted but the next batch never arrived. Only a
    /// reload is offered; a resubmit would move the server past an unseen step.
    async fn recover_batch(&mut self, err: &WorkflowError) -> Result<bool> {
        debug!(error = %err, "answers accepted but next batch not loaded");
        loop {
            let status = self.controller.snapshot().await.status;
            self.say(&format!("» {status}")).await?;
            match self.ask("Reload questions? [Y/q] ").await?.as_deref() {
                None | Some("q") => return Ok(false),
                Some(_) => match self.controller.load_next_batch().await {
                    Ok(_) => return Ok(true),
                    Err(err) => debug!(error = %err, "reload failed"),
                },
            }
        }
    }

    async fn offer_reload(&mut self) -> Result<bool> {
        match self
            .ask("No questions loaded. Press enter to reload or q to quit: ")
            .await?
            .as_deref()
        {
            None | Some("q") => Ok(false),
            Some(_) => {
                if let Err(err) = self.controller.load_next_batch().await {
                    debug!(error = %err, "reload failed");
                }
                Ok(true)
            }
        }
    }

    async fn confirm_empty_step(&mut self) -> Result<bool> {
        let answer = self
            .ask("This step has no questions. Enter to continue, r to reload, q to quit: ")
            .await?;
        let result = match answer.as_deref() {
            None | Some("q") => return Ok(false),
            Some("r") => self.controller.load_next_batch().await,
            Some(_) => match self.controller.submit_answers().await {
                Err(err) if err.needs_reload() => return self.recover_batch(&err).await,
                other => other,
            },
        };
        if let Err(err) = result {
            debug!(error = %err, "empty step not resolved");
        }
        Ok(true)
    }

    async fn final_menu(&mut self, state: &WorkflowState) -> Result<bool> {
        let actions = state.available_actions();
        self.say("All required information has been gathered.").await?;
        for (index, action) in actions.iter().enumerate() {
            self.say(&format!("  {}) {}", index + 1, action.label())).await?;
        }
        self.say("  q) Quit").await?;

        let Some(choice) = self.ask("> ").await? else {
            return Ok(false);
        };
        if choice == "q" {
            return Ok(false);
        }
        let Some(action) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| actions.get(i).copied())
        else {
            self.say("Unknown choice").await?;
            return Ok(true);
        };

        self.perform(action).await
    }

    async fn perform(&mut self, action: UserAction) -> Result<bool> {
        let outcome = match action {
            UserAction::GenerateArtifact => self.controller.generate_artifact().await.map(|_| ()),
            UserAction::GenerateDocument | UserAction::ReviewDocument => {
                match self.controller.generate_document().await {
                    Ok(delivered) => {
                        self.say(&format!("Saved to {}", delivered.path.display()))
                            .await?;
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            UserAction::Restart => self.controller.restart().await.map(|_| ()),
            UserAction::SubmitAnswers => match self.controller.submit_answers().await {
                Err(err) if err.needs_reload() => return self.recover_batch(&err).await,
                other => other.map(|_| ()),
            },
            UserAction::ReloadBatch => self.controller.load_next_batch().await.map(|_| ()),
        };
        if let Err(err) = outcome {
            debug!(operation = %action.operation(), error = %err, "action failed");
        }
        Ok(true)
    }
}
