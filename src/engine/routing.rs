//! The conversation engine — routes each inbound message through the
//! intake state machine.
//!
//! Rules are evaluated in strict priority order: digression detection,
//! digression resolution, flow start, answer acceptance, terminal-state
//! forwarding, fallback instruction.

use std::sync::Arc;

use crate::channels::MessageSender;
use crate::config::EngineConfig;
use crate::engine::assistant::AssistantDialogue;
use crate::engine::intent::{ClassifyContext, Command, HeuristicClassifier, Intent, IntentClassifier};
use crate::engine::script::QuestionScript;
use crate::engine::session::{FlowState, SessionStore, UserSession};
use crate::error::{FlowError, Result};
use crate::llm::LlmProvider;
use crate::report::{field_map, ReportRenderer};

/// Instruction returned when no flow is active and nothing matched.
pub const START_INSTRUCTION: &str = "Please start your report by typing 'start report'.";

/// Instruction returned when a pending digression has no recoverable
/// question behind it.
pub const FLOW_ERROR_INSTRUCTION: &str =
    "There seems to be an error. Please start your report by typing 'start report'.";

/// Status returned when the script runs out without a terminal key.
pub const REPORT_COMPLETED: &str = "Report completed.";

/// Status returned once the summary document has been rendered.
pub const SUMMARY_GENERATED: &str = "Report summary generated.";

/// Notification sent to the user after rendering.
const SUMMARY_NOTIFICATION: &str = "Your report summary has been created.";

/// Title and filename stem for rendered summaries.
const REPORT_TITLE: &str = "Medical Report Summary";

/// The conversation engine.
///
/// Owns the question script and the per-user sessions; consumes the
/// outbound sender, the oracle, and the report renderer through narrow
/// trait seams.
pub struct ConversationEngine {
    script: QuestionScript,
    store: Arc<dyn SessionStore>,
    sender: Arc<dyn MessageSender>,
    assistant: AssistantDialogue,
    renderer: Arc<dyn ReportRenderer>,
    classifier: Box<dyn IntentClassifier>,
}

impl ConversationEngine {
    pub fn new(
        script: QuestionScript,
        store: Arc<dyn SessionStore>,
        sender: Arc<dyn MessageSender>,
        oracle: Arc<dyn LlmProvider>,
        renderer: Arc<dyn ReportRenderer>,
        config: EngineConfig,
    ) -> Self {
        let assistant = AssistantDialogue::new(oracle, Arc::clone(&sender), config);
        Self {
            script,
            store,
            sender,
            assistant,
            renderer,
            classifier: Box::new(HeuristicClassifier),
        }
    }

    /// Swap the intent-detection strategy.
    pub fn with_classifier(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Handle one inbound message, returning the status string the caller
    /// reports back (the webhook returns it as the response body).
    pub async fn handle_message(&self, user: &str, text: &str) -> Result<String> {
        let mut session = self.store.get(user).await;
        let ctx = ClassifyContext {
            flow_active: session.as_ref().is_some_and(|s| s.flow.is_some()),
        };

        match self.classifier.classify(text, &ctx) {
            // Rule 1: digressions preserve the underlying question state.
            Intent::Digression => {
                let Some(mut session) = session.take() else {
                    return Ok(START_INSTRUCTION.to_string());
                };
                if matches!(session.flow, Some(FlowState::Asking { .. })) {
                    session.pending_question = true;
                }
                let result = self
                    .assistant
                    .respond(&self.script, &mut session, user, text)
                    .await;
                self.store.put(user, session).await;
                result
            }

            // Rule 2: "solved" only resolves an actually-pending digression.
            Intent::Command(Command::Solved)
                if session.as_ref().is_some_and(|s| s.pending_question) =>
            {
                let mut session = session.take().unwrap_or_default();
                session.pending_question = false;

                let outstanding = session
                    .flow
                    .as_ref()
                    .and_then(FlowState::asking_key)
                    .filter(|key| self.script.contains(key))
                    .map(str::to_string);

                let result = match outstanding {
                    Some(key) => self.ask_question(&mut session, user, &key).await,
                    None => {
                        tracing::warn!(%user, "{}", FlowError::NoPriorQuestion);
                        session.abandon_flow();
                        Ok(FLOW_ERROR_INSTRUCTION.to_string())
                    }
                };
                self.store.put(user, session).await;
                result
            }

            // Rule 3: "start report" reinitializes from any state.
            Intent::Command(Command::StartReport) => {
                let mut session = session.take().unwrap_or_default();
                session.reset_flow();
                let first = self.script.first_question().key.clone();
                let result = self.ask_question(&mut session, user, &first).await;
                self.store.put(user, session).await;
                result
            }

            // Rules 4-6. An unmatched "solved" falls through here and is
            // treated like any other text.
            Intent::Answer | Intent::Command(Command::Solved) => {
                let Some(mut session) = session.take() else {
                    // Rule 6: no session is created for idle chatter.
                    return Ok(START_INSTRUCTION.to_string());
                };
                match session.flow.clone() {
                    // Rule 4: record the answer verbatim and advance.
                    Some(FlowState::Asking { key }) => {
                        session.record_answer(&key, text);
                        let result = self.advance_flow(&mut session, user, &key).await;
                        self.store.put(user, session).await;
                        result
                    }
                    // Rule 5: terminal sessions talk to the assistant.
                    Some(FlowState::Terminal) => {
                        let result = self
                            .assistant
                            .respond(&self.script, &mut session, user, text)
                            .await;
                        self.store.put(user, session).await;
                        result
                    }
                    None => Ok(START_INSTRUCTION.to_string()),
                }
            }
        }
    }

    /// Send the prompt for `key`; only a successful send moves the flow
    /// into `Asking(key)`.
    async fn ask_question(
        &self,
        session: &mut UserSession,
        user: &str,
        key: &str,
    ) -> Result<String> {
        let prompt = self
            .script
            .prompt(key)
            .ok_or_else(|| FlowError::UnknownKey(key.to_string()))?
            .to_string();

        self.sender.send(&prompt, user).await?;
        session.flow = Some(FlowState::Asking {
            key: key.to_string(),
        });
        Ok(format!("Asking question: {prompt}"))
    }

    /// Move past an answered question: ask the next one, or finish the
    /// flow when the terminal key is next.
    async fn advance_flow(
        &self,
        session: &mut UserSession,
        user: &str,
        answered_key: &str,
    ) -> Result<String> {
        match self.script.next_key(answered_key).map(str::to_string) {
            Some(next) if !self.script.is_terminal(&next) => {
                self.ask_question(session, user, &next).await
            }
            Some(_terminal) => self.complete_flow(session, user).await,
            None => {
                tracing::warn!(%user, answered_key, "{}", FlowError::ScriptExhausted);
                session.abandon_flow();
                Ok(REPORT_COMPLETED.to_string())
            }
        }
    }

    /// Terminal transition: send the closing prompt, render the summary
    /// exactly once, then notify the user.
    ///
    /// Notification delivery is a secondary outcome — a failure there is
    /// reported in the returned status instead of failing the completion.
    async fn complete_flow(&self, session: &mut UserSession, user: &str) -> Result<String> {
        let terminal_prompt = self.script.prompt(self.script.terminal_key()).unwrap_or("");
        self.sender.send(terminal_prompt, user).await?;

        let fields = field_map(&self.script, session.answers());
        let filename = format!("Medical_Report_{user}.md");
        let artifact = self.renderer.render(&fields, &filename, REPORT_TITLE).await?;
        session.flow = Some(FlowState::Terminal);

        tracing::info!(%user, artifact_id = %artifact.id, "Intake flow completed");

        match self.sender.send(SUMMARY_NOTIFICATION, user).await {
            Ok(()) => Ok(SUMMARY_GENERATED.to_string()),
            Err(err) => {
                tracing::warn!(%user, "Summary notification failed: {err}");
                Ok(format!(
                    "{SUMMARY_GENERATED} (notification delivery failed: {err})"
                ))
            }
        }
    }
}

// Note: routing scenarios (the full questionnaire walk, digressions,
// failure paths) live in tests/engine_flow.rs with mock collaborators.
