//! Assistant dialogue — routes digressions and post-completion questions to
//! the oracle with the user's report as context.

use std::sync::Arc;

use crate::channels::MessageSender;
use crate::config::EngineConfig;
use crate::engine::script::QuestionScript;
use crate::engine::session::UserSession;
use crate::error::{Error, LlmError, Result};
use crate::llm::{retry, ChatMessage, CompletionRequest, LlmProvider};
use crate::report::{context_block, field_map};

/// System instruction seeded at the head of every assistant history.
const ASSISTANT_INSTRUCTION: &str = "You are a helpful assistant, \
designed to assist users with questions about their report. \
Ensure you use the context of the report to provide accurate answers. \
Output the answer in an organized list format.";

/// Sampling knobs for assistant replies.
const REPLY_MAX_TOKENS: u32 = 500;
const REPLY_TEMPERATURE: f64 = 0.01;

/// Drives one assistant turn: seed, append, invoke, append, deliver.
pub struct AssistantDialogue {
    oracle: Arc<dyn LlmProvider>,
    sender: Arc<dyn MessageSender>,
    config: EngineConfig,
}

impl AssistantDialogue {
    pub fn new(
        oracle: Arc<dyn LlmProvider>,
        sender: Arc<dyn MessageSender>,
        config: EngineConfig,
    ) -> Self {
        Self {
            oracle,
            sender,
            config,
        }
    }

    /// Handle one forwarded message for `user`, mutating the session's
    /// history. Returns the oracle's reply text on success.
    ///
    /// The caller persists the session afterwards regardless of outcome:
    /// on oracle failure the appended user turn is retained, on delivery
    /// failure both appended records are retained.
    pub async fn respond(
        &self,
        script: &QuestionScript,
        session: &mut UserSession,
        user: &str,
        text: &str,
    ) -> Result<String> {
        if !session.history_seeded() {
            let snapshot = context_block(&field_map(script, session.answers()));
            session.seed_history(
                ChatMessage::system(ASSISTANT_INSTRUCTION),
                ChatMessage::system(snapshot),
            );
        }

        session.push_history(
            ChatMessage::user(text),
            self.config.history_max_messages,
        );

        let request = CompletionRequest::new(session.history().to_vec())
            .with_max_tokens(REPLY_MAX_TOKENS)
            .with_temperature(REPLY_TEMPERATURE);

        let oracle = Arc::clone(&self.oracle);
        let call = retry::with_retry(self.config.oracle_retries, move || {
            let oracle = Arc::clone(&oracle);
            let request = request.clone();
            async move { oracle.complete(request).await }
        });

        let response = match tokio::time::timeout(self.config.oracle_timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(%user, "Oracle call failed: {err}");
                return Err(Error::Llm(err));
            }
            Err(_) => {
                let err = LlmError::Timeout {
                    timeout: self.config.oracle_timeout,
                };
                tracing::warn!(%user, "Oracle call timed out");
                return Err(Error::Llm(err));
            }
        };

        session.push_history(
            ChatMessage::assistant(&response.content),
            self.config.history_max_messages,
        );

        if let Err(err) = self.sender.send(&response.content, user).await {
            tracing::warn!(%user, "Failed to deliver assistant reply: {err}");
            return Err(Error::Channel(err));
        }

        Ok(response.content)
    }
}

// Note: AssistantDialogue is exercised end-to-end (seeding, retention,
// failure modes) in tests/engine_flow.rs with mock oracle and sender
// implementations.
