//! Bridges rig-core's `CompletionModel` trait to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::{AssistantContent, Message as RigMessage};

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

/// Adapter wrapping a rig completion model.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

/// Split our message list into (preamble, history, prompt) the way rig
/// expects them: system messages join into the preamble, the final message
/// becomes the prompt, everything in between is chat history.
fn split_messages(messages: &[ChatMessage]) -> (String, Vec<RigMessage>, RigMessage) {
    let mut preamble_parts = Vec::new();
    let mut turns = Vec::new();

    for message in messages {
        match message.role {
            Role::System => preamble_parts.push(message.content.clone()),
            Role::User => turns.push(RigMessage::user(message.content.clone())),
            Role::Assistant => turns.push(RigMessage::assistant(message.content.clone())),
        }
    }

    let prompt = turns
        .pop()
        .unwrap_or_else(|| RigMessage::user(String::new()));

    (preamble_parts.join("\n\n"), turns, prompt)
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync,
{
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (preamble, history, prompt) = split_messages(&request.messages);

        let mut builder = self.model.completion_request(prompt).messages(history);
        if !preamble.is_empty() {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = self.model.completion(builder.build()).await.map_err(|e| {
            LlmError::RequestFailed {
                provider: "rig".to_string(),
                reason: e.to_string(),
            }
        })?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: "rig".to_string(),
                reason: "completion contained no text content".to_string(),
            });
        }

        Ok(CompletionResponse {
            content,
            input_tokens: response.usage.input_tokens as u32,
            output_tokens: response.usage.output_tokens as u32,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_joins_system_into_preamble() {
        let messages = vec![
            ChatMessage::system("instruction"),
            ChatMessage::system("context"),
            ChatMessage::user("hello"),
        ];
        let (preamble, history, _prompt) = split_messages(&messages);
        assert_eq!(preamble, "instruction\n\ncontext");
        assert!(history.is_empty());
    }

    #[test]
    fn split_takes_last_turn_as_prompt() {
        let messages = vec![
            ChatMessage::system("s"),
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ];
        let (_, history, _prompt) = split_messages(&messages);
        // q1 and a1 remain as history; q2 became the prompt.
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn split_handles_empty_history() {
        let (preamble, history, _prompt) = split_messages(&[]);
        assert!(preamble.is_empty());
        assert!(history.is_empty());
    }
}
