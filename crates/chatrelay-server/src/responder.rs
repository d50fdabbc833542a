//! The reply pipeline: one user turn in, one assistant turn out.

use std::sync::Arc;

use tracing::debug;

use chatrelay_chat::{Completion, CompletionClient, Conversation, FunctionSpec, Message};
use chatrelay_core::{ChatMode, Error, Result};
use chatrelay_store::RetrievalIndex;
use chatrelay_tools::ToolDispatcher;

/// What happens between the user turn and the completion call.
enum Augmentation {
    None,
    Retrieval(Arc<RetrievalIndex>),
    Tools(Arc<ToolDispatcher>),
}

pub struct Responder {
    completions: Arc<dyn CompletionClient>,
    augmentation: Augmentation,
}

impl Responder {
    pub fn plain(completions: Arc<dyn CompletionClient>) -> Self {
        Self {
            completions,
            augmentation: Augmentation::None,
        }
    }

    pub fn retrieval(completions: Arc<dyn CompletionClient>, index: Arc<RetrievalIndex>) -> Self {
        Self {
            completions,
            augmentation: Augmentation::Retrieval(index),
        }
    }

    pub fn tools(completions: Arc<dyn CompletionClient>, tools: Arc<ToolDispatcher>) -> Self {
        Self {
            completions,
            augmentation: Augmentation::Tools(tools),
        }
    }

    pub fn mode(&self) -> ChatMode {
        match self.augmentation {
            Augmentation::None => ChatMode::Plain,
            Augmentation::Retrieval(_) => ChatMode::Retrieval,
            Augmentation::Tools(_) => ChatMode::Tools,
        }
    }

    /// Record `message`, produce a reply and record it too. On failure the
    /// user turn stays in history and no assistant turn is added.
    pub async fn reply(&self, conversation: &mut Conversation, message: &str) -> Result<String> {
        conversation.push_user(message);

        let reply = match &self.augmentation {
            Augmentation::None => self.complete_text(conversation.messages(), &[]).await?,
            Augmentation::Retrieval(index) => {
                let context = index.context_for(message).await?;
                let messages = if context.is_empty() {
                    conversation.messages().to_vec()
                } else {
                    conversation.with_context(&context)
                };
                self.complete_text(&messages, &[]).await?
            }
            Augmentation::Tools(tools) => self.reply_with_tools(conversation, tools).await?,
        };

        conversation.push_assistant(reply.clone());
        Ok(reply)
    }

    async fn reply_with_tools(
        &self,
        conversation: &mut Conversation,
        tools: &ToolDispatcher,
    ) -> Result<String> {
        let first = self
            .completions
            .complete(conversation.messages(), &tools.descriptors())
            .await?;

        let call = match first {
            Completion::Text(text) => return Ok(text),
            Completion::FunctionCall(call) => call,
        };

        let output = tools.dispatch_call(&call).await?;
        debug!("Tool {} returned {}", output.name, output.content);
        conversation.push_function_call(call);
        conversation.push_function_result(output.name, output.content);

        // Exactly one follow-up; no functions offered so the model must answer.
        self.complete_text(conversation.messages(), &[]).await
    }

    async fn complete_text(&self, messages: &[Message], functions: &[FunctionSpec]) -> Result<String> {
        match self.completions.complete(messages, functions).await? {
            Completion::Text(text) => Ok(text),
            Completion::FunctionCall(call) => Err(Error::Completion(format!(
                "Unexpected function call to {}",
                call.name
            ))),
        }
    }
}
