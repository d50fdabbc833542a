//! Conversation buffer for one session.
//!
//! The buffer is seeded with a single system message which is never
//! trimmed. Everything after it is bounded by a [`RetentionPolicy`].

use crate::types::{FunctionCall, Message, Role};

/// Sliding-window bound on stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum non-system messages kept. Zero keeps everything.
    pub max_messages: usize,
}

impl RetentionPolicy {
    pub fn window(max_messages: usize) -> Self {
        Self { max_messages }
    }

    pub fn unbounded() -> Self {
        Self { max_messages: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    policy: RetentionPolicy,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>, policy: RetentionPolicy) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
            policy,
        }
    }

    /// Snapshot of the stored history, system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.enforce_retention();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    pub fn push_function_call(&mut self, call: FunctionCall) {
        self.push(Message::function_call(call));
    }

    pub fn push_function_result(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.push(Message::function_result(name, content));
    }

    /// Drop everything except the system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    /// Messages to send for one call, with `context` injected as a system
    /// message right before the latest user turn. Stored history is left
    /// untouched.
    pub fn with_context(&self, context: &str) -> Vec<Message> {
        let mut messages = self.messages.clone();
        let context_msg = Message::system(format!(
            "Use the following context to answer the user's question:\n\n{}",
            context
        ));
        match messages.iter().rposition(|m| m.role == Role::User) {
            Some(pos) => messages.insert(pos, context_msg),
            None => messages.push(context_msg),
        }
        messages
    }

    fn enforce_retention(&mut self) {
        let max = self.policy.max_messages;
        if max == 0 {
            return;
        }

        let history = self.messages.len() - 1;
        if history > max {
            // The latest user turn and everything after it is the turn in
            // progress; it stays whole until the next user turn arrives.
            let turn_start = self
                .messages
                .iter()
                .rposition(|m| m.role == Role::User)
                .unwrap_or(self.messages.len());
            let excess = (history - max).min(turn_start.saturating_sub(1));
            self.messages.drain(1..1 + excess);
        }

        // A function result is meaningless without the call that asked for it.
        while self.messages.len() > 1 && self.messages[1].role == Role::Function {
            self.messages.remove(1);
        }
    }
}
