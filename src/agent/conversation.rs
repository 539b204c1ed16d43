//! Append-only conversation state.
//!
//! The conversation is the only thing sent to the model on every round.
//! Messages are never edited or removed; starting over means building a new
//! [`Conversation`].

use thiserror::Error;

use crate::llm::{ChatMessage, Role, ToolCall};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("tool result `{0}` does not answer a pending tool call of the latest assistant message")]
    UnexpectedToolResult(String),
}

/// Ordered sequence of role-tagged messages.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation that opens with a system message.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(prompt)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Append an assistant message as returned by the model.
    ///
    /// The role is forced to assistant and an empty tool-call list is stored as
    /// no tool calls.
    pub fn push_assistant(&mut self, mut message: ChatMessage) {
        message.role = Role::Assistant;
        message.tool_call_id = None;
        if message.tool_calls.as_ref().is_some_and(|calls| calls.is_empty()) {
            message.tool_calls = None;
        }
        self.messages.push(message);
    }

    /// Append the result of a tool call requested by the latest assistant message.
    pub fn push_tool_result(
        &mut self,
        tool_call_id: &str,
        content: impl Into<String>,
    ) -> Result<(), ConversationError> {
        if !self.pending_tool_calls().iter().any(|c| c.id == tool_call_id) {
            return Err(ConversationError::UnexpectedToolResult(tool_call_id.to_string()));
        }
        self.messages
            .push(ChatMessage::tool_result(tool_call_id, content));
        Ok(())
    }

    /// Tool calls of the latest assistant message that have no result yet.
    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        let Some(start) = self.messages.iter().rposition(|m| m.role == Role::Assistant) else {
            return Vec::new();
        };
        let answered: Vec<&str> = self.messages[start + 1..]
            .iter()
            .filter(|m| m.role == Role::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        self.messages[start]
            .requested_tools()
            .iter()
            .filter(|call| !answered.contains(&call.id.as_str()))
            .collect()
    }

    /// Answer every pending tool call with `note`.
    ///
    /// Used before a new user message after a turn was aborted mid-round, so
    /// the history stays acceptable to the backend, which rejects unanswered
    /// tool calls. Returns how many results were appended.
    pub fn close_pending(&mut self, note: &str) -> usize {
        let ids: Vec<String> = self
            .pending_tool_calls()
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        for id in &ids {
            self.messages.push(ChatMessage::tool_result(id.as_str(), note));
        }
        ids.len()
    }

    /// Number of tool-result messages in the whole conversation.
    pub fn tool_result_count(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::Tool).count()
    }
}
