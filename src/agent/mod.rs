//! Agent module - the tool-calling orchestration loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. The caller appends the user's message to the conversation
//! 2. Call the model with the conversation and the available tools
//! 3. If the model requests tool calls, execute them in order and append results
//! 4. Repeat until the model answers without tools or the iteration cap is reached,
//!    then make one last call with tools disabled

mod agent_loop;
mod conversation;
mod prompt;

pub use agent_loop::{Agent, AgentConfig, AgentError, TurnOutcome};
pub use conversation::{Conversation, ConversationError};
pub use prompt::build_system_prompt;
