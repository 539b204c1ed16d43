//! # termpilot
//!
//! An interactive coding agent for the terminal.
//!
//! This library provides:
//! - A tool-calling agent loop driven by an OpenAI-compatible chat backend
//! - Built-in local tools: shell commands, file and directory operations, search
//! - An interactive host with line commands and structured logging
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Read a line from the user and append it to the conversation
//! 2. Call the model with the conversation and the available tools
//! 3. Execute any requested tool calls in order and append their results
//! 4. Repeat until the model answers in plain text or the iteration cap is hit
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use termpilot::{agent::{Agent, AgentConfig}, config::Config, llm::OpenAiClient};
//! use termpilot::tools::{ToolContext, ToolRegistry};
//!
//! let config = Config::from_env()?;
//! let llm = OpenAiClient::new(config.gateway.clone(), config.request_timeout)?;
//! let ctx = ToolContext::new(&config.workspace_path, config.shell_timeout);
//! let agent = Agent::new(AgentConfig::from(&config), Arc::new(llm), ToolRegistry::new(), ctx);
//!
//! let mut conversation = agent.new_conversation().await;
//! let outcome = agent.ask(&mut conversation, "What is in this directory?").await?;
//! println!("{}", outcome.answer);
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod logging;
pub mod tools;

pub use config::Config;
