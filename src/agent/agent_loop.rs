//! Core agent loop implementation.
//!
//! One call to [`Agent::run_turn`] drives rounds of model call, then tool
//! execution, then model call again, until the model answers without
//! requesting tools or the iteration cap is reached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::llm::{ChatResponse, GatewayError, LlmClient, TokenUsage, ToolSchema};
use crate::tools::{ToolArgs, ToolContext, ToolFailure, ToolRegistry};

use super::conversation::{Conversation, ConversationError};
use super::prompt::build_system_prompt;

/// Configuration for the agent loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model (deployment) name sent with every request
    pub model: String,
    /// Maximum tool-bearing rounds per turn
    pub max_iterations: usize,
    /// Deadline for one model call
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_string(),
            max_iterations: 10,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl From<&Config> for AgentConfig {
    fn from(config: &Config) -> Self {
        Self {
            model: config.gateway.model.clone(),
            max_iterations: config.max_iterations,
            request_timeout: config.request_timeout,
        }
    }
}

/// Error type for a turn.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model call failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("model call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to parse arguments for tool `{tool}`: {source}")]
    MalformedArguments {
        tool: String,
        call_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Tool(#[from] ToolFailure),

    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

/// Result of a completed turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Final answer text
    pub answer: String,
    /// Model calls made, including the tools-disabled call at the cap
    pub gateway_calls: usize,
    /// Rounds in which tools were executed
    pub rounds: usize,
    /// Tool calls executed
    pub tool_calls: usize,
    /// Whether the answer came from the tools-disabled call at the cap
    pub hit_iteration_cap: bool,
    /// Accumulated token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
}

impl TurnOutcome {
    fn record_usage(&mut self, response: &ChatResponse) {
        if let Some(u) = &response.usage {
            self.usage = Some(match &self.usage {
                Some(acc) => acc.add(u),
                None => *u,
            });
        }
    }
}

/// The terminal agent.
pub struct Agent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    tool_ctx: ToolContext,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        tool_ctx: ToolContext,
    ) -> Self {
        Self {
            config,
            llm,
            tools,
            tool_ctx,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Start a conversation whose system prompt snapshots the working directory.
    pub async fn new_conversation(&self) -> Conversation {
        let listing = match self
            .tools
            .execute("list", &ToolArgs::default(), &self.tool_ctx)
            .await
        {
            Ok(listing) => listing,
            Err(e) => {
                warn!(target: "system", error = %e, "Could not list working directory for system prompt");
                "(unavailable)".to_string()
            }
        };

        let working_dir = self.tool_ctx.working_dir.display().to_string();
        Conversation::with_system_prompt(build_system_prompt(
            &working_dir,
            &listing,
            &self.tools.describe(),
        ))
    }

    /// Append `input` as a user message and run a turn.
    pub async fn ask(
        &self,
        conversation: &mut Conversation,
        input: &str,
    ) -> Result<TurnOutcome, AgentError> {
        conversation.push_user(input);
        self.run_turn(conversation).await
    }

    /// Run the tool-calling loop over `conversation`, which must already end
    /// with the user's message.
    ///
    /// Tool calls within a round run one at a time in the order the model
    /// listed them. The first unparseable argument payload or failing tool
    /// aborts the turn; the conversation keeps everything appended up to that
    /// point.
    pub async fn run_turn(&self, conversation: &mut Conversation) -> Result<TurnOutcome, AgentError> {
        let turn_id = Uuid::now_v7();
        let span = info_span!("turn", turn_id = %turn_id, model = %self.config.model);

        async {
            info!(
                target: "llm",
                model = %self.config.model,
                conversation_length = conversation.len(),
                tools_available = self.tools.len(),
                "Starting tool-enabled LLM request"
            );

            let schemas = self.tools.tool_schemas();
            let mut outcome = TurnOutcome::default();

            for iteration in 0..self.config.max_iterations {
                debug!(
                    target: "llm",
                    iteration = iteration + 1,
                    max_iterations = self.config.max_iterations,
                    "LLM iteration"
                );

                let response = self.call_model(conversation, Some(&schemas)).await?;
                outcome.gateway_calls += 1;
                outcome.record_usage(&response);

                let message = response.message;
                let tool_calls = message.requested_tools().to_vec();
                let answer = message.text().to_string();
                conversation.push_assistant(message);

                if tool_calls.is_empty() {
                    info!(target: "llm", iterations_used = iteration + 1, "LLM completed without tool calls");
                    outcome.answer = answer;
                    return Ok(outcome);
                }

                info!(
                    target: "llm",
                    iteration = iteration + 1,
                    tool_calls_count = tool_calls.len(),
                    "LLM requested tool calls"
                );
                outcome.rounds += 1;

                for (index, call) in tool_calls.iter().enumerate() {
                    let name = call.function.name.as_str();
                    debug!(target: "tool", tool_index = index + 1, tool_name = name, "Processing tool call");

                    let args = ToolArgs::parse(&call.function.arguments).map_err(|source| {
                        error!(
                            target: "tool",
                            tool_name = name,
                            arguments = %call.function.arguments,
                            error = %source,
                            "Failed to parse tool arguments"
                        );
                        AgentError::MalformedArguments {
                            tool: name.to_string(),
                            call_id: call.id.clone(),
                            source,
                        }
                    })?;

                    info!(target: "tool", tool_name = name, tool_args = %args.as_value(), "Tool call");

                    let started = Instant::now();
                    let result = self.tools.execute(name, &args, &self.tool_ctx).await;
                    let duration_ms = started.elapsed().as_millis() as u64;

                    let output = match result {
                        Ok(output) => output,
                        Err(failure) => {
                            error!(
                                target: "tool",
                                tool_name = name,
                                duration_ms,
                                error = %failure,
                                "Tool execution failed"
                            );
                            return Err(failure.into());
                        }
                    };

                    info!(
                        target: "tool",
                        tool_name = name,
                        duration_ms,
                        result_len = output.len(),
                        "Tool execution success"
                    );
                    outcome.tool_calls += 1;
                    conversation.push_tool_result(&call.id, output)?;
                }
            }

            warn!(
                target: "llm",
                max_iterations = self.config.max_iterations,
                "Reached max iterations, making final request without tools"
            );

            let response = self.call_model(conversation, None).await?;
            outcome.gateway_calls += 1;
            outcome.record_usage(&response);

            let mut message = response.message;
            if message.tool_calls.take().is_some_and(|calls| !calls.is_empty()) {
                warn!(target: "llm", "Dropping tool calls returned while tools were disabled");
            }
            outcome.answer = message.text().to_string();
            outcome.hit_iteration_cap = true;
            conversation.push_assistant(message);

            info!(target: "llm", iterations_used = self.config.max_iterations, "LLM completed with max iterations");
            Ok::<_, AgentError>(outcome)
        }
        .instrument(span)
        .await
    }

    /// One model call, bounded by the request deadline.
    async fn call_model(
        &self,
        conversation: &Conversation,
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, AgentError> {
        let started = Instant::now();
        let result = tokio::time::timeout(
            self.config.request_timeout,
            self.llm
                .chat_completion(&self.config.model, conversation.messages(), tools),
        )
        .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Err(_) => {
                error!(target: "llm", duration_ms, "LLM request timed out");
                Err(AgentError::Timeout(self.config.request_timeout))
            }
            Ok(Err(e)) => {
                error!(target: "llm", duration_ms, error = %e, "LLM request failed");
                Err(e.into())
            }
            Ok(Ok(response)) => {
                info!(
                    target: "llm",
                    model = %self.config.model,
                    duration_ms,
                    response = response.message.text(),
                    "LLM response"
                );
                Ok(response)
            }
        }
    }
}
