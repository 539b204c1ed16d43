use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{error, info, warn};

use crate::agent::{Agent, Conversation, TurnOutcome};
use crate::config::Config;

use super::{ui, Command};

/// Result text given to tool calls left unanswered by an aborted turn.
const NOT_EXECUTED: &str = "Tool call was not executed because the previous turn was aborted.";

/// Read-eval loop over one conversation.
pub struct Repl {
    agent: Agent,
    config: Config,
    conversation: Conversation,
}

impl Repl {
    pub async fn new(agent: Agent, config: Config) -> Self {
        let conversation = agent.new_conversation().await;
        Self {
            agent,
            config,
            conversation,
        }
    }

    /// Run until `--quit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut editor = DefaultEditor::new().context("failed to initialize line editor")?;
        println!("{}", ui::startup_text());

        let prompt = ui::prompt();
        loop {
            // rustyline blocks; keep the runtime's other workers free
            let line = match tokio::task::block_in_place(|| editor.readline(&prompt)) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!("{}", ui::goodbye_text());
                    break;
                }
                Err(e) => return Err(e).context("failed to read input"),
            };

            match Command::parse(&line) {
                Command::Quit => {
                    println!("{}", ui::goodbye_text());
                    break;
                }
                Command::Help => println!("{}", ui::help_text()),
                Command::Config => {
                    println!("{}", ui::config_text(&self.config, &self.agent.tools().describe()))
                }
                Command::Clear => {
                    self.conversation = self.agent.new_conversation().await;
                    info!(target: "interaction", "Conversation cleared");
                    println!("{}", ui::cleared_text());
                }
                Command::Empty => println!("{}", ui::empty_input_hint()),
                Command::Prompt(input) => {
                    let _ = editor.add_history_entry(input);
                    self.handle_prompt(input).await;
                }
            }
        }

        info!(target: "system", "Session ended");
        Ok(())
    }

    async fn handle_prompt(&mut self, input: &str) {
        let closed = self.conversation.close_pending(NOT_EXECUTED);
        if closed > 0 {
            warn!(target: "interaction", closed, "Closed tool calls left pending by an aborted turn");
        }

        info!(
            target: "interaction",
            input_length = input.len(),
            conversation_length = self.conversation.len(),
            "User input received"
        );
        println!("{}", ui::format_user_input(input));

        let result = tokio::select! {
            result = self.agent.ask(&mut self.conversation, input) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        match result {
            Some(Ok(outcome)) => {
                log_outcome(&outcome);
                println!("{}\n", ui::format_ai_response(&outcome.answer));
            }
            Some(Err(e)) => {
                error!(target: "interaction", error = %e, "LLM response failed");
                println!("{}", ui::format_error(&e.to_string()));
            }
            None => {
                warn!(target: "interaction", "Turn cancelled by user");
                println!("{}", ui::cancelled_text());
            }
        }
    }
}

fn log_outcome(outcome: &TurnOutcome) {
    let usage = outcome.usage.unwrap_or_default();
    info!(
        target: "interaction",
        gateway_calls = outcome.gateway_calls,
        rounds = outcome.rounds,
        tool_calls = outcome.tool_calls,
        hit_iteration_cap = outcome.hit_iteration_cap,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        answer_length = outcome.answer.len(),
        "Turn completed"
    );
}
