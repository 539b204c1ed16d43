//! System prompt templates for the agent.

use crate::tools::ToolDescriptor;

/// Build the system prompt with the working directory snapshot and tool list.
pub fn build_system_prompt(working_dir: &str, listing: &str, tools: &[ToolDescriptor]) -> String {
    let tool_descriptions = tools
        .iter()
        .map(|t| {
            let params = t
                .parameters
                .iter()
                .map(|p| {
                    format!(
                        "`{}`{}",
                        p.name,
                        if p.required { "" } else { " (optional)" }
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            if params.is_empty() {
                format!("- **{}**: {}", t.name, t.description)
            } else {
                format!("- **{}**: {} Parameters: {}", t.name, t.description, params)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a coding agent running in the user's terminal. You help with software development questions and tasks on this machine.

The current working directory is: {working_dir}
Its contents are:
{listing}

## Questions vs. tasks

If the user asks how to do something, give short instructions without running anything, then offer to do it for them.
If the user asks you to do something, do it. For simple lookups, prefer running the right tool over asking questions. For larger tasks, gather the context you need first and only ask about details that genuinely matter.

## Tools

You have access to the following tools:
{tool_descriptions}

Rules:
1. Only use the tools listed above.
2. Never mention tool names to the user; say "I will run the command", not "I will use the shell tool".
3. Read a file before changing it. Use write_file for creating and modifying files, and read_file rather than shell commands like cat.
4. Be careful with destructive commands and deletions; confirm a file is not needed before removing it.
5. Use relative paths inside the project and absolute paths for system files.
6. Keep grep patterns specific so results stay readable.

## Finishing

Do exactly what was asked, no more and no less. When you are done, answer in plain text with a short summary of what you did and, for code changes, offer to verify them (build, tests, lint)."#,
        working_dir = working_dir,
        listing = listing,
        tool_descriptions = tool_descriptions
    )
}
