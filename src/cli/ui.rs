//! Terminal rendering for the interactive session.

use crate::config::Config;
use crate::tools::ToolDescriptor;

pub const RESET: &str = "\x1b[0m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

const WRAP_WIDTH: usize = 80;
const MIN_BOX_WIDTH: usize = 20;

const BANNER: &str = r#"
  _                             _ _       _
 | |_ ___ _ __ _ __ ___  _ __ (_) | ___ | |_
 | __/ _ \ '__| '_ ` _ \| '_ \| | |/ _ \| __|
 | ||  __/ |  | | | | | | |_) | | | (_) | |_
  \__\___|_|  |_| |_| |_| .__/|_|_|\___/ \__|
                        |_|
"#;

/// Input prompt shown before each line.
pub fn prompt() -> String {
    format!("{CYAN}{BOLD}> {RESET}")
}

/// Split every line into chunks of at most `width` characters.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            wrapped.push(String::new());
            continue;
        }
        for chunk in chars.chunks(width.max(1)) {
            wrapped.push(chunk.iter().collect());
        }
    }
    wrapped
}

fn boxed(title: &str, color: &str, lines: &[String]) -> String {
    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_BOX_WIDTH);
    let rule = "─".repeat(width + 2);

    let mut out = format!("{color}{BOLD}{title}{RESET}\n");
    out.push_str(&format!("{color}╭{rule}╮{RESET}\n"));
    for line in lines {
        let padding = " ".repeat(width - line.chars().count());
        out.push_str(&format!("{color}│{RESET} {line}{padding} {color}│{RESET}\n"));
    }
    out.push_str(&format!("{color}╰{rule}╯{RESET}\n"));
    out
}

/// Echo the user's input in a cyan box, wrapped at 80 columns.
pub fn format_user_input(input: &str) -> String {
    boxed("👤 User", CYAN, &wrap_lines(input, WRAP_WIDTH))
}

/// Assistant tag followed by the raw answer.
pub fn format_ai_response(response: &str) -> String {
    format!("🤖 {MAGENTA}{BOLD}AI Assistant{RESET}\n{response}")
}

/// Error message in a red box.
pub fn format_error(message: &str) -> String {
    let lines: Vec<String> = message.split('\n').map(str::to_string).collect();
    boxed("❌ Error", RED, &lines)
}

pub fn startup_text() -> String {
    format!(
        "{RED}{BANNER}{RESET}\n{GREEN}{BOLD}Welcome! I'm your coding agent. Ask me to create, fix or explain anything!{RESET}\n\
         {CYAN}Type '--help' to see the available commands.{RESET}\n"
    )
}

pub fn help_text() -> String {
    format!(
        "{YELLOW}{BOLD}Available commands:{RESET}\n\
         \x20 - Type any text to get a response from the AI agent\n\
         \x20 - Type '--clear' to clear conversation history\n\
         \x20 - Type '--config' to show the current model and tools\n\
         \x20 - Type '--help' to show this help message\n\
         \x20 - Type '--quit' to exit\n"
    )
}

/// Effective configuration with the API key masked, then the tool list.
pub fn config_text(config: &Config, tools: &[ToolDescriptor]) -> String {
    let gateway = &config.gateway;
    let mut out = format!("{YELLOW}{BOLD}Current configuration:{RESET}\n");
    out.push_str(&format!("  LLM model: {}\n", gateway.model));
    out.push_str(&format!(
        "  API version: {}\n",
        gateway.api_version.as_deref().unwrap_or("(none, OpenAI-compatible)")
    ));
    out.push_str(&format!("  API key: {}\n", gateway.masked_api_key()));
    out.push_str(&format!("  API endpoint: {}\n", gateway.endpoint));
    out.push_str(&format!("  Workspace: {}\n", config.workspace_path.display()));
    out.push_str(&format!("  Max iterations: {}\n", config.max_iterations));
    out.push_str(&format!(
        "  Request timeout: {}s\n",
        config.request_timeout.as_secs()
    ));
    out.push_str(&format!("  Shell timeout: {}s\n", config.shell_timeout.as_secs()));
    out.push_str(&format!("  Log file: {}\n", config.log_file.display()));

    out.push_str(&format!("\n{YELLOW}{BOLD}Available tools:{RESET}\n"));
    for tool in tools {
        out.push_str(&format!("  - {}: {}\n", tool.name, tool.description));
    }
    out
}

pub fn cleared_text() -> String {
    format!("\x1b[H\x1b[2J{GREEN}{BOLD}✨ Terminal cleared! Ready for new conversation.{RESET}\n")
}

pub fn empty_input_hint() -> String {
    format!("{YELLOW}Please enter some text.{RESET}")
}

pub fn goodbye_text() -> String {
    format!("{GREEN}{BOLD}👋 Goodbye!{RESET}")
}

pub fn cancelled_text() -> String {
    format!("{DIM}Turn cancelled.{RESET}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::tools::ToolRegistry;
    use std::path::PathBuf;

    #[test]
    fn wrap_lines_splits_long_lines() {
        let long = "a".repeat(85);
        let lines = wrap_lines(&format!("{long}\nshort"), 80);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 80);
        assert_eq!(lines[1], "aaaaa");
        assert_eq!(lines[2], "short");
    }

    #[test]
    fn wrap_lines_counts_characters_not_bytes() {
        let lines = wrap_lines("ééé", 2);
        assert_eq!(lines, vec!["éé".to_string(), "é".to_string()]);
    }

    #[test]
    fn error_box_is_padded_to_widest_line() {
        let rendered = format_error("short\na somewhat longer error line");
        let rows: Vec<&str> = rendered.lines().collect();
        // title, top rule, two content rows, bottom rule
        assert_eq!(rows.len(), 5);
        assert!(rows[0].contains("Error"));
        assert!(rows[2].contains("short"));
        assert!(rows[3].contains("a somewhat longer error line"));
        assert_eq!(
            rows[2].chars().count(),
            rows[3].chars().count(),
            "content rows should have equal width"
        );
    }

    #[test]
    fn config_text_masks_the_key_and_lists_tools() {
        let gateway = GatewayConfig {
            endpoint: "https://example.openai.azure.com".to_string(),
            api_key: "sk-super-secret-key".to_string(),
            api_version: Some("2024-10-21".to_string()),
            model: "gpt-4.1".to_string(),
        };
        let config = Config::new(gateway, PathBuf::from("/work"));
        let text = config_text(&config, &ToolRegistry::new().describe());

        assert!(!text.contains("sk-super-secret-key"));
        assert!(text.contains("gpt-4.1"));
        assert!(text.contains("2024-10-21"));
        assert!(text.contains("  - delete_file:"));
        assert!(text.contains("  - mkdir:"));
    }
}
