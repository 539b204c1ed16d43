//! Interactive host: line commands, rendering and the read-eval loop.

mod repl;
pub mod ui;

pub use repl::Repl;

/// One line of user input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Quit,
    Help,
    Config,
    Clear,
    /// Blank line
    Empty,
    /// Anything else becomes a user message
    Prompt(&'a str),
}

impl<'a> Command<'a> {
    /// Classify a line. Commands match case-insensitively after trimming.
    pub fn parse(line: &'a str) -> Self {
        let input = line.trim();
        if input.is_empty() {
            return Command::Empty;
        }
        match input.to_ascii_lowercase().as_str() {
            "--quit" => Command::Quit,
            "--help" => Command::Help,
            "--config" => Command::Config,
            "--clear" => Command::Clear,
            _ => Command::Prompt(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_case_insensitive_and_trimmed() {
        assert_eq!(Command::parse("--quit"), Command::Quit);
        assert_eq!(Command::parse("  --QUIT \n"), Command::Quit);
        assert_eq!(Command::parse("--Help"), Command::Help);
        assert_eq!(Command::parse("--config"), Command::Config);
        assert_eq!(Command::parse("--CLEAR"), Command::Clear);
    }

    #[test]
    fn blank_lines_are_empty() {
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("   \t"), Command::Empty);
    }

    #[test]
    fn other_input_is_a_trimmed_prompt() {
        assert_eq!(
            Command::parse("  list the files here  "),
            Command::Prompt("list the files here")
        );
        assert_eq!(Command::parse("--quit now"), Command::Prompt("--quit now"));
        assert_eq!(Command::parse("quit"), Command::Prompt("quit"));
    }
}
