//! Slash command parsing for the chat REPL.
//!
//! Input starting with `/` controls the client instead of being sent to the
//! agent.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// List the code blocks currently displayed.
    Blocks,

    /// Copy a displayed code block to the clipboard.
    Copy(String),

    /// Show the session identifier.
    Session,

    /// Display conversation statistics.
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be submitted as a message.
///
/// # Examples
///
/// ```
/// # use streamchat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/copy code-3").is_some());
/// assert!(parse_command("Hello there").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "blocks" => ChatCommand::Blocks,
        "copy" => match argument {
            Some(id) => ChatCommand::Copy(normalize_block_id(id)),
            None => ChatCommand::Invalid("/copy requires a code block id".to_string()),
        },
        "session" => ChatCommand::Session,
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Accepts either `code-7` or a bare `7`.
fn normalize_block_id(id: &str) -> String {
    if id.chars().all(|c| c.is_ascii_digit()) {
        format!("code-{id}")
    } else {
        id.to_string()
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /blocks                List code blocks on screen
  /copy <id>             Copy a code block (e.g., /copy code-2 or /copy 2)
  /session               Show the session id
  /stats                 Show conversation statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_copy() {
        assert_eq!(
            parse_command("/copy code-4"),
            Some(ChatCommand::Copy("code-4".to_string()))
        );
        assert_eq!(
            parse_command("/COPY   12 "),
            Some(ChatCommand::Copy("code-12".to_string()))
        );
        assert_eq!(
            parse_command("/copy"),
            Some(ChatCommand::Invalid(
                "/copy requires a code block id".to_string()
            ))
        );
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("/blocks"), Some(ChatCommand::Blocks));
        assert_eq!(parse_command("/session"), Some(ChatCommand::Session));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(
            parse_command("/model x"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("Unknown command: /model")
        ));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello there!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_lists_commands() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/copy"));
        assert!(help.contains("/blocks"));
    }
}
