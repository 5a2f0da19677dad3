//! Interactive chat client for a streaming chat backend.
//!
//! Each line typed at the prompt is submitted as one turn. The reply is echoed
//! to the terminal as it streams, and the full conversation is rendered to an
//! HTML page after every change.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on localhost:8001
//! streamchat
//!
//! # Another backend, with the page written elsewhere
//! streamchat --endpoint https://chat.example.com/chat --output /tmp/chat.html
//!
//! # Read settings from a YAML file
//! streamchat --config streamchat.yaml
//! ```
//!
//! # Commands
//!
//! - `/blocks` - List code blocks on screen
//! - `/copy <id>` - Copy a code block with the configured clipboard command
//! - `/session` - Show the session id
//! - `/stats` - Show conversation statistics
//! - `/help` - Show available commands
//! - `/quit` - Exit the application

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use streamchat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, ChatRequest, Clipboard, Error,
    FileSurface, HttpTransport, SessionId, SubmitOutcome, Surface, TurnLogger, help_text,
    parse_command,
};

/// ANSI escape code for dim text.
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for red text.
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Echoes each turn to the terminal.
struct TerminalLogger {
    use_color: bool,
}

impl TerminalLogger {
    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl TurnLogger for TerminalLogger {
    fn log_request(&self, _: &ChatRequest) {
        print!("{}", self.styled(ANSI_DIM, "Thinking..."));
        let _ = io::stdout().flush();
    }

    fn log_fragment(&self, fragment: &str) {
        print!("{fragment}");
        let _ = io::stdout().flush();
    }

    fn log_turn_complete(&self, _: &str) {
        println!("\n");
    }

    fn log_turn_failed(&self, error: &Error) {
        println!("\n{}\n", self.styled(ANSI_RED, &format!("Error: {error}")));
    }

    fn log_clipboard_error(&self, block_id: &str, error: &Error) {
        eprintln!(
            "{}",
            self.styled(ANSI_RED, &format!("Failed to copy {block_id}: {error}"))
        );
    }
}

/// Pipes copied text into an external command such as `wl-copy` or `pbcopy`.
struct CommandClipboard {
    command: String,
}

impl Clipboard for CommandClipboard {
    fn write_text(&mut self, text: &str) -> streamchat::Result<()> {
        let mut parts = self.command.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(Error::config(
                "clipboard command is empty",
                Some("clipboard_command".to_string()),
            ));
        };
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|err| Error::io(format!("failed to run {program}"), err))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|err| Error::io(format!("failed to write to {program}"), err))?;
        }
        let status = child
            .wait()
            .map_err(|err| Error::io(format!("failed to wait for {program}"), err))?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::io(
                format!("{program} failed"),
                io::Error::other(format!("exited with {status}")),
            ))
        }
    }
}

/// Main entry point for the streamchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("streamchat [OPTIONS]");
    let config = ChatConfig::from_args(args)?;
    let use_color = config.use_color;

    let endpoint = config.endpoint_url()?;
    let transport = HttpTransport::new(endpoint, Some(config.timeout))?;
    let session_id = SessionId::load_or_create(&config.session_file)?;
    let surface = FileSurface::new(&config.output);
    let logger = TerminalLogger { use_color };
    let mut controller =
        ChatController::new(transport, surface, session_id).with_logger(Arc::new(logger));
    let mut clipboard = config
        .clipboard_command
        .clone()
        .map(|command| CommandClipboard { command });
    controller.render()?;

    let mut rl = DefaultEditor::new()?;
    println!("streamchat ({})", config.endpoint);
    println!("Rendering to {}", config.output.display());
    println!("Type /help for commands, /quit to exit\n");

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Blocks => {
                            let ids = controller.code_block_ids();
                            if ids.is_empty() {
                                println!("    (no code blocks on screen)");
                            }
                            for id in ids {
                                println!("    {id}");
                            }
                        }
                        ChatCommand::Copy(id) => match clipboard.as_mut() {
                            Some(clipboard) => {
                                if controller.copy_code_block(&id, clipboard) {
                                    println!("    Copied {id}.");
                                } else {
                                    print_error(use_color, &format!("No code block {id}"));
                                }
                            }
                            None => print_error(
                                use_color,
                                "No clipboard command configured (use --clipboard-command)",
                            ),
                        },
                        ChatCommand::Session => {
                            println!("    Session: {}", controller.session_id());
                        }
                        ChatCommand::Stats => {
                            let conversation = controller.conversation();
                            println!("    Conversation Statistics:");
                            println!("      Messages: {}", conversation.len());
                            println!(
                                "      Code blocks: {}",
                                controller.code_block_ids().len()
                            );
                            println!("      Session: {}", controller.session_id());
                            println!("      Page: {}", config.output.display());
                        }
                        ChatCommand::Invalid(message) => print_error(use_color, &message),
                    }
                    continue;
                }

                controller.surface_mut().set_input(line);
                println!("Agent:");
                match controller.submit().await {
                    Ok(SubmitOutcome::Busy) => print_error(use_color, "A reply is in progress"),
                    Ok(_) => {}
                    Err(err) => print_error(use_color, &format!("Display error: {err}")),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                print_error(use_color, &format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_error(use_color: bool, message: &str) {
    if use_color {
        eprintln!("{ANSI_RED}{message}{ANSI_RESET}");
    } else {
        eprintln!("{message}");
    }
}
