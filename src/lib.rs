// Public modules
pub mod commands;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod decode;
pub mod error;
pub mod markdown;
pub mod sanitize;
pub mod session_id;
pub mod stream;
pub mod transport;
pub mod turn_logger;
pub mod view;

mod observability;

// Re-exports
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use controller::{ChatController, SubmitOutcome, TurnState};
pub use conversation::{Conversation, Message, Role};
pub use decode::StreamDecoder;
pub use error::{Error, Result};
pub use markdown::{MarkdownRenderer, RenderHooks, render_markdown};
pub use observability::register_biometrics;
pub use sanitize::escape;
pub use session_id::SessionId;
pub use stream::{StreamSummary, consume_reply};
pub use transport::{ChatRequest, HttpTransport, ReplyBody, Transport};
pub use turn_logger::TurnLogger;
pub use view::{Clipboard, FileSurface, MemorySurface, Surface, refresh, render_view};
