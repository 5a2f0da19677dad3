//! Projection of the conversation into markup, and the surfaces it lands on.
//!
//! [`render_view`] is a pure function of the conversation (plus the
//! session's markdown renderer, which hands out code block identifiers).
//! [`refresh`] installs the result on a [`Surface`] and then restores the
//! two pieces of UI state a full replacement destroys: the message list is
//! scrolled to the bottom and the input control regains focus.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::conversation::{Conversation, Message, Role};
use crate::error::{Error, Result};
use crate::markdown::MarkdownRenderer;
use crate::observability::VIEW_RENDERS;
use crate::sanitize::escape;

/// Element id of the scrollable message list.
pub const CHAT_AREA_ID: &str = "chat-area";
/// Element id of the text input control.
pub const CHAT_INPUT_ID: &str = "chat-input";
/// Element id of the submission form.
pub const CHAT_FORM_ID: &str = "chat-form";

const USER_AVATAR: &str = "https://api.dicebear.com/7.x/identicon/svg?seed=user";
const AGENT_AVATAR: &str = "https://api.dicebear.com/7.x/bottts/svg?seed=agent";

/// Label shown in the transient thinking bubble.
pub const THINKING_LABEL: &str = "Thinking...";

///////////////////////////////////////////// Surface ////////////////////////////////////////////

/// The display the view renders into.
///
/// A surface owns one container whose content is fully replaced on every
/// [`install`](Surface::install), a message list, and a text input.
pub trait Surface {
    /// Replaces the container's content with `markup`.
    fn install(&mut self, markup: &str) -> Result<()>;

    /// Scrolls the message list to its maximum offset.
    fn scroll_to_bottom(&mut self);

    /// Gives keyboard focus to the text input.
    fn focus_input(&mut self);

    /// Returns the current value of the text input.
    fn input_value(&self) -> &str;

    /// Replaces the value of the text input.
    fn set_input(&mut self, value: &str);

    /// Empties the text input.
    fn clear_input(&mut self) {
        self.set_input("");
    }
}

/// Destination for the copy control of a code block.
pub trait Clipboard {
    /// Writes `text` to the clipboard.
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// In-memory surface that records everything installed on it.
#[derive(Debug, Default)]
pub struct MemorySurface {
    history: Vec<String>,
    input: String,
    at_bottom: bool,
    focused: bool,
}

impl MemorySurface {
    /// Creates a blank surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the markup currently installed.
    pub fn markup(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or("")
    }

    /// Returns every markup string installed so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Returns the number of installs.
    pub fn installs(&self) -> usize {
        self.history.len()
    }

    /// Returns true if the message list is scrolled to the bottom.
    pub fn is_at_bottom(&self) -> bool {
        self.at_bottom
    }

    /// Returns true if the input control has focus.
    pub fn is_input_focused(&self) -> bool {
        self.focused
    }
}

impl Surface for MemorySurface {
    fn install(&mut self, markup: &str) -> Result<()> {
        self.history.push(markup.to_string());
        // Replacing the container resets scroll and drops focus.
        self.at_bottom = false;
        self.focused = false;
        Ok(())
    }

    fn scroll_to_bottom(&mut self) {
        self.at_bottom = true;
    }

    fn focus_input(&mut self) {
        self.focused = true;
    }

    fn input_value(&self) -> &str {
        &self.input
    }

    fn set_input(&mut self, value: &str) {
        self.input = value.to_string();
    }
}

/// Surface that writes a standalone HTML page to disk on every install.
///
/// The page scrolls its message list and focuses its input when loaded, so
/// [`scroll_to_bottom`](Surface::scroll_to_bottom) and
/// [`focus_input`](Surface::focus_input) have nothing further to do.
#[derive(Debug)]
pub struct FileSurface {
    path: PathBuf,
    input: String,
}

impl FileSurface {
    /// Creates a surface that writes to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            input: String::new(),
        }
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Surface for FileSurface {
    fn install(&mut self, markup: &str) -> Result<()> {
        let page = render_page(markup);
        let tmp = self.path.with_extension("html.tmp");
        fs::write(&tmp, page).map_err(|err| {
            Error::io(format!("failed to write {}", tmp.display()), err)
        })?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            Error::io(format!("failed to replace {}", self.path.display()), err)
        })
    }

    fn scroll_to_bottom(&mut self) {}

    fn focus_input(&mut self) {}

    fn input_value(&self) -> &str {
        &self.input
    }

    fn set_input(&mut self, value: &str) {
        self.input = value.to_string();
    }
}

/// Wraps view markup in a complete HTML document.
pub fn render_page(markup: &str) -> String {
    format!(
        concat!(
            "<!doctype html>\n",
            "<html>\n<head>\n<meta charset=\"utf-8\">\n<title>streamchat</title>\n</head>\n",
            "<body>\n<div id=\"app\">{markup}</div>\n",
            "<script>\n",
            "const area = document.getElementById('{area}');\n",
            "if (area) area.scrollTop = area.scrollHeight;\n",
            "const input = document.getElementById('{input}');\n",
            "if (input) input.focus();\n",
            "</script>\n</body>\n</html>\n",
        ),
        markup = markup,
        area = CHAT_AREA_ID,
        input = CHAT_INPUT_ID,
    )
}

////////////////////////////////////////////// Render //////////////////////////////////////////////

/// Renders the whole conversation.
///
/// Agent content goes through the markdown renderer and user content
/// through [`escape`]; never both, never neither. When the conversation is
/// thinking, one extra indicator bubble follows the messages.
pub fn render_view(conversation: &Conversation, markdown: &mut MarkdownRenderer) -> String {
    markdown.begin_pass();
    let mut out = String::new();
    out.push_str(r#"<div class="chat-window">"#);
    let _ = write!(out, r#"<div id="{CHAT_AREA_ID}" class="chat-area">"#);
    for message in conversation.messages() {
        render_message(&mut out, message, markdown);
    }
    if conversation.is_thinking() {
        render_thinking(&mut out);
    }
    out.push_str("</div>");
    let _ = write!(
        out,
        concat!(
            r#"<form id="{form}" class="chat-form">"#,
            r#"<input id="{input}" type="text" placeholder="Type your message..." autocomplete="off" aria-label="Chat input" />"#,
            r#"<button type="submit" aria-label="Send">Send</button>"#,
            "</form>",
        ),
        form = CHAT_FORM_ID,
        input = CHAT_INPUT_ID,
    );
    out.push_str("</div>");
    out
}

fn render_message(out: &mut String, message: &Message, markdown: &mut MarkdownRenderer) {
    let role = message.role();
    let body = match role {
        Role::User => escape(message.content()),
        Role::Agent => markdown.render_agent_markdown(message.content()),
    };
    let _ = write!(
        out,
        concat!(
            r#"<div class="chat {side}" data-role="{role}">"#,
            r#"<div class="avatar"><img src="{avatar}" alt="{role}" /></div>"#,
            r#"<div><div class="chat-bubble">{body}"#,
        ),
        side = side(role),
        role = role,
        avatar = avatar(role),
        body = body,
    );
    if let Some(error) = message.error() {
        let _ = write!(
            out,
            r#"<div class="chat-error" role="alert">{}</div>"#,
            escape(error)
        );
    }
    let _ = write!(
        out,
        r#"</div><div class="chat-time">{}</div></div></div>"#,
        format_time(message.time())
    );
}

fn render_thinking(out: &mut String) {
    let _ = write!(
        out,
        concat!(
            r#"<div class="chat chat-start" data-role="thinking">"#,
            r#"<div class="avatar"><img src="{avatar}" alt="agent" /></div>"#,
            r#"<div><div class="chat-bubble">"#,
            r#"<span class="loading"></span><span class="thinking">{label}</span>"#,
            "</div></div></div>",
        ),
        avatar = AGENT_AVATAR,
        label = THINKING_LABEL,
    );
}

fn side(role: Role) -> &'static str {
    match role {
        Role::User => "chat-end",
        Role::Agent => "chat-start",
    }
}

fn avatar(role: Role) -> &'static str {
    match role {
        Role::User => USER_AVATAR,
        Role::Agent => AGENT_AVATAR,
    }
}

/// Formats a message time as `HH:MM`.
pub fn format_time(time: OffsetDateTime) -> String {
    time.format(format_description!("[hour]:[minute]"))
        .unwrap_or_default()
}

/// Renders the conversation onto `surface`, then scrolls and refocuses.
pub fn refresh<S: Surface + ?Sized>(
    conversation: &Conversation,
    markdown: &mut MarkdownRenderer,
    surface: &mut S,
) -> Result<()> {
    let markup = render_view(conversation, markdown);
    surface.install(&markup)?;
    surface.scroll_to_bottom();
    surface.focus_input();
    VIEW_RENDERS.click();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn bubbles(markup: &str) -> usize {
        markup.matches("<div class=\"chat ").count()
    }

    #[test]
    fn empty_conversation_has_list_and_input() {
        let mut markdown = MarkdownRenderer::new();
        let markup = render_view(&Conversation::new(), &mut markdown);
        assert!(markup.contains(r#"id="chat-area""#));
        assert!(markup.contains(r#"id="chat-input""#));
        assert_eq!(bubbles(&markup), 0);
        assert!(!markup.contains(THINKING_LABEL));
    }

    #[test]
    fn user_content_is_escaped_not_markdown() {
        let mut conversation = Conversation::new();
        conversation.append_user_message("**bold** <script>x</script>");
        let mut markdown = MarkdownRenderer::new();
        let markup = render_view(&conversation, &mut markdown);
        assert!(markup.contains("**bold** &lt;script&gt;x&lt;/script&gt;"));
        assert!(!markup.contains("<strong>"));
        assert!(markup.contains(r#"class="chat chat-end" data-role="user""#));
    }

    #[test]
    fn agent_content_is_markdown() {
        let mut conversation = Conversation::new();
        conversation.begin_agent_message().unwrap();
        conversation.append_to_last_message("**bold** & co").unwrap();
        let mut markdown = MarkdownRenderer::new();
        let markup = render_view(&conversation, &mut markdown);
        assert!(markup.contains("<strong>bold</strong> &amp; co"));
        assert!(markup.contains(r#"class="chat chat-start" data-role="agent""#));
    }

    #[test]
    fn thinking_adds_one_transient_bubble() {
        let mut conversation = Conversation::new();
        conversation.append_user_message("hello");
        conversation.set_thinking(true);
        let mut markdown = MarkdownRenderer::new();
        let markup = render_view(&conversation, &mut markdown);
        assert_eq!(bubbles(&markup), 2);
        assert_eq!(markup.matches(THINKING_LABEL).count(), 1);
        assert!(markup.find("hello").unwrap() < markup.find(THINKING_LABEL).unwrap());
    }

    #[test]
    fn failed_reply_shows_error_note() {
        let mut conversation = Conversation::new();
        conversation.append_user_message("hello");
        conversation.fail_agent_message("Connection error: <refused>");
        let mut markdown = MarkdownRenderer::new();
        let markup = render_view(&conversation, &mut markdown);
        assert!(markup.contains(
            r#"<div class="chat-error" role="alert">Connection error: &lt;refused&gt;</div>"#
        ));
    }

    #[test]
    fn refresh_scrolls_and_focuses() {
        let mut conversation = Conversation::new();
        conversation.append_user_message("hello");
        let mut markdown = MarkdownRenderer::new();
        let mut surface = MemorySurface::new();
        refresh(&conversation, &mut markdown, &mut surface).unwrap();
        assert_eq!(surface.installs(), 1);
        assert!(surface.is_at_bottom());
        assert!(surface.is_input_focused());
        assert!(surface.markup().contains("hello"));
    }

    #[test]
    fn time_is_hours_and_minutes() {
        assert_eq!(format_time(datetime!(2024-03-01 09:05:59 UTC)), "09:05");
        assert_eq!(format_time(datetime!(2024-03-01 23:41:00 +02:00)), "23:41");
    }

    #[test]
    fn page_wraps_markup() {
        let page = render_page("<p>x</p>");
        assert!(page.starts_with("<!doctype html>"));
        assert!(page.contains(r#"<div id="app"><p>x</p></div>"#));
        assert!(page.contains("getElementById('chat-input')"));
    }

    #[test]
    fn file_surface_replaces_page() {
        let path = std::env::temp_dir().join(format!(
            "streamchat-view-{}.html",
            std::process::id()
        ));
        let mut surface = FileSurface::new(&path);
        surface.install("<p>first</p>").unwrap();
        surface.install("<p>second</p>").unwrap();
        let page = std::fs::read_to_string(&path).unwrap();
        assert!(page.contains("second"));
        assert!(!page.contains("first"));
        std::fs::remove_file(&path).unwrap();
    }
}
