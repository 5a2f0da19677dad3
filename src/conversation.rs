//! The in-memory conversation log.
//!
//! A [`Conversation`] is an ordered, append-only list of [`Message`]s plus
//! the "agent is thinking" flag. Only the tail may change, and only while it
//! is an agent message in composing state. Nothing here is ever persisted.

use std::fmt;

use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person typing into the input control.
    User,
    /// The remote agent.
    Agent,
}

impl Role {
    /// Returns the lowercase role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    role: Role,
    content: String,
    time: OffsetDateTime,
    error: Option<String>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            time: now(),
            error: None,
        }
    }

    /// Returns the author of the message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text received so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the wall-clock time at which the message entered the log.
    pub fn time(&self) -> OffsetDateTime {
        self.time
    }

    /// Returns the transport error that cut this reply short, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Ordered message log with at most one composing tail.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    thinking: bool,
    composing: bool,
}

impl Conversation {
    /// Creates an empty conversation that is not thinking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user message. `text` must already be trimmed and non-empty.
    pub fn append_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(Role::User, text.into()));
    }

    /// Appends an empty agent message that becomes the composing tail.
    pub fn begin_agent_message(&mut self) -> Result<()> {
        if self.composing {
            return Err(Error::invalid_state(
                "an agent message is already composing",
            ));
        }
        self.messages.push(Message::new(Role::Agent, String::new()));
        self.composing = true;
        Ok(())
    }

    /// Concatenates `fragment` onto the composing tail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] when the tail is not a composing agent
    /// message. That is a caller bug, not a runtime condition.
    pub fn append_to_last_message(&mut self, fragment: &str) -> Result<()> {
        match self.messages.last_mut() {
            Some(tail) if self.composing && tail.role == Role::Agent => {
                tail.content.push_str(fragment);
                Ok(())
            }
            _ => Err(Error::invalid_state(
                "append_to_last_message requires a composing agent tail",
            )),
        }
    }

    /// Closes the composing tail; its content is immutable from here on.
    pub fn finish_agent_message(&mut self) {
        self.composing = false;
    }

    /// Marks the current reply as failed and closes it.
    ///
    /// If no agent message was started for this turn, an empty one is
    /// appended to carry the error.
    pub fn fail_agent_message(&mut self, reason: impl Into<String>) {
        if !self.composing {
            self.messages.push(Message::new(Role::Agent, String::new()));
        }
        if let Some(tail) = self.messages.last_mut() {
            tail.error = Some(reason.into());
        }
        self.composing = false;
    }

    /// Sets the flag that shows the thinking indicator.
    pub fn set_thinking(&mut self, thinking: bool) {
        self.thinking = thinking;
    }

    /// Returns true while the thinking indicator should be shown.
    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Returns true while the tail agent message is accumulating fragments.
    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Returns the messages in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the tail message.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
