//! Input handling and turn orchestration.
//!
//! [`ChatController`] owns the conversation, the session's markdown
//! renderer, the surface, and the transport. A submission appends the user
//! message and then drives exactly one turn to completion:
//!
//! 1. thinking on, render
//! 2. send the request and wait for headers
//! 3. begin the agent message, render
//! 4. append every streamed fragment, rendering after each
//! 5. thinking off, close the reply, render
//!
//! Turns never overlap. The controller tracks [`TurnState`] explicitly and
//! refuses submissions unless it is [`Idle`](TurnState::Idle).

use std::sync::Arc;
use std::time::Instant;

use crate::conversation::Conversation;
use crate::error::{Error, Result};
use crate::markdown::MarkdownRenderer;
use crate::observability::{
    CLIPBOARD_ERRORS, CLIPBOARD_WRITES, STREAM_TTFB, SUBMISSIONS_BUSY, SUBMISSIONS_IGNORED,
    TURN_DURATION, TURNS_FAILED, TURNS_STARTED,
};
use crate::session_id::SessionId;
use crate::stream::{StreamSummary, consume_reply};
use crate::transport::{ChatRequest, Transport};
use crate::turn_logger::TurnLogger;
use crate::view::{Clipboard, Surface, refresh};

/// Where the controller is within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn in flight; submissions are accepted.
    Idle,
    /// The request is sent and response headers are pending.
    AwaitingResponse,
    /// The reply body is being consumed.
    Streaming,
}

/// Result of one submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The input was empty after trimming; nothing changed.
    Ignored,
    /// A turn was already in flight; nothing changed.
    Busy,
    /// The turn ran to the end of the reply stream.
    Completed(StreamSummary),
    /// The turn failed; the reply carries the error and the UI is idle again.
    Failed(Error),
}

impl SubmitOutcome {
    /// Returns true if the submission started a turn.
    pub fn started_turn(&self) -> bool {
        matches!(self, SubmitOutcome::Completed(_) | SubmitOutcome::Failed(_))
    }
}

/// Drives the chat: input in, rendered conversation out.
pub struct ChatController<T: Transport, S: Surface> {
    transport: T,
    surface: S,
    session_id: SessionId,
    conversation: Conversation,
    markdown: MarkdownRenderer,
    state: TurnState,
    logger: Option<Arc<dyn TurnLogger>>,
}

impl<T: Transport, S: Surface> ChatController<T, S> {
    /// Creates a controller with an empty conversation.
    pub fn new(transport: T, surface: S, session_id: SessionId) -> Self {
        Self {
            transport,
            surface,
            session_id,
            conversation: Conversation::new(),
            markdown: MarkdownRenderer::new(),
            state: TurnState::Idle,
            logger: None,
        }
    }

    /// Attaches a logger that observes every turn.
    pub fn with_logger(mut self, logger: Arc<dyn TurnLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the conversation.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the current turn state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Returns the session identifier sent with every turn.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Returns the surface for mutation, e.g. to type into the input.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Returns the identifiers of the code blocks currently displayed.
    pub fn code_block_ids(&self) -> Vec<&str> {
        self.markdown.registry().ids()
    }

    /// Re-renders the whole view.
    pub fn render(&mut self) -> Result<()> {
        refresh(&self.conversation, &mut self.markdown, &mut self.surface)
    }

    /// Handles a submission of the input control's current value.
    ///
    /// Blank input is ignored without touching the field. Otherwise the user
    /// message is appended, the field is cleared, and one turn runs to
    /// completion before this returns.
    ///
    /// # Errors
    ///
    /// Only surface failures are returned as `Err`. Transport and stream
    /// failures are reported as [`SubmitOutcome::Failed`] after the view
    /// shows them.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        if self.state != TurnState::Idle {
            SUBMISSIONS_BUSY.click();
            return Ok(SubmitOutcome::Busy);
        }
        let text = self.surface.input_value().trim().to_string();
        if text.is_empty() {
            SUBMISSIONS_IGNORED.click();
            return Ok(SubmitOutcome::Ignored);
        }

        self.conversation.append_user_message(text.clone());
        self.surface.clear_input();
        self.render()?;
        self.run_turn(text).await
    }

    /// Copies the text of a displayed code block to `clipboard`.
    ///
    /// Returns false when `id` is not on screen. Clipboard failures are
    /// logged and otherwise ignored.
    pub fn copy_code_block(&self, id: &str, clipboard: &mut dyn Clipboard) -> bool {
        let Some(text) = self.markdown.code_block_text(id) else {
            return false;
        };
        CLIPBOARD_WRITES.click();
        if let Err(err) = clipboard.write_text(text) {
            CLIPBOARD_ERRORS.click();
            if let Some(logger) = &self.logger {
                logger.log_clipboard_error(id, &err);
            }
        }
        true
    }

    async fn run_turn(&mut self, message: String) -> Result<SubmitOutcome> {
        let started = Instant::now();
        TURNS_STARTED.click();
        let outcome = self.drive_turn(message).await;

        self.state = TurnState::Idle;
        self.conversation.set_thinking(false);
        TURN_DURATION.add(started.elapsed().as_secs_f64());

        match outcome {
            Ok(summary) => {
                self.conversation.finish_agent_message();
                if let (Some(logger), Some(reply)) = (&self.logger, self.conversation.last()) {
                    logger.log_turn_complete(reply.content());
                }
                self.render()?;
                Ok(SubmitOutcome::Completed(summary))
            }
            Err(err) => {
                TURNS_FAILED.click();
                if let Some(logger) = &self.logger {
                    logger.log_turn_failed(&err);
                }
                self.conversation.fail_agent_message(err.to_string());
                self.render()?;
                Ok(SubmitOutcome::Failed(err))
            }
        }
    }

    async fn drive_turn(&mut self, message: String) -> Result<StreamSummary> {
        self.state = TurnState::AwaitingResponse;
        self.conversation.set_thinking(true);
        self.render()?;

        let request = ChatRequest::new(message, self.session_id.as_str());
        if let Some(logger) = &self.logger {
            logger.log_request(&request);
        }
        let sent = Instant::now();
        let body = self.transport.send(&request).await?;

        self.state = TurnState::Streaming;
        self.conversation.begin_agent_message()?;
        self.render()?;

        let markdown = &mut self.markdown;
        let surface = &mut self.surface;
        let logger = self.logger.as_deref();
        let mut first_fragment = true;
        let mut render_error = None;
        let summary = consume_reply(body, &mut self.conversation, |conversation, fragment| {
            if first_fragment {
                STREAM_TTFB.add(sent.elapsed().as_secs_f64());
                first_fragment = false;
            }
            if let Some(logger) = logger {
                logger.log_fragment(fragment);
            }
            if render_error.is_none()
                && let Err(err) = refresh(conversation, markdown, surface)
            {
                render_error = Some(err);
            }
        })
        .await?;

        match render_error {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}
