//! Logging trait for chat turns.
//!
//! This module provides the [`TurnLogger`] trait that lets callers observe
//! every turn driven by a [`ChatController`](crate::ChatController): the
//! outbound request, each decoded fragment, and how the turn ended.

use crate::error::Error;
use crate::transport::ChatRequest;

/// A trait for logging chat turn activity.
///
/// Implement this trait to capture what the controller sends and receives.
/// Every method has an empty default so implementors pick what they need.
///
/// # Example
///
/// ```rust,ignore
/// use streamchat::{ChatRequest, TurnLogger};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl TurnLogger for FileLogger {
///     fn log_request(&self, request: &ChatRequest) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "request: {}", serde_json::to_string(request).unwrap()).unwrap();
///     }
///
///     fn log_fragment(&self, fragment: &str) {
///         let mut file = self.file.lock().unwrap();
///         write!(file, "{fragment}").unwrap();
///     }
/// }
/// ```
pub trait TurnLogger: Send + Sync {
    /// Called once per turn, before the request is sent.
    fn log_request(&self, request: &ChatRequest) {
        _ = request;
    }

    /// Called for each decoded fragment appended to the reply.
    fn log_fragment(&self, fragment: &str) {
        _ = fragment;
    }

    /// Called when the reply stream ends normally.
    fn log_turn_complete(&self, reply: &str) {
        _ = reply;
    }

    /// Called when the turn ends with a transport or stream error.
    fn log_turn_failed(&self, error: &Error) {
        _ = error;
    }

    /// Called when a clipboard write fails. The failure is not surfaced otherwise.
    fn log_clipboard_error(&self, block_id: &str, error: &Error) {
        _ = (block_id, error);
    }
}
