//! Consumption of a streamed agent reply.
//!
//! [`consume_reply`] is the only reader of network data. It owns the body for
//! one turn, decodes each chunk with a carry-over [`StreamDecoder`], appends
//! the text to the conversation's composing tail, and calls back after every
//! append so the view can re-render.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::conversation::Conversation;
use crate::decode::StreamDecoder;
use crate::error::Result;
use crate::observability::{DECODE_REPLACEMENTS, STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};

/// What one reply stream delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Number of chunks pulled from the body.
    pub chunks: u64,
    /// Number of raw bytes received.
    pub bytes: u64,
    /// Number of fragments appended to the reply.
    pub fragments: u64,
    /// Number of U+FFFD characters substituted for malformed input.
    pub replacements: u64,
}

/// Drains `body` into the conversation's composing tail.
///
/// `on_fragment` runs after every append with the updated conversation and
/// the fragment just added. Fragments are applied strictly in arrival order.
/// A chunk that only holds the start of a character produces no fragment;
/// the character is emitted with the next chunk.
///
/// # Errors
///
/// Returns the body's error if the stream aborts mid-read, and
/// [`Error::InvalidState`](crate::Error::InvalidState) if the conversation
/// has no composing agent tail. Text received before an error stays in the
/// conversation.
pub async fn consume_reply<S, F>(
    mut body: S,
    conversation: &mut Conversation,
    mut on_fragment: F,
) -> Result<StreamSummary>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
    F: FnMut(&Conversation, &str),
{
    let mut decoder = StreamDecoder::new();
    let mut summary = StreamSummary::default();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                STREAM_ERRORS.click();
                return Err(err);
            }
        };
        STREAM_CHUNKS.click();
        STREAM_BYTES.count(chunk.len() as u64);
        summary.chunks += 1;
        summary.bytes += chunk.len() as u64;

        let fragment = decoder.decode(&chunk);
        if fragment.is_empty() {
            continue;
        }
        conversation.append_to_last_message(&fragment)?;
        summary.fragments += 1;
        on_fragment(conversation, &fragment);
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        conversation.append_to_last_message(&tail)?;
        summary.fragments += 1;
        on_fragment(conversation, &tail);
    }

    summary.replacements = decoder.replacements();
    DECODE_REPLACEMENTS.count(summary.replacements);
    Ok(summary)
}
