//! Incremental UTF-8 decoding of response body chunks.
//!
//! Chunk boundaries fall anywhere, including inside a multi-byte character.
//! [`StreamDecoder`] carries the incomplete suffix of one chunk over to the
//! next instead of decoding every chunk in isolation. Malformed sequences are
//! replaced with U+FFFD rather than failing the turn.

use std::str;

/// The Unicode replacement character.
pub const REPLACEMENT: char = '\u{FFFD}';

/// Stateful UTF-8 decoder for a byte stream of unknown chunking.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    replacements: u64,
}

impl StreamDecoder {
    /// Creates a decoder with no carried-over bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `chunk`, holding back a trailing partial character.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            self.replacements += 1;
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flushes the decoder at end of stream.
    ///
    /// A character left incomplete by the final chunk becomes one U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            self.replacements += 1;
            REPLACEMENT.to_string()
        }
    }

    /// Returns true if bytes are waiting for the rest of their character.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns how many replacement characters have been produced.
    pub fn replacements(&self) -> u64 {
        self.replacements
    }
}
