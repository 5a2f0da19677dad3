//! Escaping of untrusted text for embedding in markup.
//!
//! [`escape`] is applied exactly once on every display path: raw user text,
//! and plain-text segments of agent markdown. It is not idempotent.

/// Escapes `& < > ' "` into entities and leaves every other character alone.
///
/// `None` is treated as the empty string.
///
/// ```rust
/// use streamchat::escape;
///
/// assert_eq!(escape("<b>\"hi\" & 'bye'</b>"), "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;");
/// assert_eq!(escape(None), "");
/// ```
pub fn escape<'a>(text: impl Into<Option<&'a str>>) -> String {
    let Some(text) = text.into() else {
        return String::new();
    };
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
