//! Markdown to HTML conversion for agent replies.
//!
//! Conversion runs on pulldown-cmark events. Two constructs are handed to
//! caller-supplied hooks ([`RenderHooks`]): fenced/indented code blocks and
//! links. Everything else uses the standard HTML writer, except that plain
//! text and raw HTML go through [`escape`](crate::escape) so agent output can
//! never inject markup.
//!
//! The renderer is invoked on a growing prefix of the final reply while it
//! streams. pulldown-cmark closes unterminated constructs (an open code
//! fence runs to the end of the input), so a partial reply renders as a
//! best-effort prefix and the final render is correct once the stream ends.

use std::collections::HashMap;

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd, html};

use crate::sanitize::escape;

/// URL schemes that are never emitted as a link target.
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Override hooks for the constructs the chat view renders itself.
pub struct RenderHooks<'a> {
    /// Receives the raw code text and the optional language tag.
    pub code_block: Box<dyn FnMut(&str, Option<&str>) -> String + 'a>,
    /// Receives the raw href, optional title, and plain link text.
    pub link: Box<dyn FnMut(&str, Option<&str>, &str) -> String + 'a>,
}

enum Capture {
    Code {
        lang: Option<String>,
        code: String,
    },
    Link {
        href: String,
        title: Option<String>,
        text: String,
    },
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Converts `markdown` to HTML, routing code blocks and links through `hooks`.
pub fn render_markdown(markdown: &str, hooks: &mut RenderHooks<'_>) -> String {
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut capture: Option<Capture> = None;
    let mut image_depth = 0usize;

    for event in Parser::new_ext(markdown, markdown_options()) {
        match capture.take() {
            Some(Capture::Code { lang, mut code }) => match event {
                Event::End(TagEnd::CodeBlock) => {
                    let html = (hooks.code_block)(&code, lang.as_deref());
                    events.push(Event::Html(html.into()));
                }
                Event::Text(text) => {
                    code.push_str(&text);
                    capture = Some(Capture::Code { lang, code });
                }
                _ => capture = Some(Capture::Code { lang, code }),
            },
            Some(Capture::Link {
                href,
                title,
                mut text,
            }) => match event {
                Event::End(TagEnd::Link) => {
                    let html = (hooks.link)(&href, title.as_deref(), &text);
                    events.push(Event::InlineHtml(html.into()));
                }
                Event::Text(part) | Event::Code(part) => {
                    text.push_str(&part);
                    capture = Some(Capture::Link { href, title, text });
                }
                Event::SoftBreak | Event::HardBreak => {
                    text.push(' ');
                    capture = Some(Capture::Link { href, title, text });
                }
                _ => capture = Some(Capture::Link { href, title, text }),
            },
            None => match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    capture = Some(Capture::Code {
                        lang,
                        code: String::new(),
                    });
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    ..
                }) => {
                    let href = if link_type == LinkType::Email {
                        format!("mailto:{dest_url}")
                    } else {
                        dest_url.to_string()
                    };
                    capture = Some(Capture::Link {
                        href,
                        title: (!title.is_empty()).then(|| title.to_string()),
                        text: String::new(),
                    });
                }
                event @ Event::Start(Tag::Image { .. }) => {
                    image_depth += 1;
                    events.push(event);
                }
                event @ Event::End(TagEnd::Image) => {
                    image_depth = image_depth.saturating_sub(1);
                    events.push(event);
                }
                // Alt text is escaped by the writer itself.
                Event::Text(text) if image_depth == 0 => {
                    events.push(Event::InlineHtml(escape(&*text).into()));
                }
                Event::Html(raw) | Event::InlineHtml(raw) => {
                    if image_depth == 0 {
                        events.push(Event::InlineHtml(escape(&*raw).into()));
                    } else {
                        events.push(Event::Text(raw));
                    }
                }
                other => events.push(other),
            },
        }
    }

    match capture {
        Some(Capture::Code { lang, code }) => {
            events.push(Event::Html((hooks.code_block)(&code, lang.as_deref()).into()));
        }
        Some(Capture::Link { text, .. }) => {
            events.push(Event::InlineHtml(escape(text.as_str()).into()));
        }
        None => {}
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Renders an anchor that opens in a new browsing context without an opener.
pub fn safe_link(href: &str, title: Option<&str>, text: &str) -> String {
    let href = if has_unsafe_scheme(href) { "#" } else { href };
    let title = title
        .map(|title| format!(" title=\"{}\"", escape(title)))
        .unwrap_or_default();
    format!(
        r#"<a href="{}"{title} target="_blank" rel="noopener noreferrer">{}</a>"#,
        escape(href),
        escape(text)
    )
}

fn has_unsafe_scheme(href: &str) -> bool {
    let normalized: String = href
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    UNSAFE_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

/// Renders a code block container with a copy control scoped to `id`.
pub fn code_block_html(id: &str, code: &str, lang: Option<&str>) -> String {
    let class = lang
        .filter(|lang| !lang.is_empty())
        .map(|lang| format!(" class=\"language-{}\"", escape(lang)))
        .unwrap_or_default();
    format!(
        concat!(
            r#"<div class="code-block">"#,
            r#"<button type="button" class="copy-btn" data-copy-target="{id}" "#,
            r#"onclick="navigator.clipboard.writeText(document.getElementById('{id}').innerText)">Copy</button>"#,
            r#"<pre><code id="{id}"{class}>{code}</code></pre>"#,
            "</div>\n",
        ),
        id = id,
        class = class,
        code = escape(code),
    )
}

/// Generator for code block identifiers that never repeat within a session.
#[derive(Debug, Default)]
pub struct CodeBlockIds {
    next: u64,
}

impl CodeBlockIds {
    /// Creates a generator starting at `code-0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh identifier.
    pub fn next_id(&mut self) -> String {
        let id = format!("code-{}", self.next);
        self.next += 1;
        id
    }
}

/// Raw text of the code blocks present in the latest full render.
#[derive(Debug, Default)]
pub struct CodeBlockRegistry {
    blocks: HashMap<String, String>,
}

impl CodeBlockRegistry {
    /// Forgets every block.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Records the text behind `id`.
    pub fn insert(&mut self, id: String, code: String) {
        self.blocks.insert(id, code);
    }

    /// Returns the text behind `id`, if that block is still displayed.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.blocks.get(id).map(String::as_str)
    }

    /// Returns the registered identifiers in render order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.blocks.keys().map(String::as_str).collect();
        ids.sort_by_key(|id| id.trim_start_matches("code-").parse::<u64>().unwrap_or(u64::MAX));
        ids
    }

    /// Returns the number of registered blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no block is registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Session-scoped agent markdown renderer.
///
/// Owns the identifier generator so that identifiers stay unique across
/// every render of every agent message in the session.
#[derive(Debug, Default)]
pub struct MarkdownRenderer {
    ids: CodeBlockIds,
    registry: CodeBlockRegistry,
}

impl MarkdownRenderer {
    /// Creates a renderer with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new full render; blocks from the previous one are dropped.
    pub fn begin_pass(&mut self) {
        self.registry.clear();
    }

    /// Converts agent markdown into HTML that is safe to insert into the view.
    pub fn render_agent_markdown(&mut self, markdown: &str) -> String {
        let ids = &mut self.ids;
        let registry = &mut self.registry;
        let mut hooks = RenderHooks {
            code_block: Box::new(|code, lang| {
                let id = ids.next_id();
                let html = code_block_html(&id, code, lang);
                registry.insert(id, code.to_string());
                html
            }),
            link: Box::new(safe_link),
        };
        render_markdown(markdown, &mut hooks)
    }

    /// Returns the raw text of a displayed code block.
    pub fn code_block_text(&self, id: &str) -> Option<&str> {
        self.registry.get(id)
    }

    /// Returns the blocks registered by the latest render.
    pub fn registry(&self) -> &CodeBlockRegistry {
        &self.registry
    }
}
