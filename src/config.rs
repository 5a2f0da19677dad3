//! Configuration types for the chat client.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! configuration file, and the resolved [`ChatConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::session_id::default_session_path;
use crate::transport::DEFAULT_TIMEOUT;

/// Default chat endpoint of a locally running backend.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8001/chat";

/// Default path of the rendered page.
pub const DEFAULT_OUTPUT: &str = "streamchat.html";

/// Command-line arguments for the streamchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Chat endpoint URL.
    #[arrrg(optional, "Chat endpoint (default: http://localhost:8001/chat)", "URL")]
    pub endpoint: Option<String>,

    /// File holding the session identifier.
    #[arrrg(optional, "File that stores the session id", "PATH")]
    pub session_file: Option<String>,

    /// Where the rendered page is written.
    #[arrrg(optional, "Rendered page path (default: streamchat.html)", "PATH")]
    pub output: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 300)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Command that receives copied code on stdin.
    #[arrrg(optional, "Clipboard command (e.g. wl-copy, pbcopy)", "CMD")]
    pub clipboard_command: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Values accepted from a YAML configuration file.
///
/// Every field is optional; missing fields keep their defaults.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub session_file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub clipboard_command: Option<String>,
    pub color: Option<bool>,
}

/// Resolved configuration for a chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// The chat endpoint receiving `POST` requests.
    pub endpoint: String,

    /// File holding the session identifier.
    pub session_file: PathBuf,

    /// Where the rendered page is written.
    pub output: PathBuf,

    /// Bound on a whole request, including the streamed reply.
    pub timeout: Duration,

    /// Command that receives copied code on stdin.
    pub clipboard_command: Option<String>,

    /// Whether to use ANSI colors and styles in terminal output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: http://localhost:8001/chat
    /// - Timeout: 300 seconds
    /// - Output: streamchat.html
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            session_file: default_session_path(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            timeout: DEFAULT_TIMEOUT,
            clipboard_command: None,
            use_color: true,
        }
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the session id file.
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Sets the rendered page path.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the clipboard command.
    pub fn with_clipboard_command(mut self, command: Option<String>) -> Self {
        self.clipboard_command = command;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Loads a YAML file on top of the defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Self::from_yaml_str(&text)
    }

    /// Parses YAML text on top of the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let file: FileConfig = if text.trim().is_empty() {
            FileConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        Ok(Self::new().merge_file(file))
    }

    /// Resolves command-line arguments, reading `--config` first when given.
    ///
    /// Explicit flags override values from the file.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::new(),
        };
        let config = base.merge_args(args);
        config.endpoint_url()?;
        Ok(config)
    }

    /// Parses and checks the endpoint.
    ///
    /// Only `http` and `https` endpoints are accepted.
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint).map_err(|err| {
            Error::url(format!("invalid endpoint {:?}", self.endpoint), Some(err))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(Error::config(
                format!("unsupported endpoint scheme {scheme:?}"),
                Some("endpoint".to_string()),
            )),
        }
    }

    fn merge_file(mut self, file: FileConfig) -> Self {
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(path) = file.session_file {
            self.session_file = path;
        }
        if let Some(path) = file.output {
            self.output = path;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if file.clipboard_command.is_some() {
            self.clipboard_command = file.clipboard_command;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        self
    }

    fn merge_args(mut self, args: ChatArgs) -> Self {
        if let Some(endpoint) = args.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(path) = args.session_file {
            self.session_file = PathBuf::from(path);
        }
        if let Some(path) = args.output {
            self.output = PathBuf::from(path);
        }
        if let Some(secs) = args.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if args.clipboard_command.is_some() {
            self.clipboard_command = args.clipboard_command;
        }
        if args.no_color {
            self.use_color = false;
        }
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    /// Applies the flags to the defaults without reading `--config`.
    fn from(args: ChatArgs) -> Self {
        ChatConfig::new().merge_args(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.endpoint, "http://localhost:8001/chat");
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.output, PathBuf::from("streamchat.html"));
        assert!(config.session_file.ends_with("streamchat/session_id"));
        assert!(config.clipboard_command.is_none());
        assert!(config.use_color);
        assert!(config.endpoint_url().is_ok());
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            endpoint: Some("https://chat.example.com/chat".to_string()),
            session_file: Some("/tmp/sid".to_string()),
            output: Some("out.html".to_string()),
            timeout_secs: Some(30),
            config: None,
            clipboard_command: Some("wl-copy".to_string()),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.endpoint, "https://chat.example.com/chat");
        assert_eq!(config.session_file, PathBuf::from("/tmp/sid"));
        assert_eq!(config.output, PathBuf::from("out.html"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.clipboard_command.as_deref(), Some("wl-copy"));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_endpoint("http://10.0.0.2:9000/chat")
            .with_session_file("sid.txt")
            .with_output("page.html")
            .with_timeout(Duration::from_secs(5))
            .with_clipboard_command(Some("pbcopy".to_string()))
            .without_color();
        assert_eq!(config.endpoint, "http://10.0.0.2:9000/chat");
        assert_eq!(config.session_file, PathBuf::from("sid.txt"));
        assert_eq!(config.output, PathBuf::from("page.html"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.clipboard_command.as_deref(), Some("pbcopy"));
        assert!(!config.use_color);
    }

    #[test]
    fn yaml_overrides_defaults() {
        let config = ChatConfig::from_yaml_str(
            "endpoint: https://example.org/chat\ntimeout_secs: 12\ncolor: false\n",
        )
        .unwrap();
        assert_eq!(config.endpoint, "https://example.org/chat");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert!(!config.use_color);
        assert_eq!(config.output, PathBuf::from("streamchat.html"));
    }

    #[test]
    fn empty_yaml_is_defaults() {
        assert_eq!(ChatConfig::from_yaml_str("").unwrap(), ChatConfig::new());
    }

    #[test]
    fn unknown_yaml_key_is_rejected() {
        let err = ChatConfig::from_yaml_str("model: big\n").unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn flags_override_file() {
        let path = std::env::temp_dir().join(format!(
            "streamchat-config-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "endpoint: http://file.example/chat\noutput: file.html\n").unwrap();
        let args = ChatArgs {
            endpoint: Some("http://flag.example/chat".to_string()),
            config: Some(path.to_string_lossy().into_owned()),
            ..ChatArgs::default()
        };
        let config = ChatConfig::from_args(args).unwrap();
        assert_eq!(config.endpoint, "http://flag.example/chat");
        assert_eq!(config.output, PathBuf::from("file.html"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn invalid_endpoints_are_rejected() {
        let args = ChatArgs {
            endpoint: Some("not a url".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from_args(args).is_err());

        let config = ChatConfig::new().with_endpoint("ftp://example.com/chat");
        let err = config.endpoint_url().unwrap_err();
        assert!(err.is_config());
    }
}
