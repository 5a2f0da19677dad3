//! The per-profile session identifier.
//!
//! The identifier outlives the in-memory conversation: it is generated once,
//! stored in a small file, and reused by every later run so the backend can
//! keep context across restarts.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Error, Result};

/// Opaque token sent with every turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuses the identifier stored at `path`, or creates and stores one.
    ///
    /// A missing or blank file yields a new identifier; parent directories
    /// are created as needed.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => {
                return Ok(Self(content.trim().to_string()));
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(Error::io(
                    format!("failed to read session id from {}", path.display()),
                    err,
                ));
            }
        }

        let id = Self::generate();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                Error::io(format!("failed to create {}", parent.display()), err)
            })?;
        }
        fs::write(path, format!("{}\n", id.0)).map_err(|err| {
            Error::io(
                format!("failed to store session id at {}", path.display()),
                err,
            )
        })?;
        Ok(id)
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default location of the session id file.
pub fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("streamchat")
        .join("session_id")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("streamchat-session-{}-{name}", std::process::id()))
            .join("session_id")
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(SessionId::generate(), SessionId::generate());
        assert_eq!(SessionId::generate().as_str().len(), 36);
    }

    #[test]
    fn created_once_then_reused() {
        let path = scratch("reuse");
        let _ = fs::remove_file(&path);
        let first = SessionId::load_or_create(&path).unwrap();
        let second = SessionId::load_or_create(&path).unwrap();
        assert_eq!(first, second);
        assert!(fs::read_to_string(&path).unwrap().contains(first.as_str()));
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn blank_file_is_replaced() {
        let path = scratch("blank");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "  \n").unwrap();
        let id = SessionId::load_or_create(&path).unwrap();
        assert!(!id.as_str().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), id.as_str());
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn default_path_ends_with_file_name() {
        assert!(default_session_path().ends_with("streamchat/session_id"));
    }
}
