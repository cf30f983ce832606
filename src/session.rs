//! Persisted login session.
//!
//! The auth token and user returned by login are stored as a small JSON
//! file under the platform data directory and validated against the
//! backend on startup. A session that fails validation is cleared so the
//! next run starts logged out instead of looping on auth errors.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::api::types::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub token: String,
  pub user: User,
}

impl Session {
  /// Load the saved session, if any.
  ///
  /// A corrupt session file is treated as absent and removed so it cannot
  /// wedge every subsequent run.
  pub fn load() -> Option<Self> {
    let path = Self::file_path().ok()?;
    let contents = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&contents) {
      Ok(session) => Some(session),
      Err(err) => {
        warn!(path = %path.display(), error = %err, "discarding corrupt session file");
        let _ = std::fs::remove_file(&path);
        None
      }
    }
  }

  pub fn save(&self) -> Result<()> {
    let path = Self::file_path()?;
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create session directory {}: {}", parent.display(), e))?;
    }
    let contents = serde_json::to_string_pretty(self)?;
    std::fs::write(&path, contents)
      .map_err(|e| eyre!("Failed to write session file {}: {}", path.display(), e))?;
    debug!(path = %path.display(), "session saved");
    Ok(())
  }

  /// Remove the saved session. Missing file is not an error.
  pub fn clear() -> Result<()> {
    let path = Self::file_path()?;
    match std::fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(eyre!("Failed to remove session file {}: {}", path.display(), e)),
    }
  }

  fn file_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| eyre!("Could not locate a data directory"))?;
    Ok(data_dir.join("crmc").join("session.json"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_session_round_trips_through_json() {
    let session = Session {
      token: "tok-123".to_string(),
      user: serde_json::from_value(serde_json::json!({
        "id": 4,
        "name": "Ana",
        "email": "ana@example.com",
        "role": { "id": 1, "name": "admin" }
      }))
      .unwrap(),
    };
    let text = serde_json::to_string(&session).unwrap();
    let back: Session = serde_json::from_str(&text).unwrap();
    assert_eq!(back.token, "tok-123");
    assert_eq!(back.user.id, 4);
  }
}
