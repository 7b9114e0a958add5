//! Signed-in user, persisted between runs
//!
//! The session is read once at startup and written once at shutdown; in
//! between it is passed around explicitly.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed session file: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    /// Bearer token for the rental API
    pub token: String,
    #[serde(default)]
    pub is_seller: bool,
}

impl Session {
    /// Load a saved session; `Ok(None)` when nobody is signed in
    pub async fn load(path: &Path) -> Result<Option<Session>, SessionError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(self)?;
        // atomic replace
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Sign out
    pub async fn clear(path: &Path) -> Result<(), SessionError> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("rentwear-{}-{}.json", name, Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let path = temp_path("session");
        let session = Session {
            user_id: Uuid::new_v4(),
            username: "meera".to_string(),
            token: "token".to_string(),
            is_seller: true,
        };

        session.save(&path).await.unwrap();
        assert_eq!(Session::load(&path).await.unwrap(), Some(session));

        Session::clear(&path).await.unwrap();
        assert_eq!(Session::load(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_signed_out() {
        let path = temp_path("absent");
        assert!(Session::load(&path).await.unwrap().is_none());
        Session::clear(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let path = temp_path("broken");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(matches!(
            Session::load(&path).await,
            Err(SessionError::Format(_))
        ));
        Session::clear(&path).await.unwrap();
    }
}
