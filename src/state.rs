use crate::error::{GestionaleError, GestionaleResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

/// Logged-in identity. Set at login, cleared at logout, read-only everywhere else.
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl SessionState {
    pub fn new(token: String, user: UserProfile) -> Self {
        SessionState {
            token: Some(token),
            user: Some(user),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn user_id(&self) -> GestionaleResult<i64> {
        self.user
            .as_ref()
            .map(|u| u.id)
            .ok_or_else(|| GestionaleError::Auth("no active session".to_string()))
    }
}

/// Persists the session between CLI invocations.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> GestionaleResult<SessionState> {
        if !self.path.exists() {
            return Ok(SessionState::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SessionState::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, session: &SessionState) -> GestionaleResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        tracing::debug!("Session saved to {:?}", self.path);
        Ok(())
    }

    pub fn clear(&self) -> GestionaleResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            tracing::debug!("Session removed from {:?}", self.path);
        }
        Ok(())
    }
}
