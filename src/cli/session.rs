use std::{fs, io, path::PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use flashlearn::store::auth::AuthUser;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse session file: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Signed-in identity persisted between invocations.
#[derive(Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
}

impl From<Session> for AuthUser {
    fn from(session: Session) -> AuthUser {
        AuthUser {
            id: session.user_id,
            email: session.email,
        }
    }
}

fn session_path() -> Result<PathBuf, SessionError> {
    let mut path = ProjectDirs::from("com", "pam", "flashlearn")
        .ok_or(SessionError::NoHomeDir)?
        .data_local_dir()
        .to_path_buf();
    path.push("session.json");
    Ok(path)
}

pub fn load() -> Result<Option<Session>, SessionError> {
    let path = session_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

pub fn save(user: &AuthUser) -> Result<(), SessionError> {
    let path = session_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let session = Session {
        user_id: user.id.clone(),
        email: user.email.clone(),
    };
    fs::write(path, serde_json::to_string(&session)?)?;
    Ok(())
}

pub fn clear() -> Result<(), SessionError> {
    let path = session_path()?;
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
