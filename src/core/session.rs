//! Session storage
//!
//! Client-side key-value state that survives between commands: the bearer
//! token, the signed-in role, and cached user and hospital identifiers. It is
//! read at startup and wiped on logout. Selected records are never handed to
//! another view through this store; ids travel in routes instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::role::{Role, RoleError};

pub const KEY_AUTH_TOKEN: &str = "authToken";
pub const KEY_ROLE: &str = "role";
pub const KEY_ROLE_TYPE: &str = "roleType";
pub const KEY_USER_ID: &str = "userid";
pub const KEY_HOSPITAL_NAME: &str = "hospital_name";
pub const KEY_HOSPITAL_ID: &str = "hospital_id";
pub const KEY_NODAL_ID: &str = "nodal_id";
pub const KEY_NODAL_NAME: &str = "nodalname";

/// Every key the store accepts
pub const KNOWN_KEYS: [&str; 8] = [
    KEY_AUTH_TOKEN,
    KEY_ROLE,
    KEY_ROLE_TYPE,
    KEY_USER_ID,
    KEY_HOSPITAL_NAME,
    KEY_HOSPITAL_ID,
    KEY_NODAL_ID,
    KEY_NODAL_NAME,
];

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not signed in. Run `lims session login --token <TOKEN> --role <ROLE>` first")]
    NotSignedIn,

    #[error("Unknown session key: {0}")]
    UnknownKey(String),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error("Session file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted session values
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionStore {
    #[serde(skip)]
    path: Option<PathBuf>,
    #[serde(flatten)]
    entries: BTreeMap<String, String>,
}

/// Values recorded at sign-in
#[derive(Debug, Clone, Default)]
pub struct Login {
    pub token: String,
    pub role: Role,
    pub role_type: Option<String>,
    pub user_id: Option<String>,
    pub hospital_id: Option<String>,
    pub hospital_name: Option<String>,
    pub nodal_id: Option<String>,
    pub nodal_name: Option<String>,
}

impl SessionStore {
    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the session file in `dir`, or start empty if there is none
    pub fn open(dir: &Path) -> Result<Self, SessionError> {
        let path = dir.join(SESSION_FILE);
        let mut store = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<SessionStore>(&content).map_err(|e| SessionError::Corrupt {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            Self::default()
        };
        store.path = Some(path);
        Ok(store)
    }

    /// Write the store back to its file
    pub fn save(&self) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| SessionError::Corrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), SessionError> {
        if !KNOWN_KEYS.contains(&key) {
            return Err(SessionError::UnknownKey(key.to_string()));
        }
        self.entries.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace the session with a fresh sign-in
    pub fn login(&mut self, login: Login) {
        self.entries.clear();
        let optional = [
            (KEY_ROLE_TYPE, login.role_type),
            (KEY_USER_ID, login.user_id),
            (KEY_HOSPITAL_ID, login.hospital_id),
            (KEY_HOSPITAL_NAME, login.hospital_name),
            (KEY_NODAL_ID, login.nodal_id),
            (KEY_NODAL_NAME, login.nodal_name),
        ];
        self.entries.insert(KEY_AUTH_TOKEN.to_string(), login.token);
        self.entries.insert(KEY_ROLE.to_string(), login.role.to_string());
        for (key, value) in optional {
            if let Some(value) = value {
                self.entries.insert(key.to_string(), value);
            }
        }
    }

    /// Forget everything (logout)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn token(&self) -> Option<&str> {
        self.get(KEY_AUTH_TOKEN).filter(|t| !t.is_empty())
    }

    /// Role of the signed-in user
    pub fn role(&self) -> Result<Role, SessionError> {
        let role = self.get(KEY_ROLE).ok_or(SessionError::NotSignedIn)?;
        Ok(role.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn login(role: Role) -> Login {
        Login {
            token: "tok-123".to_string(),
            role,
            hospital_id: Some("12".to_string()),
            ..Login::default()
        }
    }

    #[test]
    fn test_empty_session_is_not_signed_in() {
        let store = SessionStore::in_memory();
        assert!(store.token().is_none());
        assert!(matches!(store.role(), Err(SessionError::NotSignedIn)));
    }

    #[test]
    fn test_login_persists_and_reloads() {
        let tmp = TempDir::new().unwrap();
        let mut store = SessionStore::open(tmp.path()).unwrap();
        store.login(login(Role::Technician));
        store.save().unwrap();

        let reloaded = SessionStore::open(tmp.path()).unwrap();
        assert_eq!(reloaded.token(), Some("tok-123"));
        assert_eq!(reloaded.role().unwrap(), Role::Technician);
        assert_eq!(reloaded.get(KEY_HOSPITAL_ID), Some("12"));
        assert_eq!(reloaded.get(KEY_NODAL_ID), None);
    }

    #[test]
    fn test_file_uses_storage_key_names() {
        let tmp = TempDir::new().unwrap();
        let mut store = SessionStore::open(tmp.path()).unwrap();
        store.login(login(Role::Admin));
        store.save().unwrap();

        let raw = fs::read_to_string(tmp.path().join(SESSION_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["authToken"], "tok-123");
        assert_eq!(value["role"], "admin");
    }

    #[test]
    fn test_clear_logs_out() {
        let tmp = TempDir::new().unwrap();
        let mut store = SessionStore::open(tmp.path()).unwrap();
        store.login(login(Role::Doctor));
        store.clear();
        store.save().unwrap();

        let reloaded = SessionStore::open(tmp.path()).unwrap();
        assert!(reloaded.token().is_none());
        assert_eq!(reloaded.entries().count(), 0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut store = SessionStore::in_memory();
        assert!(matches!(
            store.set("hospitalToUpdate", "{}"),
            Err(SessionError::UnknownKey(_))
        ));
        store.set(KEY_NODAL_NAME, "North").unwrap();
        assert_eq!(store.get(KEY_NODAL_NAME), Some("North"));
    }

    #[test]
    fn test_bad_role_value() {
        let mut store = SessionStore::in_memory();
        store.set(KEY_ROLE, "janitor").unwrap();
        assert!(matches!(store.role(), Err(SessionError::Role(_))));
    }

    #[test]
    fn test_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SESSION_FILE), "{not json").unwrap();
        assert!(matches!(
            SessionStore::open(tmp.path()),
            Err(SessionError::Corrupt { .. })
        ));
    }
}
