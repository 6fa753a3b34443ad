use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// An authenticated session. Created at login or registration, handed to
/// every authenticated request, cleared at logout — the explicit
/// replacement for scattering token and identity across implicit storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub token: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at_epoch: i64,
}

impl Session {
    pub fn new(token: String, email: String, first_name: String, last_name: String) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            token,
            email,
            first_name,
            last_name,
            created_at_epoch: current_epoch(),
        }
    }
}

/// Persists the session as a JSON file so CLI invocations share one login.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store under the platform data directory.
    pub fn open_default() -> Result<Self> {
        let proj = ProjectDirs::from("dev", "mindwell", "mindwell")
            .context("unable to determine data directory for the session file")?;
        let dir = proj.data_dir().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating data dir: {}", dir.display()))?;
        Ok(Self { path: dir.join("session.json") })
    }

    /// Store at an explicit path (used by embedders and tests).
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let payload = serde_json::to_string_pretty(session).context("serializing session")?;
        std::fs::write(&self.path, payload)
            .with_context(|| format!("writing session file: {}", self.path.display()))?;
        Ok(())
    }

    /// None when no session exists or the file cannot be parsed; a corrupt
    /// file is treated the same as a missing one.
    pub fn load(&self) -> Option<Session> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("removing session file: {}", self.path.display())),
        }
    }
}

fn current_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at_path(dir.path().join("session.json"));
        assert!(store.load().is_none());

        let session = Session::new(
            "jwt-token".into(),
            "user@example.org".into(),
            "Ada".into(),
            "Lovelace".into(),
        );
        store.save(&session).unwrap();

        let loaded = store.load().expect("session should load back");
        assert_eq!(loaded.token, "jwt-token");
        assert_eq!(loaded.email, "user@example.org");
        assert_eq!(loaded.session_id, session.session_id);

        store.clear().unwrap();
        assert!(store.load().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn session_id_serializes_as_a_uuid_string() {
        let session = Session::new("jwt".into(), "a@b.c".into(), "".into(), "".into());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json["session_id"].as_str().unwrap(),
            session.session_id.to_string()
        );
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back.session_id, session.session_id);
    }

    #[test]
    fn corrupt_session_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SessionStore::at_path(&path);
        assert!(store.load().is_none());
    }
}
