//! Signed-in session state.
//!
//! The session is an explicit object handed to whoever needs it. The
//! [`SessionStore`] persists it to `.deltadesk/session.yaml` and publishes
//! every change, including invalidation, on a `watch` channel.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jiff::Timestamp;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{DeskError, Result};
use crate::paths;

pub const TOKEN_ENV: &str = "DELTADESK_TOKEN";

/// Credentials and identity returned by a successful sign-in
#[derive(Debug)]
pub struct Session {
    access_token: SecretBox<String>,
    expiration: Timestamp,
    refresh_token: Option<SecretBox<String>>,
    refresh_expiration: Option<Timestamp>,
    user_name: String,
    is_superuser: bool,
}

impl Session {
    pub fn new(
        access_token: impl Into<String>,
        expiration: Timestamp,
        user_name: impl Into<String>,
        is_superuser: bool,
    ) -> Self {
        Self {
            access_token: SecretBox::new(Box::new(access_token.into())),
            expiration,
            refresh_token: None,
            refresh_expiration: None,
            user_name: user_name.into(),
            is_superuser,
        }
    }

    pub fn with_refresh(mut self, token: impl Into<String>, expiration: Option<Timestamp>) -> Self {
        self.refresh_token = Some(SecretBox::new(Box::new(token.into())));
        self.refresh_expiration = expiration;
        self
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn expiration(&self) -> Timestamp {
        self.expiration
    }

    pub fn refresh_expiration(&self) -> Option<Timestamp> {
        self.refresh_expiration
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    /// A session is usable only strictly before its expiration
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        now < self.expiration
    }

    fn to_stored(&self) -> StoredSession {
        StoredSession {
            access_token: self.access_token.expose_secret().clone(),
            expiration: self.expiration,
            refresh_token: self
                .refresh_token
                .as_ref()
                .map(|t| t.expose_secret().clone()),
            expiration_refresh_token: self.refresh_expiration,
            user_name: self.user_name.clone(),
            is_superuser: self.is_superuser,
        }
    }

    fn from_stored(stored: StoredSession) -> Self {
        let mut session = Session::new(
            stored.access_token,
            stored.expiration,
            stored.user_name,
            stored.is_superuser,
        );
        if let Some(token) = stored.refresh_token {
            session = session.with_refresh(token, stored.expiration_refresh_token);
        }
        session
    }

    fn with_access_token(mut self, token: String) -> Self {
        self.access_token = SecretBox::new(Box::new(token));
        self
    }
}

#[derive(Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    expiration: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiration_refresh_token: Option<Timestamp>,
    user_name: String,
    #[serde(default)]
    is_superuser: bool,
}

/// Parse an expiration as sent by the backend.
///
/// Accepts RFC 3339 timestamps, zone-less datetimes (read as UTC) and unix
/// seconds.
pub fn parse_expiration(value: &str) -> Result<Timestamp> {
    let value = value.trim();
    if let Ok(ts) = value.parse::<Timestamp>() {
        return Ok(ts);
    }
    if let Ok(dt) = value.parse::<jiff::civil::DateTime>() {
        return dt
            .to_zoned(jiff::tz::TimeZone::UTC)
            .map(|z| z.timestamp())
            .map_err(|e| DeskError::Other(format!("invalid expiration '{value}': {e}")));
    }
    if let Ok(secs) = value.parse::<i64>() {
        return Timestamp::from_second(secs)
            .map_err(|e| DeskError::Other(format!("invalid expiration '{value}': {e}")));
    }
    Err(DeskError::Other(format!(
        "invalid expiration '{value}': expected an ISO 8601 datetime"
    )))
}

/// File-backed session holder with change notification
pub struct SessionStore {
    path: PathBuf,
    tx: watch::Sender<Option<Arc<Session>>>,
}

impl SessionStore {
    /// Open the store at the default location
    pub fn open() -> Result<Self> {
        Self::at(paths::session_path())
    }

    /// Open the store backed by `path`, loading any session already saved there
    pub fn at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stored = load(&path)?;
        let initial = apply_token_override(stored).map(Arc::new);
        let (tx, _) = watch::channel(initial);
        Ok(Self { path, tx })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.tx.borrow().clone()
    }

    /// Receive every subsequent sign-in and invalidation
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Session>>> {
        self.tx.subscribe()
    }

    /// Persist a new session and publish it
    pub fn sign_in(&self, session: Session) -> Result<Arc<Session>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml_ng::to_string(&session.to_stored())?;
        fs::write(&self.path, content)?;
        debug!(user = session.user_name(), "session stored");

        let session = Arc::new(session);
        self.tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Forget the session: remove the file and publish `None`
    pub fn invalidate(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.tx.send_replace(None);
        Ok(())
    }

    /// The current session, failing when absent or expired at `now`
    pub fn require_valid(&self, now: Timestamp) -> Result<Arc<Session>> {
        let session = self.current().ok_or(DeskError::NotSignedIn)?;
        if !session.is_valid_at(now) {
            return Err(DeskError::SessionExpired(session.expiration().to_string()));
        }
        Ok(session)
    }
}

fn load(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    match serde_yaml_ng::from_str::<StoredSession>(&content) {
        Ok(stored) => Ok(Some(Session::from_stored(stored))),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
            Ok(None)
        }
    }
}

fn apply_token_override(stored: Option<Session>) -> Option<Session> {
    let token = match std::env::var(TOKEN_ENV) {
        Ok(t) if !t.is_empty() => t,
        _ => return stored,
    };
    match stored {
        Some(session) => Some(session.with_access_token(token)),
        // No expiration is known for a bare token; the backend decides
        None => Some(Session::new(token, Timestamp::MAX, "(token)", false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::ToSpan;
    use serial_test::serial;
    use tempfile::TempDir;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_second(secs).unwrap()
    }

    #[test]
    fn test_parse_expiration_formats() {
        assert_eq!(
            parse_expiration("2024-05-01T10:00:00Z").unwrap(),
            "2024-05-01T10:00:00Z".parse::<Timestamp>().unwrap()
        );
        assert_eq!(
            parse_expiration("2024-05-01T10:00:00.250").unwrap(),
            "2024-05-01T10:00:00.25Z".parse::<Timestamp>().unwrap()
        );
        assert_eq!(parse_expiration("1700000000").unwrap(), ts(1_700_000_000));
        assert!(parse_expiration("tomorrow").is_err());
    }

    #[test]
    #[serial]
    fn test_sign_in_persists_and_publishes() {
        unsafe { std::env::remove_var(TOKEN_ENV) };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.yaml");
        let store = SessionStore::at(&path).unwrap();
        let mut rx = store.subscribe();
        assert!(store.current().is_none());

        let session = Session::new("abc", ts(2_000_000_000), "admin", true)
            .with_refresh("r1", Some(ts(2_100_000_000)));
        store.sign_in(session).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().user_name(), "admin");

        let reopened = SessionStore::at(&path).unwrap();
        let current = reopened.current().unwrap();
        assert_eq!(current.access_token(), "abc");
        assert!(current.is_superuser());
        assert!(current.has_refresh_token());
        assert_eq!(current.refresh_expiration(), Some(ts(2_100_000_000)));
    }

    #[test]
    #[serial]
    fn test_invalidate_removes_file_and_publishes_none() {
        unsafe { std::env::remove_var(TOKEN_ENV) };
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.yaml");
        let store = SessionStore::at(&path).unwrap();
        store
            .sign_in(Session::new("abc", ts(2_000_000_000), "admin", false))
            .unwrap();
        let mut rx = store.subscribe();

        store.invalidate().unwrap();
        assert!(!path.exists());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());

        // Invalidating twice is fine
        store.invalidate().unwrap();
    }

    #[test]
    #[serial]
    fn test_require_valid() {
        unsafe { std::env::remove_var(TOKEN_ENV) };
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("session.yaml")).unwrap();
        let now = ts(1_700_000_000);
        assert!(matches!(store.require_valid(now), Err(DeskError::NotSignedIn)));

        store
            .sign_in(Session::new("abc", now - 1.minute(), "admin", false))
            .unwrap();
        assert!(matches!(
            store.require_valid(now),
            Err(DeskError::SessionExpired(_))
        ));
    }

    #[test]
    #[serial]
    fn test_token_env_override() {
        let dir = TempDir::new().unwrap();
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { std::env::set_var(TOKEN_ENV, "from-env") };
        let store = SessionStore::at(dir.path().join("session.yaml")).unwrap();
        unsafe { std::env::remove_var(TOKEN_ENV) };

        let session = store.current().unwrap();
        assert_eq!(session.access_token(), "from-env");
        assert!(session.is_valid_at(Timestamp::now()));
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let session = Session::new("super-secret", ts(2_000_000_000), "admin", false);
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
    }
}
