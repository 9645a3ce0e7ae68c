use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::TokenStore;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Access/refresh credential pair issued by the API.
///
/// `expires_at` is carried for display only; the server decides when a token
/// is no longer valid.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "ts", ts(type = "number | null"))]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Get minutes remaining until the advertised expiry (for display)
    pub fn minutes_until_expiry(&self) -> Option<i64> {
        self.expires_at
            .map(|at| (at - Utc::now()).num_minutes().max(0))
    }
}

// Tokens are bearer secrets; keep them out of logs.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The single owned authentication state shared by every request issuer.
///
/// Holds at most one `TokenPair`. Writes replace the whole pair under one
/// lock, so readers see either the old pair or the new one. Store I/O happens
/// outside that lock; `persist` keeps store writes in the same order as the
/// in-memory swaps.
pub struct Session {
    store: Arc<dyn TokenStore>,
    tokens: RwLock<Option<TokenPair>>,
    persist: Mutex<()>,
}

impl Session {
    /// Empty session backed by `store`. Nothing is loaded.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            tokens: RwLock::new(None),
            persist: Mutex::new(()),
        }
    }

    /// Session seeded from whatever `store` persisted in a previous run
    pub fn restore(store: Arc<dyn TokenStore>) -> Self {
        let tokens = match store.load() {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Failed to load stored tokens, starting signed out");
                None
            }
        };
        debug!(has_tokens = tokens.is_some(), "Session restored");
        Self {
            store,
            tokens: RwLock::new(tokens),
            persist: Mutex::new(()),
        }
    }

    /// Current pair, if any
    pub fn tokens(&self) -> Option<TokenPair> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get the bearer token if one is held
    pub fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.access_token.clone())
            .filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .filter(|t| !t.is_empty())
    }

    /// True iff a non-empty access token is held
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Replace both tokens at once and mirror them to the store.
    ///
    /// A store failure is logged; the in-memory pair is still updated.
    pub fn replace(&self, tokens: TokenPair) {
        let _persist = self.persist.lock().unwrap_or_else(PoisonError::into_inner);
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens.clone());
        if let Err(e) = self.store.save(&tokens) {
            warn!(error = %e, "Failed to persist tokens");
        }
    }

    /// Drop all credential state, in memory and in the store
    pub fn clear(&self) {
        let _persist = self.persist.lock().unwrap_or_else(PoisonError::into_inner);
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
    }
}

/// Persists the pair as `session.json` in the cache directory.
///
/// Writes go to a temporary file that is renamed into place, so a crash never
/// leaves half of an old pair next to half of a new one.
pub struct FileStore {
    cache_dir: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl TokenStore for FileStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let tokens = serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(tokens))
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")?;
        let path = self.session_path();
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&tmp, contents).context("Failed to write session file")?;
        std::fs::rename(&tmp, &path).context("Failed to move session file into place")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;
    use chrono::Duration;
    use std::sync::mpsc::{self, Receiver, Sender};

    struct BrokenStore;

    impl TokenStore for BrokenStore {
        fn load(&self) -> Result<Option<TokenPair>> {
            Err(anyhow::anyhow!("keychain locked"))
        }
        fn save(&self, _tokens: &TokenPair) -> Result<()> {
            Err(anyhow::anyhow!("keychain locked"))
        }
        fn clear(&self) -> Result<()> {
            Err(anyhow::anyhow!("keychain locked"))
        }
    }

    /// Store whose `save` parks until the test lets it finish
    struct SlowStore {
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl TokenStore for SlowStore {
        fn load(&self) -> Result<Option<TokenPair>> {
            Ok(None)
        }
        fn save(&self, _tokens: &TokenPair) -> Result<()> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            Ok(())
        }
        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_new_session_is_signed_out() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        assert!(!session.is_authenticated());
        assert!(session.tokens().is_none());
    }

    #[test]
    fn test_restore_reads_store() {
        let store = Arc::new(MemoryStore::with_tokens(TokenPair::new("A1", "R1")));
        let session = Session::restore(store);
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("A1"));
        assert_eq!(session.refresh_token().as_deref(), Some("R1"));
    }

    #[test]
    fn test_replace_mirrors_both_tokens() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());

        session.replace(TokenPair::new("A1", "R1"));
        session.replace(TokenPair::new("A2", "R2"));

        let stored = store.snapshot().unwrap();
        assert_eq!(stored.access_token, "A2");
        assert_eq!(stored.refresh_token, "R2");
        assert_eq!(session.tokens(), Some(stored));
    }

    #[test]
    fn test_clear_empties_memory_and_store() {
        let store = Arc::new(MemoryStore::with_tokens(TokenPair::new("A1", "R1")));
        let session = Session::restore(store.clone());
        session.clear();
        assert!(!session.is_authenticated());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_empty_tokens_do_not_count() {
        let session = Session::new(Arc::new(MemoryStore::new()));
        session.replace(TokenPair::new("", ""));
        assert!(!session.is_authenticated());
        assert!(session.refresh_token().is_none());
    }

    #[test]
    fn test_store_failures_do_not_block_session() {
        let session = Session::restore(Arc::new(BrokenStore));
        assert!(!session.is_authenticated());

        session.replace(TokenPair::new("A1", "R1"));
        assert_eq!(session.access_token().as_deref(), Some("A1"));

        session.clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_readers_are_not_blocked_by_store_writes() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let session = Arc::new(Session::new(Arc::new(SlowStore {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        })));

        let writer = {
            let session = session.clone();
            std::thread::spawn(move || session.replace(TokenPair::new("A1", "R1")))
        };
        entered_rx.recv().unwrap();

        // The store write is still in progress
        let (read_tx, read_rx) = mpsc::channel();
        let reader = session.clone();
        std::thread::spawn(move || {
            let _ = read_tx.send(reader.access_token());
        });
        let seen = read_rx.recv_timeout(std::time::Duration::from_secs(2));

        release_tx.send(()).unwrap();
        writer.join().unwrap();
        assert_eq!(seen.unwrap().as_deref(), Some("A1"));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert!(store.load().unwrap().is_none());

        let expires = DateTime::from_timestamp(1_900_000_000, 0).unwrap();
        store.save(&TokenPair::new("A1", "R1").with_expiry(expires)).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "A1");
        assert_eq!(loaded.expires_at, Some(expires));
        assert!(!store.session_path().with_extension("json.tmp").exists());

        store.clear().unwrap();
        assert!(!store.session_path().exists());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        std::fs::write(store.session_path(), "not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn test_token_pair_wire_format() {
        let pair: TokenPair = serde_json::from_str(
            r#"{"access_token":"A1","refresh_token":"R1","expires_at":1900000000}"#,
        )
        .unwrap();
        assert_eq!(pair.expires_at.map(|t| t.timestamp()), Some(1_900_000_000));

        // Refresh responses may omit the expiry
        let pair: TokenPair =
            serde_json::from_str(r#"{"access_token":"A2","refresh_token":"R2"}"#).unwrap();
        assert!(pair.expires_at.is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", TokenPair::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }

    #[test]
    fn test_minutes_until_expiry() {
        let pair = TokenPair::new("A", "R").with_expiry(Utc::now() + Duration::minutes(30));
        let minutes = pair.minutes_until_expiry().unwrap();
        assert!((29..=30).contains(&minutes));

        let expired = TokenPair::new("A", "R").with_expiry(Utc::now() - Duration::minutes(5));
        assert_eq!(expired.minutes_until_expiry(), Some(0));
        assert_eq!(TokenPair::new("A", "R").minutes_until_expiry(), None);
    }
}
