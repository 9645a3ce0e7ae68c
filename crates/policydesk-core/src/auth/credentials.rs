use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::DateTime;
use keyring::Entry;

use super::TokenPair;

/// Keychain service name used when none is configured
pub const DEFAULT_SERVICE_NAME: &str = "policydesk";

/// Fixed entry names for the persisted credential pair
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
const EXPIRES_AT_KEY: &str = "expires_at";

/// Durable mirror of the session's credential pair.
///
/// Implementations only persist; the in-memory `Session` stays the source of
/// truth and serializes all writes, so a store never sees concurrent `save`
/// and `clear` calls.
pub trait TokenStore: Send + Sync {
    /// Load the persisted pair, if any
    fn load(&self) -> Result<Option<TokenPair>>;

    /// Persist both tokens, replacing whatever was stored
    fn save(&self, tokens: &TokenPair) -> Result<()>;

    /// Remove every persisted token
    fn clear(&self) -> Result<()>;
}

/// Stores tokens in the OS keychain under fixed entry names.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {} from keychain", key)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .with_context(|| format!("Failed to store {} in keychain", key))
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {} from keychain", key)),
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl TokenStore for KeyringStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        let Some(access_token) = self.read(ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };
        let refresh_token = self.read(REFRESH_TOKEN_KEY)?.unwrap_or_default();
        let expires_at = self
            .read(EXPIRES_AT_KEY)?
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0));

        Ok(Some(TokenPair {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        self.write(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        self.write(REFRESH_TOKEN_KEY, &tokens.refresh_token)?;
        match tokens.expires_at {
            Some(at) => self.write(EXPIRES_AT_KEY, &at.timestamp().to_string()),
            None => self.remove(EXPIRES_AT_KEY),
        }
    }

    fn clear(&self) -> Result<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(REFRESH_TOKEN_KEY)?;
        self.remove(EXPIRES_AT_KEY)
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    tokens: Mutex<Option<TokenPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, as if a previous run had persisted `tokens`
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }

    /// Current contents, for inspection
    pub fn snapshot(&self) -> Option<TokenPair> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenStore for MemoryStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        Ok(self.snapshot())
    }

    fn save(&self, tokens: &TokenPair) -> Result<()> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
