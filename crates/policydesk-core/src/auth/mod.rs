//! Authentication state and credential persistence.
//!
//! This module provides:
//! - `Session`: the single owned access/refresh token pair
//! - `TokenStore`: durable mirror of that pair (`KeyringStore`, `FileStore`, `MemoryStore`)
//!
//! Tokens are never expired locally; only the server decides.

pub mod credentials;
pub mod session;

pub use credentials::{KeyringStore, MemoryStore, TokenStore};
pub use session::{FileStore, Session, TokenPair};
