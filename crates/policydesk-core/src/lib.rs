//! Core library for policydesk.
//!
//! An authenticated client for the brokerage API service: bearer-token
//! requests with transparent refresh, credential persistence across runs,
//! and typed models for customers, branches, agents, policies, quotes and
//! reports.
//!
//! ```no_run
//! use std::sync::Arc;
//! use policydesk_core::{ApiClient, Config, ListParams, Session};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load_with_env()?;
//! let session = Arc::new(Session::restore(config.open_token_store()?));
//! let api = ApiClient::from_config(&config, session)?;
//!
//! if !api.is_authenticated() {
//!     api.login("admin@x.com", "secret").await?;
//! }
//! let customers = api.list_customers(&ListParams::default()).await?;
//! println!("{}", customers.summary());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, ApiRequest, SessionLost, SessionLostHook};
pub use auth::{FileStore, KeyringStore, MemoryStore, Session, TokenPair, TokenStore};
pub use config::{Config, StoreKind};
pub use models::{
    Agent, AgentFilter, AgentRequest, AgentStats, Branch, BranchRequest, BranchStats, Customer,
    CustomerRequest, DashboardStats, ExportFormat, ExportParams, ListParams, LoginResponse,
    MessageResponse, MonthlyStats, Page, Policy, PolicyFilter, PolicyRequest, PolicyStats,
    PolicyStatus, Quote, ScrapedQuote, TwoFactorSetup, User,
};
