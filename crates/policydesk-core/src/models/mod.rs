//! Data models for the brokerage API.
//!
//! This module contains the request and response bodies exchanged with the
//! API service:
//!
//! - Auth types: `User`, `LoginRequest`, `LoginResponse`, `TwoFactorSetup`
//! - CRUD entities: `Customer`, `Branch`, `Agent`, `Policy` and their request bodies
//! - Quotes: `Quote`, `ScrapedQuote`
//! - Reports: `DashboardStats` and the per-dimension stat rows
//! - Listing: `Page`, `ListParams` and per-entity filters

pub mod agent;
pub mod auth;
pub mod branch;
pub mod common;
pub mod customer;
pub mod policy;
pub mod quote;
pub mod report;

pub use agent::{Agent, AgentFilter, AgentRequest, BranchSummary};
pub use auth::{LoginRequest, LoginResponse, MessageResponse, TwoFactorSetup, User};
pub use branch::{Branch, BranchRequest, ManagerSummary};
pub use common::{ListParams, Page};
pub use customer::{Customer, CustomerRequest};
pub use policy::{Policy, PolicyFilter, PolicyRequest, PolicyStatus};
pub use quote::{Quote, ScrapedQuote};
pub use report::{
    AgentStats, BranchStats, DashboardStats, ExportFormat, ExportParams, MonthlyStats, PolicyStats,
};
