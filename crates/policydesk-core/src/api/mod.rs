//! REST API client module for the brokerage API service.
//!
//! This module provides the `ApiClient` for communicating with the API to
//! manage customers, branches, agents and policies and to read reports.
//!
//! The API uses bearer token authentication. Access tokens are short-lived;
//! the client exchanges the refresh token for a new pair when a request comes
//! back 401 and resubmits that request once.

pub mod client;
mod endpoints;
pub mod error;
pub mod request;

pub use client::{ApiClient, SessionLost, SessionLostHook};
pub use error::{ApiError, Result};
pub use request::ApiRequest;
