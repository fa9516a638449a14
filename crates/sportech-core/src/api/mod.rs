//! REST API client module for the Sportech site backend.
//!
//! This module provides the `ApiClient` for reading the public site
//! collections and for the admin panel's authenticated CRUD calls.
//!
//! Admin endpoints use a bearer token obtained from `/auth/login`.

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiResult};
pub use error::ApiError;
