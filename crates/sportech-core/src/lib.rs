//! Core library for the Sportech site client.
//!
//! Provides the REST API client, the site data models, the application data
//! cache with its durable snapshot, admin session handling and configuration.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use cache::{AppDataCache, FetchOptions, FetchOutcome};
pub use config::Config;
