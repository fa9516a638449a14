use thiserror::Error;

use crate::api::ApiError;
use crate::models::Resource;

/// Why a refresh batch failed. Any one of these fails the whole batch.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to fetch {resource}: {source}")]
    Fetch { resource: Resource, source: ApiError },

    #[error("Failed to decode {resource}: {source}")]
    Decode {
        resource: Resource,
        source: serde_json::Error,
    },
}

impl CacheError {
    pub fn resource(&self) -> Resource {
        match self {
            CacheError::Fetch { resource, .. } | CacheError::Decode { resource, .. } => *resource,
        }
    }
}
