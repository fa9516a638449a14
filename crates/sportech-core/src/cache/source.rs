use async_trait::async_trait;
use serde_json::Value;

use crate::api::{ApiClient, ApiResult};
use crate::models::Resource;

/// Where the cache gets collection bodies from.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Fetch the JSON body of one resource, bypassing any transport cache.
    async fn fetch(&self, resource: Resource) -> ApiResult<Value>;
}

#[async_trait]
impl ResourceSource for ApiClient {
    async fn fetch(&self, resource: Resource) -> ApiResult<Value> {
        self.fetch_resource(resource).await
    }
}
