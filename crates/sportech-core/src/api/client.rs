//! API client for the Sportech site REST API.
//!
//! Public endpoints (the six site collections, policies, the contact form and
//! the password-reset flow) need no credentials. Admin endpoints carry the
//! bearer token obtained from `/auth/login`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::{ContactMessage, Policy, Resource};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Minimum OTP length accepted by the verify step.
const MIN_OTP_LENGTH: usize = 4;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpResponse {
    reset_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: Option<String>,
}

/// API client for the site backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<Arc<String>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client for the given base URL
    /// (e.g. `https://api.example.com/api`).
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            warn!("API base URL is empty; requests will fail until it is configured");
        }

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(Arc::new(token.into()));
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(Arc::new(token.into())),
        }
    }

    fn url(&self, path: &str) -> ApiResult<String> {
        if self.base_url.is_empty() {
            return Err(ApiError::NotConfigured);
        }
        if path.starts_with('/') {
            Ok(format!("{}{}", self.base_url, path))
        } else {
            Ok(format!("{}/{}", self.base_url, path))
        }
    }

    /// Build `{base}/{collection}/{segment}` with the last segment percent-encoded.
    fn url_with_segment(&self, collection: &str, segment: &str) -> ApiResult<String> {
        let mut url = Url::parse(&self.url(collection)?)
            .map_err(|e| ApiError::InvalidResponse(format!("invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidResponse("API base URL cannot have path segments".to_string()))?
            .push(segment);
        Ok(url.into())
    }

    fn auth_headers(&self, auth: bool) -> ApiResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if auth {
            let token = self.token.as_ref().ok_or(ApiError::Unauthorized)?;
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::Validation("Stored token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> ApiResult<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Decode a successful response: JSON when the server says so, otherwise
    /// the text body, or `null` when there is none.
    async fn decode_body(response: reqwest::Response, url: &str) -> ApiResult<Value> {
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        if is_json {
            return response
                .json()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)));
        }

        let text = response.text().await?;
        if text.is_empty() {
            Ok(Value::Null)
        } else {
            Ok(Value::String(text))
        }
    }

    /// Headers that keep intermediate HTTP caches out of public reads.
    fn no_cache(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(header::CACHE_CONTROL, "no-cache, no-store")
            .header(header::PRAGMA, "no-cache")
    }

    /// Send a request, retrying on 429 with exponential backoff.
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        auth: bool,
        no_cache: bool,
    ) -> ApiResult<reqwest::Response> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut builder = self
                .client
                .request(method.clone(), url)
                .headers(self.auth_headers(auth)?)
                .header(header::ACCEPT, "application/json");
            if no_cache {
                builder = Self::no_cache(builder);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await?;
            debug!(%method, url, status = %response.status(), "Response received");

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn send_json(&self, method: Method, path: &str, body: Option<&Value>, auth: bool) -> ApiResult<Value> {
        let url = self.url(path)?;
        let response = self.request(method, &url, body, auth, false).await?;
        Self::decode_body(response, &url).await
    }

    // ===== Public Site Data =====

    /// Fetch one of the six site collections, bypassing any HTTP cache.
    ///
    /// One attempt only, with no 429 backoff: the data cache reports a failed
    /// refresh and keeps serving what it has. Error bodies are not read.
    pub async fn fetch_resource(&self, resource: Resource) -> ApiResult<Value> {
        let url = self.url(&resource.path())?;
        let builder = self.client.get(&url).header(header::ACCEPT, "application/json");
        let response = Self::no_cache(builder).send().await?;
        let status = response.status();
        debug!(%resource, %status, "Resource response received");
        if !status.is_success() {
            return Err(ApiError::from_status_line(status, &url));
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))
    }

    /// Fetch a policy page by slug (e.g. `privacy-policy`).
    pub async fn fetch_policy(&self, slug: &str) -> ApiResult<Policy> {
        let url = self.url_with_segment("/policies", slug)?;
        let response = self.request(Method::GET, &url, None, false, true).await?;
        let mut policy: Policy = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))?;
        if policy.slug.is_none() {
            policy.slug = Some(slug.to_string());
        }
        Ok(policy)
    }

    /// Submit the public contact form. Returns the server's confirmation message.
    pub async fn send_message(&self, message: &ContactMessage) -> ApiResult<String> {
        message.validate().map_err(ApiError::Validation)?;
        let body = serde_json::to_value(message)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let value = self.send_json(Method::POST, "/contact/send-message", Some(&body), false).await?;
        Ok(Self::message_or(value, "Message sent successfully!"))
    }

    fn message_or(value: Value, default: &str) -> String {
        serde_json::from_value::<MessageResponse>(value)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or_else(|| default.to_string())
    }

    // ===== Authentication =====

    /// Log in and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<String> {
        let body = json!({ "email": email, "password": password });
        let url = self.url("/auth/login")?;
        let response = match self.request(Method::POST, &url, Some(&body), false, false).await {
            Ok(r) => r,
            Err(ApiError::Unauthorized) | Err(ApiError::Api { status: 400, .. }) => {
                return Err(ApiError::Validation("Invalid credentials".to_string()));
            }
            Err(e) => return Err(e),
        };

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("login response: {}", e)))?;
        login
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("login response has no token".to_string()))
    }

    /// Ask the API to email a one-time code for a password reset.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<String> {
        if email.trim().is_empty() {
            return Err(ApiError::Validation("Email is required.".to_string()));
        }
        let body = json!({ "email": email.trim() });
        let value = self.send_json(Method::POST, "/auth/forgot-password", Some(&body), false).await?;
        Ok(Self::message_or(value, "OTP sent to your email."))
    }

    /// Verify the emailed code. Returns the reset token when the API issues one.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> ApiResult<Option<String>> {
        let otp = otp.trim();
        if otp.len() < MIN_OTP_LENGTH {
            return Err(ApiError::Validation("Enter the full OTP code.".to_string()));
        }
        let body = json!({ "email": email, "otp": otp });
        let value = self.send_json(Method::POST, "/auth/verify-otp", Some(&body), false).await?;
        Ok(serde_json::from_value::<VerifyOtpResponse>(value)
            .ok()
            .and_then(|r| r.reset_token))
    }

    pub async fn reset_password(&self, email: &str, reset_token: &str, new_password: &str) -> ApiResult<()> {
        if email.is_empty() {
            return Err(ApiError::Validation("Missing email. Please restart the reset flow.".to_string()));
        }
        if reset_token.is_empty() {
            return Err(ApiError::Validation("Missing or expired reset token.".to_string()));
        }
        let body = json!({ "email": email, "resetToken": reset_token, "newPassword": new_password });
        self.send_json(Method::POST, "/auth/reset-password", Some(&body), false).await?;
        Ok(())
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> ApiResult<()> {
        let body = json!({ "currentPassword": current_password, "newPassword": new_password });
        self.send_json(Method::POST, "/auth/change-password", Some(&body), true).await?;
        Ok(())
    }

    // ===== Admin CRUD =====

    /// Authenticated read of a collection as the admin editors see it.
    pub async fn list(&self, resource: Resource) -> ApiResult<Value> {
        self.send_json(Method::GET, &resource.path(), None, true).await
    }

    pub async fn create<B: Serialize>(&self, resource: Resource, body: &B) -> ApiResult<Value> {
        if !resource.is_list() {
            return Err(ApiError::Validation(format!("{} cannot be created, only updated", resource)));
        }
        let body = Self::to_body(body)?;
        self.send_json(Method::POST, &resource.path(), Some(&body), true).await
    }

    /// Update an item. `contact` is a single document and takes no id.
    pub async fn update<B: Serialize>(&self, resource: Resource, id: Option<&str>, body: &B) -> ApiResult<Value> {
        let body = Self::to_body(body)?;
        let url = match (resource.is_list(), id) {
            (false, _) => self.url(&resource.path())?,
            (true, Some(id)) => self.url_with_segment(&resource.path(), id)?,
            (true, None) => {
                return Err(ApiError::Validation(format!("updating {} requires an id", resource)));
            }
        };
        let response = self.request(Method::PUT, &url, Some(&body), true, false).await?;
        Self::decode_body(response, &url).await
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> ApiResult<Value> {
        if !resource.is_list() {
            return Err(ApiError::Validation(format!("{} cannot be deleted", resource)));
        }
        let url = self.url_with_segment(&resource.path(), id)?;
        let response = self.request(Method::DELETE, &url, None, true, false).await?;
        Self::decode_body(response, &url).await
    }

    /// Home page content edited from the dashboard.
    pub async fn fetch_home(&self) -> ApiResult<Value> {
        self.send_json(Method::GET, "/admin/home", None, true).await
    }

    pub async fn update_home(&self, body: &Value) -> ApiResult<Value> {
        self.send_json(Method::PUT, "/admin/home", Some(body), true).await
    }

    pub async fn update_policy(&self, slug: &str, policy: &Policy) -> ApiResult<Value> {
        let url = self.url_with_segment("/policies", slug)?;
        let body = Self::to_body(&policy.to_update_body())?;
        let response = self.request(Method::PUT, &url, Some(&body), true, false).await?;
        Self::decode_body(response, &url).await
    }

    fn to_body<B: Serialize>(body: &B) -> ApiResult<Value> {
        serde_json::to_value(body).map_err(|e| ApiError::Validation(format!("invalid request body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = ApiClient::new("https://api.example.com/api/").unwrap();
        assert_eq!(api.base_url(), "https://api.example.com/api");
        assert_eq!(api.url("/partners").unwrap(), "https://api.example.com/api/partners");
        assert_eq!(api.url("team").unwrap(), "https://api.example.com/api/team");
    }

    #[test]
    fn test_url_requires_base() {
        let api = ApiClient::new("  ").unwrap();
        assert!(matches!(api.url("/faqs"), Err(ApiError::NotConfigured)));
    }

    #[test]
    fn test_segment_is_percent_encoded() {
        let api = ApiClient::new("https://api.example.com/api").unwrap();
        assert_eq!(
            api.url_with_segment("/policies", "terms & conditions").unwrap(),
            "https://api.example.com/api/policies/terms%20&%20conditions"
        );
        assert_eq!(
            api.url_with_segment("/partners", "a/b").unwrap(),
            "https://api.example.com/api/partners/a%2Fb"
        );
    }

    #[test]
    fn test_auth_headers_require_token() {
        let api = ApiClient::new("https://api.example.com").unwrap();
        assert!(api.auth_headers(false).unwrap().is_empty());
        assert!(matches!(api.auth_headers(true), Err(ApiError::Unauthorized)));

        let authed = api.with_token("abc");
        let headers = authed.auth_headers(true).unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
        assert!(!api.has_token());
    }

    #[test]
    fn test_message_or_default() {
        assert_eq!(ApiClient::message_or(json!({"message": "Sent"}), "x"), "Sent");
        assert_eq!(ApiClient::message_or(Value::Null, "fallback"), "fallback");
    }

    #[tokio::test]
    async fn test_validation_happens_before_network() {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let err = api.verify_otp("a@b.com", "12").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = api.create(Resource::Contact, &json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = api.update(Resource::Team, None, &json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = api.send_message(&ContactMessage::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    mod served {
        //! Requests against a canned HTTP/1.1 server on a local port.

        use std::sync::Mutex;

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        use super::*;

        fn reply(status_line: &str, body: &str) -> String {
            format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            )
        }

        /// Answer each connection by request path, recording the raw request head.
        async fn serve(routes: Vec<(&'static str, String)>) -> (String, Arc<Mutex<Vec<String>>>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let seen = Arc::new(Mutex::new(Vec::new()));
            let log = seen.clone();

            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let mut head = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => head.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&head).to_string();
                    let path = head.split_whitespace().nth(1).unwrap_or_default().to_string();
                    log.lock().unwrap().push(head);

                    let response = routes
                        .iter()
                        .find(|(route, _)| path.ends_with(route))
                        .map(|(_, response)| response.clone())
                        .unwrap_or_else(|| reply("404 Not Found", "{}"));
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });

            (format!("http://{}/api", addr), seen)
        }

        #[tokio::test]
        async fn test_fetch_resource_sends_no_cache_and_returns_json() {
            let (base, seen) = serve(vec![(
                "/partners",
                reply("200 OK", r#"[{"id":"p1","name":"Acme"}]"#),
            )])
            .await;
            let api = ApiClient::new(base).unwrap();

            let body = api.fetch_resource(Resource::Partners).await.unwrap();

            assert_eq!(body, json!([{"id": "p1", "name": "Acme"}]));
            let requests = seen.lock().unwrap().clone();
            assert_eq!(requests.len(), 1);
            let head = requests[0].to_ascii_lowercase();
            assert!(head.starts_with("get /api/partners "), "{}", head);
            assert!(head.contains("cache-control: no-cache"), "{}", head);
            assert!(head.contains("pragma: no-cache"), "{}", head);
            assert!(!head.contains("authorization:"), "{}", head);
        }

        #[tokio::test]
        async fn test_fetch_resource_non_success_is_status_only_error() {
            let (base, seen) = serve(vec![
                ("/team", reply("500 Internal Server Error", r#"{"message":"db down"}"#)),
                ("/faqs", reply("429 Too Many Requests", "{}")),
            ])
            .await;
            let api = ApiClient::new(base).unwrap();

            let err = api.fetch_resource(Resource::Team).await.unwrap_err();
            assert!(matches!(err, ApiError::Api { status: 500, .. }), "{:?}", err);
            let message = err.to_string();
            assert!(message.contains("Internal Server Error"), "{}", message);
            assert!(message.ends_with("/api/team)"), "{}", message);
            assert!(!message.contains("db down"), "{}", message);

            // Rate limiting is not retried on this path.
            let err = api.fetch_resource(Resource::Faqs).await.unwrap_err();
            assert!(matches!(err, ApiError::Api { status: 429, .. }), "{:?}", err);
            assert_eq!(seen.lock().unwrap().len(), 2);
        }
    }
}
