//! Command execution for the Sportech CLI.
//!
//! `App` wires configuration, the API client, the admin session and the site
//! data cache together, and runs one command against them.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use sportech_core::api::{ApiClient, ApiError};
use sportech_core::auth::{ResetFlow, Session, SessionData};
use sportech_core::cache::{
    AppDataCache, FetchOptions, FetchOutcome, FileStore, MemoryStore, SnapshotStore,
};
use sportech_core::config::Config;
use sportech_core::models::{ContactMessage, Policy, Resource};

use crate::cli::{AdminCommand, BodyArgs, Cli, Command, PolicyCommand, SendMessageArgs};
use crate::render;

pub struct App {
    config: Config,
    cache_dir: PathBuf,
    api: ApiClient,
    session: Session,
    cache: AppDataCache,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        // A --ttl-hours override applies to this run only and is never saved.
        let ttl = config.ttl_or(cli.ttl_hours);

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let base_url = config.api_base_url_or(cli.api_url.as_deref()).unwrap_or_default();
        let mut api = ApiClient::new(base_url).context("Failed to create API client")?;

        let mut session = Session::new(cache_dir.clone());
        match session.load() {
            Ok(true) => {
                if let Some(token) = session.token() {
                    api.set_token(token);
                }
                debug!("Admin session restored");
            }
            Ok(false) => debug!("No admin session"),
            Err(e) => warn!(error = %e, "Failed to load session"),
        }

        let store = Self::open_store(&cache_dir, cli.no_persist);
        let cache = AppDataCache::open(Arc::new(api.clone()), store).with_ttl(ttl);

        Ok(Self {
            config,
            cache_dir,
            api,
            session,
            cache,
        })
    }

    /// Snapshot storage for the site data cache. Commands that never touch the
    /// cache must still run when the cache directory is unusable.
    fn open_store(cache_dir: &Path, no_persist: bool) -> Arc<dyn SnapshotStore> {
        if no_persist {
            return Arc::new(MemoryStore::new());
        }
        match FileStore::new(cache_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(error = %e, "Cache directory unavailable, keeping site data in memory");
                Arc::new(MemoryStore::new())
            }
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Fetch { force } => self.fetch(force).await,
            Command::Status => {
                render::print_status(&self.cache.snapshot(), self.cache.ttl(), &self.session, self.api.base_url());
                Ok(())
            }
            Command::Show { resource, json, refresh } => self.show(resource, json, refresh).await,
            Command::Clear => {
                self.cache.clear();
                println!("Site data cache cleared.");
                Ok(())
            }
            Command::Login { email } => self.login(email).await,
            Command::Logout => {
                self.end_session()?;
                println!("Logged out.");
                Ok(())
            }
            Command::ForgotPassword { email } => self.forgot_password(email).await,
            Command::VerifyOtp { otp } => self.verify_otp(&otp).await,
            Command::ResetPassword => self.reset_password().await,
            Command::ChangePassword => self.change_password().await,
            Command::Admin { action } => self.admin(action).await,
            Command::Policy { action } => self.policy(action).await,
            Command::SendMessage(args) => self.send_message(args).await,
        }
    }

    // =========================================================================
    // Site Data
    // =========================================================================

    async fn fetch(&self, force: bool) -> Result<()> {
        match self.cache.fetch_all(FetchOptions { force }).await {
            FetchOutcome::Fresh => {
                println!("Site data is fresh ({}), nothing fetched.", self.cache.snapshot().age_display());
            }
            FetchOutcome::Refreshed { fetched_at } => {
                println!("Site data refreshed at {}.", fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
                render::print_counts(&self.cache.snapshot());
            }
            FetchOutcome::Failed { error } => {
                bail!("Fetch failed: {}", error);
            }
        }
        Ok(())
    }

    async fn show(&self, resource: Resource, json: bool, refresh: bool) -> Result<()> {
        if refresh {
            // Stale or empty data is still shown when the refresh fails.
            if let FetchOutcome::Failed { error } = self.cache.fetch_all(FetchOptions::default()).await {
                eprintln!("warning: refresh failed: {}", error);
            }
        }
        if !self.cache.is_loaded() {
            eprintln!("Site data has not been fetched yet; run `sportech fetch`.");
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&self.cache.collection(resource))?);
        } else {
            self.cache.read(|data| render::print_collection(&data.collections, resource));
        }
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    fn prompt(label: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(d) => print!("{} [{}]: ", label, d),
            None => print!("{}: ", label),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();
        Ok(match default {
            Some(d) if input.is_empty() => d.to_string(),
            _ => input.to_string(),
        })
    }

    fn prompt_password(label: &str) -> Result<String> {
        let password = rpassword::prompt_password(format!("{}: ", label))?;
        Ok(password)
    }

    /// Prompt twice and require both entries to match.
    fn prompt_new_password() -> Result<String> {
        let password = Self::prompt_password("New password")?;
        let confirm = Self::prompt_password("Confirm new password")?;
        if password.is_empty() {
            bail!("Password cannot be empty.");
        }
        if password != confirm {
            bail!("Passwords do not match.");
        }
        Ok(password)
    }

    async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email {
            Some(e) => e,
            None => Self::prompt("Email", self.config.last_email.as_deref())?,
        };
        let password = Self::prompt_password("Password")?;
        if email.is_empty() || password.is_empty() {
            bail!("Email and password required");
        }

        let token = self.api.login(&email, &password).await?;

        self.config.last_email = Some(email.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        self.session.update(SessionData::new(token.clone(), email));
        self.session.save()?;
        self.api.set_token(token);

        info!("Login successful");
        println!("Login successful.");
        Ok(())
    }

    async fn forgot_password(&self, email: String) -> Result<()> {
        let message = self.api.forgot_password(&email).await?;
        ResetFlow::start(email.trim()).save(&self.cache_dir)?;
        println!("{}", message);
        println!("Next: sportech verify-otp <code>");
        Ok(())
    }

    fn pending_reset(&self) -> Result<ResetFlow> {
        ResetFlow::load(&self.cache_dir)?
            .ok_or_else(|| anyhow::anyhow!("No password reset in progress; run `sportech forgot-password <email>` first."))
    }

    async fn verify_otp(&self, otp: &str) -> Result<()> {
        let mut flow = self.pending_reset()?;
        flow.reset_token = self.api.verify_otp(&flow.email, otp).await?;
        flow.save(&self.cache_dir)?;
        println!("Code verified. Next: sportech reset-password");
        Ok(())
    }

    async fn reset_password(&self) -> Result<()> {
        let flow = self.pending_reset()?;
        let token = flow.reset_token.clone().unwrap_or_default();
        let password = Self::prompt_new_password()?;
        self.api.reset_password(&flow.email, &token, &password).await?;
        ResetFlow::clear(&self.cache_dir)?;
        println!("Password changed. You can now log in.");
        Ok(())
    }

    async fn change_password(&mut self) -> Result<()> {
        self.require_login()?;
        let current = Self::prompt_password("Current password")?;
        let new_password = Self::prompt_new_password()?;
        self.submit_password_change(&current, &new_password).await?;
        println!("Password changed. Log in again with `sportech login`.");
        Ok(())
    }

    /// The old token is not reused after a password change.
    async fn submit_password_change(&mut self, current: &str, new_password: &str) -> Result<()> {
        let result = self.api.change_password(current, new_password).await;
        self.check_auth(result)?;
        self.end_session()?;
        info!("Password changed, session ended");
        Ok(())
    }

    fn end_session(&mut self) -> Result<()> {
        self.api.clear_token();
        self.session.clear()
    }

    fn require_login(&self) -> Result<()> {
        if !self.session.is_valid() {
            bail!("Not logged in; run `sportech login` first.");
        }
        Ok(())
    }

    /// Drop the stored session when the API rejects the token.
    fn check_auth<T>(&mut self, result: Result<T, ApiError>) -> Result<T> {
        match result {
            Err(e) if e.is_auth_failure() => {
                if let Err(clear_err) = self.end_session() {
                    warn!(error = %clear_err, "Failed to clear session");
                }
                bail!("{} - please run `sportech login` again.", e)
            }
            other => Ok(other?),
        }
    }

    // =========================================================================
    // Admin
    // =========================================================================

    fn read_body(body: &BodyArgs) -> Result<Value> {
        let text = match (&body.data, &body.file) {
            (Some(data), _) => data.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, None) => bail!("Provide a JSON body with --data or --file"),
        };
        serde_json::from_str(&text).context("Request body is not valid JSON")
    }

    async fn admin(&mut self, action: AdminCommand) -> Result<()> {
        self.require_login()?;
        match action {
            AdminCommand::List { resource } => {
                let result = self.api.list(resource).await;
                let value = self.check_auth(result)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            AdminCommand::Create { resource, body } => {
                let body = Self::read_body(&body)?;
                let result = self.api.create(resource, &body).await;
                let created = self.check_auth(result)?;
                println!("{}", serde_json::to_string_pretty(&created)?);
                self.refresh_after_edit(resource).await;
            }
            AdminCommand::Update { resource, id, body } => {
                let body = Self::read_body(&body)?;
                let result = self.api.update(resource, id.as_deref(), &body).await;
                let updated = self.check_auth(result)?;
                println!("{}", serde_json::to_string_pretty(&updated)?);
                self.refresh_after_edit(resource).await;
            }
            AdminCommand::Delete { resource, id } => {
                let result = self.api.delete(resource, &id).await;
                self.check_auth(result)?;
                println!("Deleted {} {}.", resource, id);
                self.refresh_after_edit(resource).await;
            }
            AdminCommand::Home => {
                let result = self.api.fetch_home().await;
                let home = self.check_auth(result)?;
                println!("{}", serde_json::to_string_pretty(&home)?);
            }
            AdminCommand::UpdateHome { body } => {
                let body = Self::read_body(&body)?;
                let result = self.api.update_home(&body).await;
                let home = self.check_auth(result)?;
                println!("{}", serde_json::to_string_pretty(&home)?);
            }
        }
        Ok(())
    }

    /// Keep the site data cache in step with an edit that just succeeded.
    async fn refresh_after_edit(&self, resource: Resource) {
        if !self.cache.is_loaded() {
            return;
        }
        match self.cache.fetch_all(FetchOptions::forced()).await {
            FetchOutcome::Failed { error } => {
                warn!(%resource, error = %error, "Cache refresh after edit failed");
                eprintln!("warning: cached site data not refreshed: {}", error);
            }
            outcome => debug!(?outcome, "Cache refreshed after edit"),
        }
    }

    async fn policy(&mut self, action: PolicyCommand) -> Result<()> {
        match action {
            PolicyCommand::Show { slug } => {
                let policy = self.api.fetch_policy(&slug).await?;
                render::print_policy(&policy);
            }
            PolicyCommand::Update { slug, file } => {
                self.require_login()?;
                let text = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let policy: Policy = serde_json::from_str(&text).context("Policy file is not valid JSON")?;
                let result = self.api.update_policy(&slug, &policy).await;
                self.check_auth(result)?;
                println!("Policy '{}' saved.", slug);
            }
        }
        Ok(())
    }

    async fn send_message(&self, args: SendMessageArgs) -> Result<()> {
        let message = ContactMessage {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone: args.phone,
            message: args.message,
        };
        let reply = self.api.send_message(&message).await?;
        println!("{}", reply);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Answer one request on a local port; the handle yields the lowercased request head.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/api", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 1024];
            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                received.extend_from_slice(&chunk[..n]);
                if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                assert!(n > 0, "connection closed before the request head");
            };
            let head = String::from_utf8_lossy(&received[..head_end]).to_ascii_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while received.len() < head_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            head
        });
        (base, handle)
    }

    /// App with a saved admin session, talking to `base_url`.
    fn logged_in_app(dir: &Path, base_url: &str) -> App {
        let mut api = ApiClient::new(base_url).unwrap();
        api.set_token("old-token");
        let mut session = Session::new(dir.to_path_buf());
        session.update(SessionData::new("old-token", "admin@example.com"));
        session.save().unwrap();
        let cache = AppDataCache::open(Arc::new(api.clone()), Arc::new(MemoryStore::new()));
        App {
            config: Config::default(),
            cache_dir: dir.to_path_buf(),
            api,
            session,
            cache,
        }
    }

    #[tokio::test]
    async fn test_password_change_ends_session() {
        let dir = tempfile::tempdir().unwrap();
        let (base, request) = serve_once("200 OK", r#"{"message":"Password updated"}"#).await;
        let mut app = logged_in_app(dir.path(), &base);

        app.submit_password_change("old-pass", "new-pass").await.unwrap();

        let head = request.await.unwrap();
        assert!(head.starts_with("post /api/auth/change-password "), "{}", head);
        assert!(head.contains("authorization: bearer old-token"), "{}", head);
        assert!(!app.session.is_valid());
        assert!(!app.api.has_token());
        assert!(!Session::new(dir.path().to_path_buf()).load().unwrap());
    }

    #[tokio::test]
    async fn test_rejected_password_change_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let (base, request) =
            serve_once("400 Bad Request", r#"{"message":"Current password is incorrect"}"#).await;
        let mut app = logged_in_app(dir.path(), &base);

        let err = app.submit_password_change("wrong", "new-pass").await.unwrap_err();

        request.await.unwrap();
        assert!(err.to_string().contains("Current password is incorrect"), "{}", err);
        assert!(app.session.is_valid());
        assert!(app.api.has_token());
    }

    #[test]
    fn test_unusable_cache_dir_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let cache_dir = blocker.join("sportech");

        let store = App::open_store(&cache_dir, false);

        store.write("{}").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("{}"));
        assert!(!cache_dir.exists());
    }

    #[test]
    fn test_open_store_persists_to_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = App::open_store(dir.path(), false);
        store.write("{}").unwrap();
        assert!(dir.path().join("sportech-app-data.json").exists());

        let store = App::open_store(dir.path(), true);
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_read_body_inline() {
        let body = BodyArgs {
            data: Some(r#"{"question":"Q?","answer":"A."}"#.to_string()),
            file: None,
        };
        let value = App::read_body(&body).unwrap();
        assert_eq!(value["question"], "Q?");
    }

    #[test]
    fn test_read_body_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, r#"{"name":"Ana","role":"CTO"}"#).unwrap();
        let body = BodyArgs {
            data: None,
            file: Some(path),
        };
        assert_eq!(App::read_body(&body).unwrap()["role"], "CTO");
    }

    #[test]
    fn test_read_body_requires_input_and_valid_json() {
        let empty = BodyArgs { data: None, file: None };
        assert!(App::read_body(&empty).is_err());

        let bad = BodyArgs {
            data: Some("{not json".to_string()),
            file: None,
        };
        assert!(App::read_body(&bad).is_err());
    }
}
