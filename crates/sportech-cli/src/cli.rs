//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sportech_core::config::API_URL_ENV;
use sportech_core::models::Resource;

#[derive(Parser, Debug)]
#[command(name = "sportech")]
#[command(version, about = "Sportech site data and admin tools")]
pub struct Cli {
    /// API base URL, e.g. https://api.example.com/api (overrides config)
    #[arg(long, env = API_URL_ENV, global = true)]
    pub api_url: Option<String>,

    /// Cache freshness window in hours (overrides config, default 12)
    #[arg(long, global = true)]
    pub ttl_hours: Option<u64>,

    /// Keep the site data snapshot in memory only
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Also write logs to a daily file in the cache directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load site data, skipping the network while the cache is fresh
    Fetch {
        /// Refetch even if the cache is fresh
        #[arg(long)]
        force: bool,
    },
    /// Show cache and session status
    Status,
    /// Print one cached collection
    Show {
        /// partners, services, faqs, contact, team or feedback
        resource: Resource,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
        /// Fetch first if the cache is empty or stale
        #[arg(long)]
        refresh: bool,
    },
    /// Drop all cached site data
    Clear,
    /// Log in to the admin API
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored admin token
    Logout,
    /// Start a password reset; an OTP is emailed
    ForgotPassword { email: String },
    /// Verify the emailed OTP
    VerifyOtp { otp: String },
    /// Set a new password after a verified OTP
    ResetPassword,
    /// Change the password of the logged-in admin
    ChangePassword,
    /// Admin CRUD over site resources
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
    /// Policy pages (privacy-policy, terms-conditions, ...)
    Policy {
        #[command(subcommand)]
        action: PolicyCommand,
    },
    /// Submit the public contact form
    SendMessage(SendMessageArgs),
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// List a resource as the admin panel sees it
    List { resource: Resource },
    /// Create an item
    Create {
        resource: Resource,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Update an item (contact takes no id)
    Update {
        resource: Resource,
        id: Option<String>,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Delete an item
    Delete { resource: Resource, id: String },
    /// Show home page content
    Home,
    /// Replace home page content
    UpdateHome {
        #[command(flatten)]
        body: BodyArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Print a policy page
    Show { slug: String },
    /// Replace a policy page from a JSON file
    Update { slug: String, file: PathBuf },
}

/// JSON request body, inline or from a file.
#[derive(Args, Debug)]
pub struct BodyArgs {
    /// Inline JSON body
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Path to a JSON file with the body
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SendMessageArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long)]
    pub message: String,
}
