use std::path::PathBuf;

use projecthub_core::upload::DEFAULT_MAX_FILE_SIZE;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and JWT secrets have defaults suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for background jobs on shutdown (default: `5`).
    pub shutdown_timeout_secs: u64,
    /// Root directory for uploaded files (default: `uploads`).
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes (default: 5 MiB).
    pub max_file_size: usize,
    /// Notify users when they are added to an existing project.
    pub notify_member_added: bool,
    /// Interval for purging old read notifications. `None` disables the job.
    pub notification_purge_interval_hours: Option<u64>,
    /// Age in days after which read notifications are purged (default: `30`).
    pub notification_retention_days: i64,
    /// Interval between due-date reminder passes (default: `3600`).
    pub reminder_interval_secs: u64,
    /// JWT token configuration (secrets, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                             | Default                 |
    /// |-------------------------------------|-------------------------|
    /// | `HOST`                              | `0.0.0.0`               |
    /// | `PORT`                              | `5000`                  |
    /// | `DATABASE_URL`                      | **required**            |
    /// | `CORS_ORIGINS`                      | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`              | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`             | `5`                     |
    /// | `UPLOAD_DIR`                        | `uploads`               |
    /// | `MAX_FILE_SIZE`                     | `5242880`               |
    /// | `NOTIFY_MEMBER_ADDED`               | `false`                 |
    /// | `NOTIFICATION_PURGE_INTERVAL_HOURS` | unset (disabled)        |
    /// | `NOTIFICATION_RETENTION_DAYS`       | `30`                    |
    /// | `REMINDER_INTERVAL_SECS`            | `3600`                  |
    ///
    /// # Panics
    ///
    /// Panics on a missing `DATABASE_URL` or an unparseable value, so a
    /// misconfigured server fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let upload_dir =
            PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));

        let max_file_size: usize = std::env::var("MAX_FILE_SIZE")
            .map(|v| v.parse().expect("MAX_FILE_SIZE must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);

        let notify_member_added = std::env::var("NOTIFY_MEMBER_ADDED")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let notification_purge_interval_hours = std::env::var("NOTIFICATION_PURGE_INTERVAL_HOURS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| {
                v.parse()
                    .expect("NOTIFICATION_PURGE_INTERVAL_HOURS must be a valid u64")
            });

        let notification_retention_days: i64 = std::env::var("NOTIFICATION_RETENTION_DAYS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("NOTIFICATION_RETENTION_DAYS must be a valid i64");

        let reminder_interval_secs: u64 = std::env::var("REMINDER_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("REMINDER_INTERVAL_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            database_url,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            upload_dir,
            max_file_size,
            notify_member_added,
            notification_purge_interval_hours,
            notification_retention_days,
            reminder_interval_secs,
            jwt,
        }
    }
}
