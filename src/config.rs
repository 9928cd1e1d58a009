use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use clap::Parser;

/// Server configuration, read from flags or `ATTENDANCE_*` environment variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "attendance-server")]
#[command(version, about = "Student attendance tracking server", long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "ATTENDANCE_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Directory holding the ledger, accounts and sessions
    #[arg(long, env = "ATTENDANCE_DATA_DIR", default_value = "attendance-data")]
    pub data_dir: PathBuf,

    /// Student directory database; defaults to `directory.db` inside the data directory
    #[arg(long, env = "ATTENDANCE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Lifetime of a login session, in hours
    #[arg(long, env = "ATTENDANCE_SESSION_HOURS", default_value_t = 48)]
    pub session_hours: i64,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "ATTENDANCE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_hours)
    }

    pub fn directory_db(&self) -> PathBuf {
        self.data_dir.join("directory.db")
    }
}
