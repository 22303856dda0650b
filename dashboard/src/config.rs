use crate::client::DEFAULT_ENDPOINT;
use crate::render::OutputFormat;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Startup configuration. The poll interval and endpoint are fixed for the
/// lifetime of the process.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dashboard",
    version,
    about = "Polls a water-monitoring endpoint and renders a live dashboard"
)]
pub struct Config {
    /// Endpoint returning the JSON array of readings
    #[arg(long, env = "DASHBOARD_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Poll interval in milliseconds
    #[arg(
        long,
        env = "POLL_INTERVAL_MS",
        default_value_t = DEFAULT_POLL_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_ms: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Serve /api/v1/dashboard and /metrics on this address
    #[arg(long, env = "DASHBOARD_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Fetch once, render, and exit
    #[arg(long)]
    pub once: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
