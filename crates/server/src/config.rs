//! Process configuration, read from flags and environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use chrono::NaiveTime;
use clap::Args;
use internhub_lifecycle::LifecycleConfig;
use internhub_notify::{DeliveryChannel, NotifyConfig};
use internhub_scheduler::SchedulerConfig;
use tracing_subscriber::EnvFilter;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Directory holding the JSON store
    #[arg(long, global = true, env = "INTERNHUB_DATA_DIR", default_value = ".internhub")]
    pub data_dir: PathBuf,

    /// Reject evaluations of already evaluated reports
    #[arg(long, global = true, env = "INTERNHUB_NO_REEVALUATION")]
    pub no_reevaluation: bool,

    /// POST every notification to this URL
    #[arg(long, global = true, env = "INTERNHUB_WEBHOOK_URL")]
    pub webhook: Option<String>,

    /// Webhook request timeout in seconds
    #[arg(long, global = true, env = "INTERNHUB_WEBHOOK_TIMEOUT", default_value = "5")]
    pub webhook_timeout: u64,

    /// Log notifications instead of only storing them
    #[arg(long, global = true)]
    pub log_notifications: bool,
}

/// Options for the long-running server.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "INTERNHUB_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Daily tick time, HH:MM in UTC
    #[arg(long, env = "INTERNHUB_FIRE_AT", default_value = "00:00", value_parser = parse_fire_at)]
    pub fire_at: NaiveTime,

    /// Run a tick as soon as the server starts
    #[arg(long)]
    pub tick_on_start: bool,
}

/// Resolved configuration for one process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Store directory
    pub data_dir: PathBuf,
    /// Listen address
    pub bind: SocketAddr,
    /// Lifecycle settings
    pub lifecycle: LifecycleConfig,
    /// Notification settings
    pub notify: NotifyConfig,
    /// Scheduler settings
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Build from shared options, with server options when serving.
    pub fn from_args(global: &GlobalArgs, serve: Option<&ServeArgs>) -> Self {
        let channel = match (&global.webhook, global.log_notifications) {
            (Some(url), _) => DeliveryChannel::Webhook { url: url.clone() },
            (None, true) => DeliveryChannel::Log,
            (None, false) => DeliveryChannel::None,
        };

        let mut scheduler = SchedulerConfig::default();
        let mut bind = SocketAddr::from(([0, 0, 0, 0], 5000));
        if let Some(serve) = serve {
            scheduler = scheduler
                .with_fire_at(serve.fire_at)
                .with_run_on_start(serve.tick_on_start);
            bind = serve.bind;
        }

        Self {
            data_dir: global.data_dir.clone(),
            bind,
            lifecycle: LifecycleConfig::default().with_reevaluation(!global.no_reevaluation),
            notify: NotifyConfig::default()
                .with_channel(channel)
                .with_webhook_timeout(Duration::from_secs(global.webhook_timeout)),
            scheduler,
        }
    }
}

/// Parse a `HH:MM` (or `HH:MM:SS`) time of day.
pub fn parse_fire_at(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("invalid time of day {s:?}: {e}"))
}

/// Install the tracing subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
