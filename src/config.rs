use clap::{Parser, ValueEnum};
use std::time::Duration;
use url::Url;

use crate::error::ClientError;

/// Crash alert dashboard client — live push alerts plus history and road advisory.
#[derive(Parser, Debug, Clone)]
#[command(name = "crash-alert-client")]
pub struct CliArgs {
    /// Base URL of the dashboard backend
    #[arg(short = 's', long = "server", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Push channel endpoint (defaults to <server>/ws with a ws/wss scheme)
    #[arg(long = "ws-url")]
    pub ws_url: Option<String>,

    /// Which dashboard view to run; selects the notification capacity
    #[arg(long = "view", value_enum, default_value_t = View::Operator)]
    pub view: View,

    /// Override the notification capacity of the selected view
    #[arg(long = "capacity")]
    pub capacity: Option<usize>,

    /// Delay before reconnecting a lost push channel
    #[arg(long = "reconnect-delay-ms", default_value_t = RECONNECT_DELAY_MS)]
    pub reconnect_delay_ms: u64,

    /// Number of history rows to skip
    #[arg(long = "history-skip")]
    pub history_skip: Option<u32>,

    /// Maximum number of history rows to fetch
    #[arg(long = "history-limit")]
    pub history_limit: Option<u32>,

    /// Latitude reported by the console location provider
    #[arg(long = "lat", allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude reported by the console location provider
    #[arg(long = "lon", allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Answer location permission requests with "denied"
    #[arg(long = "deny-location")]
    pub deny_location: bool,

    /// Timeout for history and advisory requests
    #[arg(long = "request-timeout-secs", default_value_t = REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Control-room dashboard
    Operator,
    /// Driver-facing web app
    EndUser,
}

impl View {
    pub fn default_capacity(self) -> usize {
        match self {
            View::Operator => OPERATOR_NOTIFICATION_CAPACITY,
            View::EndUser => END_USER_NOTIFICATION_CAPACITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub server_url: Url,
    pub ws_url: Url,
    pub view: View,
    pub notification_capacity: usize,
    pub reconnect_delay: Duration,
    pub history_skip: Option<u32>,
    pub history_limit: Option<u32>,
    pub request_timeout: Duration,
    pub position_timeout: Duration,
}

// Server constants
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const PUSH_PATH: &str = "/ws";
pub const HISTORY_PATH: &str = "/api/crashes/history";
pub const ADVISORY_PATH: &str = "/api/weather_conditions";

// Notification store constants
pub const OPERATOR_NOTIFICATION_CAPACITY: usize = 20;
pub const END_USER_NOTIFICATION_CAPACITY: usize = 10;

// Connection constants
pub const RECONNECT_DELAY_MS: u64 = 5000;
pub const EVENT_CHANNEL_SIZE: usize = 64;

// Request constants
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
pub const POSITION_TIMEOUT_MS: u64 = 10_000;

impl DashboardConfig {
    pub fn from_args(args: CliArgs) -> Result<Self, ClientError> {
        let server_url = Url::parse(&args.server)
            .map_err(|e| ClientError::InvalidConfig(format!("server URL {:?}: {}", args.server, e)))?;

        let ws_url = match &args.ws_url {
            Some(raw) => Url::parse(raw)
                .map_err(|e| ClientError::InvalidConfig(format!("push URL {:?}: {}", raw, e)))?,
            None => derive_push_url(&server_url)?,
        };
        if !matches!(ws_url.scheme(), "ws" | "wss") {
            return Err(ClientError::InvalidConfig(format!(
                "push URL must use ws or wss, got {}",
                ws_url.scheme()
            )));
        }

        Ok(DashboardConfig {
            server_url,
            ws_url,
            view: args.view,
            notification_capacity: args
                .capacity
                .unwrap_or_else(|| args.view.default_capacity()),
            reconnect_delay: Duration::from_millis(args.reconnect_delay_ms),
            history_skip: args.history_skip,
            history_limit: args.history_limit,
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            position_timeout: Duration::from_millis(POSITION_TIMEOUT_MS),
        })
    }

    /// Config pointing at a backend base URL, with every other option at its default.
    pub fn for_server(server: &str) -> Result<Self, ClientError> {
        Self::from_args(CliArgs::parse_from(["crash-alert-client", "--server", server]))
    }

    pub fn history_url(&self) -> String {
        endpoint(&self.server_url, HISTORY_PATH)
    }

    pub fn advisory_url(&self) -> String {
        endpoint(&self.server_url, ADVISORY_PATH)
    }
}

fn endpoint(base: &Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

/// Map an http(s) backend URL onto the push endpoint (`/ws` on the same host).
pub fn derive_push_url(server_url: &Url) -> Result<Url, ClientError> {
    let scheme = match server_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::InvalidConfig(format!(
                "cannot derive push URL from scheme {}",
                other
            )))
        }
    };
    let base = server_url.as_str().trim_end_matches('/');
    let rest = base
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(base);
    Url::parse(&format!("{}://{}{}", scheme, rest, PUSH_PATH))
        .map_err(|e| ClientError::InvalidConfig(format!("push URL: {}", e)))
}
