use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub states_path: PathBuf,
    pub snapshot_dir: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    /// Upper bound on the readiness wait after navigation.
    pub scraper_page_load_timeout_secs: u64,
    /// Pause after the page reports ready, before scrolling.
    pub scraper_settle_delay_ms: u64,
    pub scraper_scroll_steps: u32,
    pub scraper_scroll_step_px: u32,
    pub scraper_scroll_delay_ms: u64,
    /// Pause between consecutive routes in a multi-route run.
    pub scraper_route_delay_ms: u64,
    pub scraper_routes_per_state: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("states_path", &self.states_path)
            .field("snapshot_dir", &self.snapshot_dir)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .field(
                "scraper_page_load_timeout_secs",
                &self.scraper_page_load_timeout_secs,
            )
            .field("scraper_settle_delay_ms", &self.scraper_settle_delay_ms)
            .field("scraper_scroll_steps", &self.scraper_scroll_steps)
            .field("scraper_scroll_step_px", &self.scraper_scroll_step_px)
            .field("scraper_scroll_delay_ms", &self.scraper_scroll_delay_ms)
            .field("scraper_route_delay_ms", &self.scraper_route_delay_ms)
            .field("scraper_routes_per_state", &self.scraper_routes_per_state)
            .finish()
    }
}
