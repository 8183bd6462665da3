use floodwatch_risk::RiskConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// CORS allowed origins; empty allows any origin (development mode)
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Scoring configuration. `thresholds` has no default: the cut
    /// points must be chosen explicitly per deployment.
    pub risk: RiskConfig,

    #[serde(default)]
    pub recompute: RecomputeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full SeaORM connection URL; derived from `data_dir` when omitted
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            data_dir: default_data_dir(),
        }
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}/floodwatch.db?mode=rwc", self.data_dir),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeConfig {
    /// Maximum regions recomputed concurrently
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Per-region pipeline timeout
    #[serde(default = "default_region_timeout_secs")]
    pub region_timeout_secs: u64,
    /// Attempts per store operation before the region is marked failed
    #[serde(default = "default_store_retry_attempts")]
    pub store_retry_attempts: u32,
    #[serde(default = "default_store_retry_backoff_ms")]
    pub store_retry_backoff_ms: u64,
    /// Scheduled recompute interval; omitted means on-demand only
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            region_timeout_secs: default_region_timeout_secs(),
            store_retry_attempts: default_store_retry_attempts(),
            store_retry_backoff_ms: default_store_retry_backoff_ms(),
            interval_secs: None,
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_region_timeout_secs() -> u64 {
    30
}

fn default_store_retry_attempts() -> u32 {
    3
}

fn default_store_retry_backoff_ms() -> u64 {
    100
}

// ---- Seed file types (used by `init-regions` / `init-rules` CLI subcommands) ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionsSeedFile {
    #[serde(default)]
    pub regions: Vec<SeedRegion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRegion {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub area_sq_km: Option<f64>,
    #[serde(default)]
    pub water_coverage_pct: Option<f64>,
    #[serde(default)]
    pub sanitation_coverage_pct: Option<f64>,
    #[serde(default)]
    pub health_facilities_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesSeedFile {
    #[serde(default)]
    pub rules: Vec<SeedAlertRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAlertRule {
    pub name: String,
    pub alert_type: String,
    #[serde(default = "default_region_pattern")]
    pub region_pattern: String,
    #[serde(default = "default_seed_severity")]
    pub severity: String,
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,
    #[serde(default = "default_seed_auto_resolve")]
    pub auto_resolve: bool,
    pub conditions: serde_json::Value,
}

fn default_region_pattern() -> String {
    "*".to_string()
}

fn default_seed_severity() -> String {
    "warning".to_string()
}

fn default_seed_enabled() -> bool {
    true
}

fn default_seed_auto_resolve() -> bool {
    true
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.risk.validate()?;
        Ok(config)
    }
}
