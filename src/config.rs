use crate::domain::Category;
use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
/// Models and system status cadence.
pub const MODELS_REFRESH_SECS: u64 = 60;
/// News and social cadence.
pub const FEEDS_REFRESH_SECS: u64 = 600;
pub const REQUEST_TIMEOUT_SECS: u64 = 15;
pub const MODELS_INTERVAL_BOUNDS: (u64, u64) = (5, 3_600);
pub const FEEDS_INTERVAL_BOUNDS: (u64, u64) = (30, 86_400);
pub const DEFAULT_WEBUI_PORT: u16 = 8080;
pub const LOG_FILE: &str = "modelboard.log";

/// Endpoint path templates. `{id}` is replaced with the url-encoded model id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointPaths {
    pub models: String,
    pub model_detail: String,
    pub model_chart: String,
    pub news: String,
    pub social: String,
    pub system_status: String,
    pub toggle_model: String,
    pub trigger_cycle: String,
    pub model_view: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            models: "/api/models".to_string(),
            model_detail: "/api/models/{id}".to_string(),
            model_chart: "/api/models/{id}/chart".to_string(),
            news: "/api/news".to_string(),
            social: "/api/social".to_string(),
            system_status: "/api/system/status".to_string(),
            toggle_model: "/api/models/{id}/toggle".to_string(),
            trigger_cycle: "/api/system/trigger-cycle".to_string(),
            model_view: "/api/models/{id}/view".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub token_header: String,
    pub token_prefix: String,
    pub request_timeout: Duration,
    pub paths: EndpointPaths,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            token_header: "Authorization".to_string(),
            token_prefix: "Bearer".to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            paths: EndpointPaths::default(),
        }
    }
}

impl ApiConfig {
    pub fn endpoint(&self, path: &str) -> String {
        let normalized = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        format!("{}{}", self.base_url, normalized)
    }

    pub fn model_endpoint(&self, template: &str, id: &str) -> String {
        self.endpoint(&template.replace("{id}", &urlencoding::encode(id)))
    }
}

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub models_interval: Duration,
    pub feeds_interval: Duration,
    pub categories: Vec<Category>,
    pub timezone: Tz,
    pub webui_port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            models_interval: Duration::from_secs(MODELS_REFRESH_SECS),
            feeds_interval: Duration::from_secs(FEEDS_REFRESH_SECS),
            categories: Category::ALL.to_vec(),
            timezone: Tz::UTC,
            webui_port: DEFAULT_WEBUI_PORT,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(url) = get("MODELBOARD_API_URL") {
            cfg.api.base_url = normalize_base_url(&url)?;
        }
        cfg.api.token = get("MODELBOARD_API_TOKEN");
        if let Some(header) = get("MODELBOARD_API_TOKEN_HEADER") {
            cfg.api.token_header = header;
        }
        if let Some(prefix) = lookup("MODELBOARD_API_TOKEN_PREFIX") {
            cfg.api.token_prefix = prefix.trim().to_string();
        }

        cfg.api.request_timeout = Duration::from_secs(parse_clamped(
            get("MODELBOARD_REQUEST_TIMEOUT_SECS"),
            "MODELBOARD_REQUEST_TIMEOUT_SECS",
            1,
            120,
            REQUEST_TIMEOUT_SECS,
        ));
        cfg.models_interval = Duration::from_secs(parse_clamped(
            get("MODELBOARD_MODELS_INTERVAL_SECS"),
            "MODELBOARD_MODELS_INTERVAL_SECS",
            MODELS_INTERVAL_BOUNDS.0,
            MODELS_INTERVAL_BOUNDS.1,
            MODELS_REFRESH_SECS,
        ));
        cfg.feeds_interval = Duration::from_secs(parse_clamped(
            get("MODELBOARD_FEEDS_INTERVAL_SECS"),
            "MODELBOARD_FEEDS_INTERVAL_SECS",
            FEEDS_INTERVAL_BOUNDS.0,
            FEEDS_INTERVAL_BOUNDS.1,
            FEEDS_REFRESH_SECS,
        ));

        if let Some(raw) = get("MODELBOARD_CATEGORIES") {
            cfg.categories = parse_categories(&raw)?;
        }

        if let Some(tz) = get("MODELBOARD_TZ") {
            cfg.timezone = tz
                .parse::<Tz>()
                .map_err(|_| anyhow!("Unknown MODELBOARD_TZ '{}', use an IANA name like Europe/London", tz))?;
        }

        if let Some(port) = get("MODELBOARD_WEBUI_PORT") {
            cfg.webui_port = port
                .parse::<u16>()
                .map_err(|_| anyhow!("Invalid MODELBOARD_WEBUI_PORT: {}", port))?;
        }

        let paths = &mut cfg.api.paths;
        for (key, slot) in [
            ("MODELBOARD_PATH_MODELS", &mut paths.models),
            ("MODELBOARD_PATH_MODEL_DETAIL", &mut paths.model_detail),
            ("MODELBOARD_PATH_MODEL_CHART", &mut paths.model_chart),
            ("MODELBOARD_PATH_NEWS", &mut paths.news),
            ("MODELBOARD_PATH_SOCIAL", &mut paths.social),
            ("MODELBOARD_PATH_SYSTEM_STATUS", &mut paths.system_status),
            ("MODELBOARD_PATH_TOGGLE_MODEL", &mut paths.toggle_model),
            ("MODELBOARD_PATH_TRIGGER_CYCLE", &mut paths.trigger_cycle),
            ("MODELBOARD_PATH_MODEL_VIEW", &mut paths.model_view),
        ] {
            if let Some(path) = get(key) {
                *slot = path;
            }
        }

        Ok(cfg)
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(anyhow!(
            "API url '{}' must start with http:// or https://",
            raw.trim()
        ));
    }
    Ok(trimmed.to_string())
}

pub fn parse_categories(raw: &str) -> Result<Vec<Category>> {
    let mut categories: Vec<Category> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let category = Category::from(part.to_string());
        if let Category::Other(name) = &category {
            return Err(anyhow!(
                "Unknown category '{}'. Allowed values: stock | polymarket | bitmex | forex",
                name
            ));
        }
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    if categories.is_empty() {
        return Err(anyhow!("At least one category is required"));
    }
    Ok(categories)
}

fn parse_clamped(raw: Option<String>, key: &str, min: u64, max: u64, default: u64) -> u64 {
    match raw {
        None => default,
        Some(value) => match value.parse::<u64>() {
            Ok(v) => v.clamp(min, max),
            Err(_) => {
                warn!(
                    "Invalid {}={} ; defaulting to {}",
                    key, value, default
                );
                default
            }
        },
    }
}
