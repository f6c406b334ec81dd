use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

use crate::api_connection::endpoints::DEFAULT_GATEWAY_URL;

pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
/// Flat per-item estimate used when a store has no catalog price for an item.
pub const DEFAULT_FALLBACK_PRICE: f64 = 2.50;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub api_key_env_var: String,
    pub endpoint_url: String,
    pub model: String,
    pub site_url: String,
    pub app_name: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
            endpoint_url: DEFAULT_GATEWAY_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            site_url: "http://localhost:3000".to_string(),
            app_name: "PantryPlanner".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub price_catalog_path: Option<PathBuf>,
    pub fallback_price: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            price_catalog_path: None,
            fallback_price: DEFAULT_FALLBACK_PRICE,
        }
    }
}

impl AppConfig {
    /// Reads `.env` and the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let gateway = GatewayConfig {
            api_key_env_var: lookup("PLANNER_API_KEY_VAR").unwrap_or(defaults.gateway.api_key_env_var),
            endpoint_url: lookup("PLANNER_GATEWAY_URL").unwrap_or(defaults.gateway.endpoint_url),
            model: lookup("PLANNER_MODEL").unwrap_or(defaults.gateway.model),
            site_url: lookup("SITE_URL").unwrap_or(defaults.gateway.site_url),
            app_name: lookup("APP_NAME").unwrap_or(defaults.gateway.app_name),
        };
        let fallback_price = lookup("PLANNER_FALLBACK_PRICE")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|price| price.is_finite() && *price >= 0.0)
            .unwrap_or(defaults.fallback_price);

        Self {
            gateway,
            price_catalog_path: lookup("PLANNER_PRICE_CATALOG")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            fallback_price,
        }
    }
}
