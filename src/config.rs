use once_cell::sync::Lazy;
use std::{env, time::Duration};

pub static API_ROOT: Lazy<String> = Lazy::new(|| {
    env::var("STOREFRONT_API_URL")
        .ok()
        .map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "http://localhost:8000/api".to_string())
});

pub static HTTP_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| env_u64("HTTP_TIMEOUT_SECS").unwrap_or(15));

pub static HTTP_CONNECT_TIMEOUT_SECS: Lazy<u64> =
    Lazy::new(|| env_u64("HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(5));

pub const USER_OFFER_PATH: &str = "/shops/offers/me/";
pub const PRODUCTS_PATH: &str = "/products/";

/// Connection settings for the storefront backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub root: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            root: API_ROOT.clone(),
            timeout: Duration::from_secs(*HTTP_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(*HTTP_CONNECT_TIMEOUT_SECS),
        }
    }

    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: root.into().trim_end_matches('/').to_string(),
            ..Self::from_env()
        }
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.root)
        } else {
            format!("{}/{path}", self.root)
        }
    }
}

pub fn port_from_env() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080)
}

pub fn body_limit_from_env() -> usize {
    env::var("REQUEST_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(20 * 1024 * 1024)
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}
