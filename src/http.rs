use crate::config::ApiConfig;
use reqwest::Client;

pub fn build_client(config: &ApiConfig) -> Client {
    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(concat!("storefront-api-rs/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}
