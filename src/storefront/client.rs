use crate::config::{ApiConfig, PRODUCTS_PATH, USER_OFFER_PATH};
use crate::http::build_client;
use crate::storefront::offers::Offer;
use crate::submission::payload::ProductPayload;
use reqwest::{Client, Method, StatusCode, multipart::Form};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum ApiRequestError {
    #[error("missing access token for authenticated request")]
    MissingCredentials,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {status}")]
    Status {
        status: StatusCode,
        body: Option<Value>,
    },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid request body: {0}")]
    Encode(String),
}

impl ApiRequestError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiRequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded JSON error body, when the backend sent one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiRequestError::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// The storefront backend calls this crate depends on.
pub trait StorefrontApi: Send + Sync {
    /// `Ok(None)` when the backend has no offer for the caller.
    fn user_offer(&self) -> impl Future<Output = Result<Option<Offer>, ApiRequestError>> + Send;

    fn create_product(
        &self,
        payload: ProductPayload,
    ) -> impl Future<Output = Result<Value, ApiRequestError>> + Send;
}

#[derive(Debug, Clone)]
pub struct StorefrontClient {
    config: ApiConfig,
    http: Client,
    access_token: Option<String>,
}

impl StorefrontClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: build_client(&config),
            config,
            access_token: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env())
    }

    /// A copy of this client that authenticates as `token`. The underlying
    /// connection pool is shared.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            config: self.config.clone(),
            http: self.http.clone(),
            access_token: Some(token.into()),
        }
    }

    pub async fn api_request<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: RequestBody,
        authenticated: bool,
    ) -> Result<T, ApiRequestError> {
        let url = self.config.url(path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if authenticated {
            let token = self
                .access_token
                .as_deref()
                .filter(|token| !token.is_empty())
                .ok_or(ApiRequestError::MissingCredentials)?;
            request = request.bearer_auth(token);
        }
        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request
            .send()
            .await
            .map_err(|err| ApiRequestError::Transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiRequestError::Transport(err.to_string()))?;
        debug!(
            target = "storefront.http",
            method = %method,
            url = %url,
            status = status.as_u16(),
            bytes = bytes.len(),
            "backend_response"
        );

        if !status.is_success() {
            return Err(ApiRequestError::Status {
                status,
                body: serde_json::from_slice(&bytes).ok(),
            });
        }
        if bytes.is_empty() {
            return serde_json::from_value(Value::Null)
                .map_err(|err| ApiRequestError::Decode(err.to_string()));
        }
        serde_json::from_slice(&bytes).map_err(|err| ApiRequestError::Decode(err.to_string()))
    }
}

impl StorefrontApi for StorefrontClient {
    async fn user_offer(&self) -> Result<Option<Offer>, ApiRequestError> {
        match self
            .api_request::<Offer>(USER_OFFER_PATH, Method::GET, RequestBody::Empty, true)
            .await
        {
            Ok(offer) => Ok(Some(offer)),
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_product(&self, payload: ProductPayload) -> Result<Value, ApiRequestError> {
        let form = payload
            .into_form()
            .map_err(|err| ApiRequestError::Encode(err.to_string()))?;
        self.api_request(PRODUCTS_PATH, Method::POST, RequestBody::Multipart(form), true)
            .await
    }
}
