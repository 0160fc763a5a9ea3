use crate::storefront::client::{ApiRequestError, StorefrontApi};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use thiserror::Error;
use tracing::{debug, warn};

/// The caller's current shop offer. Only the allowance counters are typed;
/// anything else the backend sends is kept as-is.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub free_products_remaining: u32,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub free_estates_remaining: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Offer {
    pub fn can_list_free_product(&self) -> bool {
        self.free_products_remaining > 0
    }
}

#[derive(Debug, Error)]
pub enum OfferError {
    #[error("offer lookup failed: {0}")]
    Request(#[from] ApiRequestError),
}

#[derive(Clone)]
pub struct OfferFetcher<A> {
    api: A,
}

impl<A: StorefrontApi> OfferFetcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// One authenticated lookup. A missing offer is `Ok(None)`; every other
    /// failure is reported.
    pub async fn try_fetch_user_offer(&self) -> Result<Option<Offer>, OfferError> {
        let offer = self.api.user_offer().await?;
        debug!(
            target = "storefront.offers",
            found = offer.is_some(),
            "user_offer_fetched"
        );
        Ok(offer)
    }

    /// Like [`Self::try_fetch_user_offer`] but any failure becomes `None`.
    pub async fn fetch_user_offer(&self) -> Option<Offer> {
        match self.try_fetch_user_offer().await {
            Ok(offer) => offer,
            Err(err) => {
                warn!(target = "storefront.offers", error = %err, "user_offer_lookup_failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::storefront::client::{StorefrontClient, tests::spawn_backend};
    use crate::submission::payload::ProductPayload;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    struct FailingApi;

    impl StorefrontApi for FailingApi {
        async fn user_offer(&self) -> Result<Option<Offer>, ApiRequestError> {
            Err(ApiRequestError::Transport("connection reset".into()))
        }

        async fn create_product(&self, _payload: ProductPayload) -> Result<Value, ApiRequestError> {
            Err(ApiRequestError::Transport("unused".into()))
        }
    }

    #[tokio::test]
    async fn network_failure_collapses_to_none() {
        let fetcher = OfferFetcher::new(FailingApi);
        assert_eq!(fetcher.fetch_user_offer().await, None);
        let err = fetcher.try_fetch_user_offer().await.expect_err("fails");
        assert!(matches!(
            err,
            OfferError::Request(ApiRequestError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn decodes_offer_from_backend() {
        let router = Router::new().route(
            "/api/shops/offers/me/",
            get(|| async {
                Json(json!({
                    "id": 7,
                    "user": 3,
                    "free_products_remaining": 2,
                    "free_estates_remaining": "1",
                    "created_at": "2024-05-01T10:00:00.123456Z",
                    "updated_at": "2024-05-02T08:30:00+03:00"
                }))
            }),
        );
        let api = StorefrontClient::new(ApiConfig::with_root(spawn_backend(router).await))
            .with_token("tok");
        let offer = OfferFetcher::new(api)
            .fetch_user_offer()
            .await
            .expect("offer");
        assert_eq!(offer.id, Some(7));
        assert_eq!(offer.free_products_remaining, 2);
        assert_eq!(offer.free_estates_remaining, 1);
        assert!(offer.can_list_free_product());
        assert_eq!(offer.extra.get("user"), Some(&json!(3)));
        assert_eq!(
            offer.updated_at.map(|at| at.to_rfc3339()),
            Some("2024-05-02T05:30:00+00:00".to_string())
        );
    }

    #[tokio::test]
    async fn unauthorized_is_an_error_not_a_missing_offer() {
        let router = Router::new().route(
            "/api/shops/offers/me/",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "expired" }))) }),
        );
        let api = StorefrontClient::new(ApiConfig::with_root(spawn_backend(router).await))
            .with_token("tok");
        let fetcher = OfferFetcher::new(api);
        let err = fetcher.try_fetch_user_offer().await.expect_err("401");
        let OfferError::Request(inner) = err;
        assert_eq!(inner.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(fetcher.fetch_user_offer().await, None);
    }
}
