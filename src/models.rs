use crate::storefront::Offer;
use crate::submission::Notification;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(error: &str, detail: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub offer: Option<Offer>,
}

/// Body of `POST /products`, whatever the outcome.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
    pub notification: Notification,
}
