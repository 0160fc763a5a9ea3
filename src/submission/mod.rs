pub mod form;
pub mod normalize;
pub mod notify;
pub mod payload;
pub mod pipeline;
pub mod validate;

use crate::storefront::client::ApiRequestError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use form::{FileUpload, FormValue, RawFormInput};
pub use notify::{Notification, Severity};
pub use pipeline::{SubmissionPipeline, SubmissionReceipt, SubmissionSlot};

pub const FALLBACK_MESSAGE: &str = "Failed to create product";
pub const MISSING_ID_MESSAGE: &str = "Failed to create product: No product ID returned";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmissionError {
    #[error("Field \"{field}\" is required.")]
    Validation { field: &'static str },
    #[error("{}", join_field_errors(.fields))]
    Rejected { status: u16, fields: Vec<FieldError> },
    #[error("{}", failure_text(.message))]
    Failed { message: Option<String> },
    #[error("A product submission is already in progress.")]
    AlreadyInFlight,
}

impl SubmissionError {
    pub fn failed(message: impl Into<String>) -> Self {
        SubmissionError::Failed {
            message: Some(message.into()),
        }
    }

    /// A JSON object error body becomes per-field messages; anything else is
    /// reported through the error's own message.
    pub fn from_api(err: ApiRequestError) -> Self {
        if let (Some(status), Some(Value::Object(body))) = (err.status(), err.body())
            && !body.is_empty()
        {
            return SubmissionError::Rejected {
                status: status.as_u16(),
                fields: body
                    .iter()
                    .map(|(field, value)| FieldError::from_json(field, value))
                    .collect(),
            };
        }
        SubmissionError::failed(err.to_string())
    }
}

/// Messages the backend attached to one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

impl FieldError {
    fn from_json(field: &str, value: &Value) -> Self {
        let messages = match value {
            Value::Array(items) => items.iter().map(message_text).collect(),
            other => vec![message_text(other)],
        };
        Self {
            field: field.to_string(),
            messages,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.messages.join(", "))
    }
}

fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn join_field_errors(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn failure_text(message: &Option<String>) -> &str {
    message
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(FALLBACK_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn rejected(body: Value) -> SubmissionError {
        SubmissionError::from_api(ApiRequestError::Status {
            status: StatusCode::BAD_REQUEST,
            body: Some(body),
        })
    }

    #[test]
    fn single_field_error() {
        let err = rejected(json!({ "price": ["must be positive"] }));
        assert_eq!(err.to_string(), "price: must be positive");
    }

    #[test]
    fn multiple_fields_keep_backend_order() {
        let err = rejected(json!({
            "price": ["must be positive", "too many digits"],
            "brand_id": "Invalid pk \"99\" - object does not exist.",
            "attribute_value_ids": [17]
        }));
        assert_eq!(
            err.to_string(),
            "price: must be positive, too many digits; \
             brand_id: Invalid pk \"99\" - object does not exist.; \
             attribute_value_ids: 17"
        );
    }

    #[test]
    fn non_object_bodies_are_generic() {
        let err = rejected(json!(["oops"]));
        assert_eq!(err.to_string(), "HTTP 400 Bad Request");
        let err = rejected(json!({}));
        assert!(matches!(err, SubmissionError::Failed { .. }));

        let err = SubmissionError::from_api(ApiRequestError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: None,
        });
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway");
    }

    #[test]
    fn transport_errors_use_their_message() {
        let err = SubmissionError::from_api(ApiRequestError::Transport("connection refused".into()));
        assert_eq!(err.to_string(), "request failed: connection refused");
    }

    #[test]
    fn empty_message_falls_back() {
        let err = SubmissionError::Failed { message: None };
        assert_eq!(err.to_string(), FALLBACK_MESSAGE);
        let err = SubmissionError::failed("  ");
        assert_eq!(err.to_string(), FALLBACK_MESSAGE);
    }

    #[test]
    fn validation_names_the_field() {
        let err = SubmissionError::Validation { field: "price" };
        assert_eq!(err.to_string(), "Field \"price\" is required.");
    }
}
