use crate::models::ApiError;
use crate::submission::SubmissionSlot;
use axum::{
    Json,
    body::Body,
    http::{self, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::{HashMap, hash_map::DefaultHasher},
    convert::Infallible,
    hash::{Hash, Hasher},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::debug;

/// The caller's bearer token, forwarded untouched to the storefront backend.
#[derive(Clone)]
pub struct AccessToken(pub String);

impl AccessToken {
    fn session_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

pub async fn require_access_token(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Infallible> {
    let Some(token) = extract_bearer(request.headers()) else {
        return Ok(unauthorized_response(
            "missing_access_token",
            "Provide Authorization: Bearer <token>",
        ));
    };
    request.extensions_mut().insert(AccessToken(token));
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &http::HeaderMap) -> Option<String> {
    let raw = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    if raw.len() >= 7 && raw[..6].eq_ignore_ascii_case("bearer") {
        Some(raw[6..].trim().to_string()).filter(|token| !token.is_empty())
    } else {
        None
    }
}

fn unauthorized_response(code: &str, message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ApiError::new(code, message))).into_response()
}

/// One submission slot per caller, so a double submit from one session is
/// rejected while other sessions proceed.
#[derive(Clone, Default)]
pub struct SessionSlots {
    slots: Arc<Mutex<HashMap<u64, SubmissionSlot>>>,
}

impl SessionSlots {
    pub async fn slot_for(&self, token: &AccessToken) -> SubmissionSlot {
        let mut guard = self.slots.lock().await;
        let before = guard.len();
        guard.retain(|_, slot| slot.is_busy() || slot.is_shared());
        if guard.len() < before {
            debug!(
                target = "storefront.api",
                pruned = before - guard.len(),
                "idle_submission_slots_pruned"
            );
        }
        guard.entry(token.session_key()).or_default().clone()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_is_extracted_case_insensitively() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("bearer  abc.def "),
        );
        assert_eq!(extract_bearer(&headers).as_deref(), Some("abc.def"));

        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcg=="),
        );
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(http::header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer(&headers), None);
    }

    #[tokio::test]
    async fn same_token_shares_a_slot() {
        let slots = SessionSlots::default();
        let alice = AccessToken("alice".into());
        let first = slots.slot_for(&alice).await;
        let _guard = first.try_acquire().expect("free");
        let again = slots.slot_for(&alice).await;
        assert!(again.is_busy());
        let bob = slots.slot_for(&AccessToken("bob".into())).await;
        assert!(!bob.is_busy());
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let slots = SessionSlots::default();
        drop(slots.slot_for(&AccessToken("alice".into())).await);
        drop(slots.slot_for(&AccessToken("bob".into())).await);
        assert_eq!(slots.len().await, 1);
    }
}
