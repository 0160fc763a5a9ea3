use crate::storefront::{client::StorefrontApi, products::CreatedProduct};
use crate::submission::{
    MISSING_ID_MESSAGE, SubmissionError, form::RawFormInput, normalize::normalize,
    payload::ProductPayload, validate::validate,
};
use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Holds at most one outstanding submission. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct SubmissionSlot {
    busy: Arc<AtomicBool>,
}

impl SubmissionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<SlotGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotGuard {
                busy: self.busy.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Whether anyone besides this handle still holds the slot.
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.busy) > 1
    }
}

/// Releases the slot when dropped, whatever the submission's outcome.
#[derive(Debug)]
pub struct SlotGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub product: CreatedProduct,
}

#[derive(Clone)]
pub struct SubmissionPipeline<A> {
    api: A,
    slot: SubmissionSlot,
}

impl<A: StorefrontApi> SubmissionPipeline<A> {
    pub fn new(api: A) -> Self {
        Self::with_slot(api, SubmissionSlot::new())
    }

    pub fn with_slot(api: A, slot: SubmissionSlot) -> Self {
        Self { api, slot }
    }

    pub fn is_submitting(&self) -> bool {
        self.slot.is_busy()
    }

    /// Normalize, validate, and post one product form. A call made while an
    /// earlier one is still pending is rejected without touching the backend.
    pub async fn submit(&self, raw: RawFormInput) -> Result<SubmissionReceipt, SubmissionError> {
        let Some(_guard) = self.slot.try_acquire() else {
            warn!(
                target = "storefront.submission",
                "submission_rejected_in_flight"
            );
            return Err(SubmissionError::AlreadyInFlight);
        };

        let submission_id = Uuid::new_v4();
        let started = Instant::now();
        let product = validate(normalize(raw)).inspect_err(|err| {
            info!(
                target = "storefront.submission",
                submission_id = %submission_id,
                error = %err,
                "submission_invalid"
            );
        })?;

        let payload = ProductPayload::from_product(product);
        payload.log_entries(submission_id);

        let outcome = match self.api.create_product(payload).await {
            Ok(body) => CreatedProduct::from_response(&body)
                .map(|product| SubmissionReceipt {
                    submission_id,
                    product,
                })
                .ok_or_else(|| SubmissionError::failed(MISSING_ID_MESSAGE)),
            Err(err) => Err(SubmissionError::from_api(err)),
        };

        let elapsed_ms = started.elapsed().as_millis();
        match &outcome {
            Ok(receipt) => {
                crate::metrics::submission_finished("created", elapsed_ms);
                info!(
                    target = "storefront.submission",
                    submission_id = %submission_id,
                    product_id = %receipt.product.id,
                    elapsed_ms = elapsed_ms as u64,
                    "product_created"
                );
            }
            Err(err) => {
                crate::metrics::submission_finished("failed", elapsed_ms);
                warn!(
                    target = "storefront.submission",
                    submission_id = %submission_id,
                    error = %err,
                    elapsed_ms = elapsed_ms as u64,
                    "product_creation_failed"
                );
            }
        }
        outcome
    }
}
