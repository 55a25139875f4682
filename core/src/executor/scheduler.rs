use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::SpecialistError;

use super::traits::Specialist;
use super::types::{ContextSnippet, Opinion, SpecialistCategory, SpecialistOutcome};

/// One position in a delegation batch. `specialist` is `None` when the id
/// could not be resolved at dispatch time.
pub struct ConsultSlot {
    pub specialist_id: String,
    pub specialist: Option<Arc<dyn Specialist>>,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Shared per-call timeout.
    pub timeout: Duration,
    /// `None` means every call in the batch is in flight at once.
    pub max_concurrency: Option<usize>,
}

/// Consult every slot concurrently and return one outcome per slot, in slot order.
///
/// A timeout, error or panic in one call is converted into that slot's failure
/// outcome before the join, so siblings always run to completion.
///
/// # Arguments
///
/// * `category` - Category recorded on each outcome
/// * `slots` - Specialists in selection order
/// * `context` - Retrieved snippets shared by every call
/// * `question` - The user's question
/// * `metadata` - Opaque per-request metadata forwarded to each specialist
/// * `opts` - Timeout and optional concurrency bound
pub async fn consult_batch(
    category: SpecialistCategory,
    slots: &[ConsultSlot],
    context: &[ContextSnippet],
    question: &str,
    metadata: Option<&Value>,
    opts: &BatchOptions,
) -> Vec<SpecialistOutcome> {
    let sem = opts
        .max_concurrency
        .map(|n| Arc::new(Semaphore::new(n.max(1))));

    let futs = slots.iter().map(|slot| {
        let sem = sem.clone();
        async move {
            let _permit = match sem {
                Some(sem) => match sem.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        return SpecialistOutcome::failure(
                            &slot.specialist_id,
                            category,
                            "semaphore closed unexpectedly",
                            0,
                        )
                    }
                },
                None => None,
            };

            let started = Instant::now();
            let res = consult_one(slot, context, question, metadata, opts.timeout).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match res {
                Ok(opinion) => {
                    tracing::debug!(
                        target: "consilium.executor",
                        specialist_id = %slot.specialist_id,
                        category = category.as_str(),
                        duration_ms = duration_ms,
                        confidence = opinion.confidence,
                        "consultation succeeded"
                    );
                    SpecialistOutcome::success(&slot.specialist_id, category, opinion, duration_ms)
                }
                Err(err) => {
                    tracing::warn!(
                        target: "consilium.executor",
                        specialist_id = %slot.specialist_id,
                        category = category.as_str(),
                        duration_ms = duration_ms,
                        error = %err,
                        "consultation failed"
                    );
                    SpecialistOutcome::failure(
                        &slot.specialist_id,
                        category,
                        err.to_string(),
                        duration_ms,
                    )
                }
            }
        }
    });

    // join_all keeps input order regardless of completion order
    join_all(futs).await
}

async fn consult_one(
    slot: &ConsultSlot,
    context: &[ContextSnippet],
    question: &str,
    metadata: Option<&Value>,
    timeout: Duration,
) -> Result<Opinion, SpecialistError> {
    let Some(specialist) = slot.specialist.as_ref() else {
        return Err(SpecialistError::Unavailable(slot.specialist_id.clone()));
    };

    let call = AssertUnwindSafe(specialist.consult(context, question, metadata)).catch_unwind();
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(res)) => res,
        Ok(Err(payload)) => Err(SpecialistError::Panicked(panic_message(payload.as_ref()))),
        Err(_) => Err(SpecialistError::Timeout(timeout.as_millis() as u64)),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
