//! `ask`: start a consultation and poll it to a terminal state.

use std::fmt::Write as _;
use std::time::Duration;

use consilium_core::api::{
    ConsultationRequest, OrchestrationResult, PollError, SpecialistSelection, TaskStatus,
};
use indicatif::{ProgressBar, ProgressStyle};

use super::cli::AskArgs;
use crate::client::{ClientError, ConsultationClient};

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub interval: Duration,
    pub show_progress: bool,
}

#[derive(Debug)]
pub enum AskOutcome {
    Completed {
        task_id: String,
        result: Box<OrchestrationResult>,
    },
    /// Rejected at start or failed while running.
    Failed { task_id: String, message: String },
}

pub fn build_request(args: &AskArgs) -> ConsultationRequest {
    let request = ConsultationRequest::new(
        args.question.clone(),
        SpecialistSelection::new(args.experts.clone(), args.counsel.clone()),
    );
    if args.scope.is_empty() {
        request
    } else {
        request.with_document_scope(args.scope.clone())
    }
}

fn progress_bar(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Start, then poll `status` until the task is terminal. The bar never moves backwards.
pub async fn drive(
    client: &dyn ConsultationClient,
    request: &ConsultationRequest,
    opts: &PollOptions,
) -> Result<AskOutcome, ClientError> {
    let receipt = client.start(request).await?;
    let task_id = receipt.task_id.clone();
    if receipt.is_rejected() {
        return Ok(AskOutcome::Failed {
            task_id,
            message: receipt.error_message.unwrap_or_default(),
        });
    }

    tracing::debug!(target: "consilium.cli", task_id = %task_id, "consultation started");
    let bar = progress_bar(opts.show_progress);
    let mut shown: u8 = 0;

    let outcome = loop {
        let view = client.status(&task_id).await?;
        if view.progress_percent > shown {
            shown = view.progress_percent;
            bar.set_position(u64::from(shown));
        }
        if let Some(stage) = &view.stage_description {
            bar.set_message(stage.clone());
        }

        match view.status {
            TaskStatus::Completed => match client.result(&task_id).await {
                Ok(result) => {
                    break AskOutcome::Completed {
                        task_id,
                        result: Box::new(result),
                    }
                }
                Err(ClientError::Poll(PollError::NotReady { .. })) => {}
                Err(e) => return Err(e),
            },
            TaskStatus::Failed => {
                break AskOutcome::Failed {
                    task_id,
                    message: view.error_message.unwrap_or_default(),
                }
            }
            TaskStatus::Created | TaskStatus::Running => {}
        }
        tokio::time::sleep(opts.interval).await;
    };

    match &outcome {
        AskOutcome::Completed { .. } => bar.finish_with_message("done"),
        AskOutcome::Failed { .. } => bar.abandon_with_message("failed"),
    }
    Ok(outcome)
}

/// Human readable answer with a per-specialist footer.
pub fn render_result(result: &OrchestrationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.answer.trim());

    if !result.outcomes.is_empty() {
        let _ = writeln!(out, "\nSpecialists:");
        for outcome in &result.outcomes {
            match (outcome.opinion(), outcome.failure_reason()) {
                (Some(op), _) => {
                    let _ = writeln!(
                        out,
                        "  + {} ({}, confidence {:.2})",
                        outcome.specialist_id,
                        outcome.category.label(),
                        op.confidence
                    );
                }
                (None, reason) => {
                    let _ = writeln!(
                        out,
                        "  - {} ({}): {}",
                        outcome.specialist_id,
                        outcome.category.label(),
                        reason.unwrap_or("no opinion")
                    );
                }
            }
        }
    }

    if !result.context_document_ids.is_empty() {
        let _ = writeln!(out, "\nContext: {}", result.context_document_ids.join(", "));
    }
    if result.metadata.retrieval_failed {
        let _ = writeln!(out, "\n(document retrieval was unavailable)");
    }
    out.trim_end().to_string()
}
