mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{
    app, poll_until_terminal, services, standard_panel, Behavior, CompilerMode, MockCompiler,
    MockRetriever, MockSpecialist,
};
use consilium_core::api::{
    ConsultationRequest, PollError, SpecialistCategory, SpecialistSelection, TaskEvent,
    TaskRegistry, TaskStatus,
};

fn request(question: &str, experts: &[&str], counsel: &[&str]) -> ConsultationRequest {
    ConsultationRequest::new(
        question,
        SpecialistSelection::new(
            experts.iter().map(|s| s.to_string()).collect(),
            counsel.iter().map(|s| s.to_string()).collect(),
        ),
    )
}

#[tokio::test]
async fn start_records_every_band_and_reaches_100() {
    let ctx = app(
        services(
            standard_panel(),
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        1_000,
    );
    let mut events = ctx.registry().subscribe();

    let receipt = ctx
        .consultations()
        .start(request(
            "What is the liability exposure?",
            &["medical"],
            &["labor", "civil"],
        ))
        .await
        .unwrap();
    assert_eq!(receipt.status, TaskStatus::Running);

    let mut percents = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            TaskEvent::Progress {
                task_id,
                progress_percent,
                ..
            } if task_id == receipt.task_id => percents.push(progress_percent),
            TaskEvent::Completed { task_id, .. } if task_id == receipt.task_id => {
                percents.push(100);
                break;
            }
            TaskEvent::Failed { error, .. } => panic!("unexpected failure: {error}"),
            _ => {}
        }
    }

    assert_eq!(
        percents,
        vec![0, 0, 5, 20, 20, 50, 50, 65, 80, 80, 95, 100]
    );

    let result = ctx.polling().result(&receipt.task_id).await.unwrap();
    assert_eq!(result.outcomes.len(), 3);
    let status = ctx.polling().status(&receipt.task_id).await.unwrap();
    assert_eq!(status.progress_percent, 100);
    assert_eq!(status.stage_description, None);
}

#[tokio::test]
async fn empty_question_fails_immediately() {
    let ctx = app(
        services(
            standard_panel(),
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        1_000,
    );

    let receipt = ctx
        .consultations()
        .start(ConsultationRequest::default())
        .await
        .unwrap();

    assert!(receipt.is_rejected());
    assert_eq!(
        receipt.error_message.as_deref(),
        Some("validation error: question must not be empty")
    );

    let task = ctx.registry().get(&receipt.task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.progress_percent, 0);
    assert_eq!(
        task.error.unwrap().diagnostic,
        Some(json!({ "kind": "validation" }))
    );
}

#[tokio::test]
async fn retrieval_outage_still_completes() {
    let ctx = app(
        services(
            standard_panel(),
            MockRetriever::failing(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        1_000,
    );

    let receipt = ctx
        .consultations()
        .start(request("q", &["medical"], &["labor"]))
        .await
        .unwrap();
    let seen = poll_until_terminal(&ctx, &receipt.task_id).await;

    assert_eq!(seen.last().unwrap().status, TaskStatus::Completed);
    let result = ctx.polling().result(&receipt.task_id).await.unwrap();
    assert!(result.context_document_ids.is_empty());
    assert!(result.metadata.retrieval_failed);
}

#[tokio::test]
async fn retriever_panic_still_completes() {
    let ctx = app(
        services(
            standard_panel(),
            MockRetriever::panicking(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        1_000,
    );

    let receipt = ctx
        .consultations()
        .start(request("q", &["medical"], &[]))
        .await
        .unwrap();
    let seen = poll_until_terminal(&ctx, &receipt.task_id).await;

    let last = seen.last().unwrap();
    assert_eq!(last.status, TaskStatus::Completed);
    assert_eq!(last.progress_percent, 100);
    assert_eq!(last.error_message, None);
    let result = ctx.polling().result(&receipt.task_id).await.unwrap();
    assert!(result.metadata.retrieval_failed);
}

#[tokio::test]
async fn no_specialists_compiles_from_context() {
    let ctx = app(
        services(
            standard_panel(),
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        1_000,
    );

    let receipt = ctx
        .consultations()
        .start(request("Summarize the lease", &[], &[]))
        .await
        .unwrap();
    let seen = poll_until_terminal(&ctx, &receipt.task_id).await;

    let last = seen.last().unwrap();
    assert_eq!(last.status, TaskStatus::Completed);
    assert_eq!(last.progress_percent, 100);
    let result = ctx.polling().result(&receipt.task_id).await.unwrap();
    assert_eq!(result.answer, "0 opinions, 2 snippets");
}

#[tokio::test]
async fn observed_progress_never_decreases() {
    let panel = vec![
        MockSpecialist::new(
            "medical",
            SpecialistCategory::Expert,
            Behavior::Sleep(Duration::from_millis(40)),
        ),
        MockSpecialist::new(
            "labor",
            SpecialistCategory::Counsel,
            Behavior::Sleep(Duration::from_millis(40)),
        ),
    ];
    let ctx = app(
        services(
            panel,
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        1_000,
    );

    let receipt = ctx
        .consultations()
        .start(request("q", &["medical"], &["labor"]))
        .await
        .unwrap();
    let seen = poll_until_terminal(&ctx, &receipt.task_id).await;

    assert!(seen
        .windows(2)
        .all(|w| w[0].progress_percent <= w[1].progress_percent));
    assert!(seen.iter().all(|v| v.progress_percent <= 100));
    assert_eq!(seen.last().unwrap().progress_percent, 100);
}

#[tokio::test]
async fn result_is_not_ready_while_running() {
    let panel = vec![MockSpecialist::new(
        "medical",
        SpecialistCategory::Expert,
        Behavior::Sleep(Duration::from_millis(300)),
    )];
    let ctx = app(
        services(
            panel,
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        5_000,
    );

    let receipt = ctx
        .consultations()
        .start(request("q", &["medical"], &[]))
        .await
        .unwrap();

    let err = ctx.polling().result(&receipt.task_id).await.unwrap_err();
    assert!(matches!(
        err,
        PollError::NotReady {
            status: TaskStatus::Running,
            ..
        }
    ));

    poll_until_terminal(&ctx, &receipt.task_id).await;
    assert!(ctx.polling().result(&receipt.task_id).await.is_ok());
}

#[tokio::test]
async fn failed_result_reports_status_message() {
    let ctx = app(
        services(
            standard_panel(),
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Fail),
        ),
        1_000,
    );

    let receipt = ctx
        .consultations()
        .start(request("q", &["medical"], &[]))
        .await
        .unwrap();
    let seen = poll_until_terminal(&ctx, &receipt.task_id).await;
    let status = seen.last().unwrap();
    assert_eq!(status.status, TaskStatus::Failed);

    let err = ctx.polling().result(&receipt.task_id).await.unwrap_err();
    assert_eq!(Some(err.to_string()), status.error_message);
    assert_eq!(
        err.to_string(),
        "compilation error: compiler failed: model refused"
    );

    let task = ctx.registry().get(&receipt.task_id).await.unwrap();
    assert_eq!(
        task.error.unwrap().diagnostic,
        Some(json!({ "kind": "compilation" }))
    );
}

#[tokio::test]
async fn panic_in_pipeline_becomes_failed_record() {
    let ctx = app(
        services(
            standard_panel(),
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Panic),
        ),
        1_000,
    );

    let receipt = ctx
        .consultations()
        .start(request("q", &[], &["civil"]))
        .await
        .unwrap();
    let seen = poll_until_terminal(&ctx, &receipt.task_id).await;

    let last = seen.last().unwrap();
    assert_eq!(last.status, TaskStatus::Failed);
    assert_eq!(
        last.error_message.as_deref(),
        Some("internal error: compiler bug")
    );
    let task = ctx.registry().get(&receipt.task_id).await.unwrap();
    assert_eq!(
        task.error.unwrap().diagnostic.unwrap()["kind"],
        json!("panic")
    );
}

#[tokio::test]
async fn caller_chosen_ids_must_be_unique() {
    let ctx = app(
        services(
            standard_panel(),
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        1_000,
    );

    ctx.consultations()
        .start_with_id("case-42".into(), request("q", &[], &[]))
        .await
        .unwrap();
    let err = ctx
        .consultations()
        .start_with_id("case-42".into(), request("q", &[], &[]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "duplicate task id: case-42");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_progress_writes_keep_records_consistent() {
    let registry = TaskRegistry::new();
    let ids: Vec<String> = (0..64).map(|i| format!("task-{i}")).collect();
    for id in &ids {
        registry
            .create(id, ConsultationRequest::default())
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for (n, id) in ids.iter().enumerate() {
        for writer in 0..4 {
            let registry = registry.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                for step in 0..25 {
                    let percent = (step * 4 + writer) as i32;
                    // rejected with AlreadyTerminal once the task has failed
                    let _ = registry
                        .update_progress(&id, &format!("writer {writer} step {step}"), percent)
                        .await;
                }
            }));
        }
        if n % 2 == 0 {
            let registry = registry.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                let _ = registry.fail(&id, "stopped", None).await;
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for id in &ids {
        let task = registry.get(id).await.unwrap();
        assert!(task.is_consistent(), "inconsistent record: {task:?}");
        assert!(task.progress_percent <= 100);
    }
    let stats = registry.stats().await;
    assert_eq!(stats.total(), ids.len());
}

#[tokio::test]
async fn registry_handle_is_shared_between_runner_and_polling() {
    let ctx = Arc::new(app(
        services(
            standard_panel(),
            MockRetriever::ok(),
            MockCompiler::new(CompilerMode::Summarize),
        ),
        1_000,
    ));

    let receipt = ctx
        .consultations()
        .start(request("q", &["engineering"], &[]))
        .await
        .unwrap();
    poll_until_terminal(&ctx, &receipt.task_id).await;

    let listed = ctx.registry().list(Some(TaskStatus::Completed), None).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, receipt.task_id);
}
