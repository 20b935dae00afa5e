//! Tests for the background task orchestrator.

use aesop_core::{Diagnostics, ModificationResult, Stock, StoryDocument, Turn};
use aesop_error::{AesopError, AesopErrorKind, TaskErrorKind};
use aesop_tasks::{OrchestratorConfig, TaskOrchestrator, TaskStatus};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn sample_document(marker: &str) -> StoryDocument {
    let turn = Turn {
        turn_number: 1,
        result: marker.to_string(),
        news: "Flour prices rise".to_string(),
        news_tag: "all".to_string(),
        stocks: vec![Stock {
            name: "Bakery".to_string(),
            risk_level: "low".to_string(),
            description: String::new(),
            before_value: 100.0,
            current_value: 105.0,
            expectation: "stable".to_string(),
        }],
    };
    StoryDocument::try_from(vec![turn]).unwrap()
}

fn sample_result(marker: &str) -> ModificationResult {
    ModificationResult::Success {
        document: sample_document(marker),
        diagnostics: Diagnostics::default(),
    }
}

fn marker_of(result: &ModificationResult) -> String {
    result.document().unwrap().turns()[0].result.clone()
}

async fn panicking_work() -> ModificationResult {
    panic!("worker exploded")
}

fn task_kind(err: &AesopError) -> &TaskErrorKind {
    match err.kind() {
        AesopErrorKind::Task(e) => &e.kind,
        other => panic!("expected task error, got {other}"),
    }
}

async fn wait_terminal(orchestrator: &TaskOrchestrator, task_id: &str) -> TaskStatus {
    for _ in 0..400 {
        let status = orchestrator.status(task_id).unwrap();
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {task_id} never reached a terminal status");
}

#[tokio::test]
async fn test_submit_and_poll_result() {
    let orchestrator = TaskOrchestrator::new();
    let task_id = orchestrator.submit(async { sample_result("revised") });

    let status = wait_terminal(&orchestrator, &task_id).await;
    assert_eq!(status, TaskStatus::Completed);

    let result = orchestrator.result(&task_id).unwrap();
    assert!(result.is_success());
    assert_eq!(marker_of(&result), "revised");
}

#[tokio::test]
async fn test_submit_with_caller_id() {
    let orchestrator = TaskOrchestrator::new();
    let id = orchestrator.submit_with_id("modify_bakery", async { sample_result("renamed") });
    assert_eq!(id, "modify_bakery");

    let status = wait_terminal(&orchestrator, "modify_bakery").await;
    assert_eq!(status, TaskStatus::Completed);
    assert!(orchestrator.result("modify_bakery").unwrap().is_success());
}

#[tokio::test]
async fn test_result_before_completion_is_not_ready() {
    let orchestrator = TaskOrchestrator::new();
    let task_id = orchestrator.submit(async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        sample_result("slow")
    });

    let err = orchestrator.result(&task_id).unwrap_err();
    match task_kind(&err) {
        TaskErrorKind::NotReady { id, status } => {
            assert_eq!(id, &task_id);
            assert!(status == "pending" || status == "running", "status: {status}");
        }
        other => panic!("expected NotReady, got {other}"),
    }
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let orchestrator = TaskOrchestrator::new();

    let err = orchestrator.status("no-such-task").unwrap_err();
    assert!(matches!(task_kind(&err), TaskErrorKind::NotFound(id) if id == "no-such-task"));

    let err = orchestrator.result("no-such-task").unwrap_err();
    assert!(matches!(task_kind(&err), TaskErrorKind::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_marks_cancelled_and_discards_result() {
    let orchestrator = TaskOrchestrator::new();
    let task_id = orchestrator.submit(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        sample_result("never seen")
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    orchestrator.cancel(&task_id).unwrap();
    assert_eq!(orchestrator.status(&task_id).unwrap(), TaskStatus::Cancelled);

    let err = orchestrator.result(&task_id).unwrap_err();
    assert!(matches!(task_kind(&err), TaskErrorKind::Cancelled(_)));

    // the aborted worker must not overwrite the cancelled record
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(orchestrator.status(&task_id).unwrap(), TaskStatus::Cancelled);

    // cancelling a terminal task is a no-op
    orchestrator.cancel(&task_id).unwrap();
    assert_eq!(orchestrator.status(&task_id).unwrap(), TaskStatus::Cancelled);
}

#[tokio::test]
async fn test_failed_result_still_retrievable() {
    let orchestrator = TaskOrchestrator::new();
    let task_id = orchestrator.submit(async {
        ModificationResult::Failure {
            error: aesop_error::JsonError::new("model output was not JSON").into(),
            detail: "model output was not JSON".to_string(),
            document: None,
            diagnostics: Diagnostics::default(),
        }
    });

    let status = wait_terminal(&orchestrator, &task_id).await;
    assert_eq!(status, TaskStatus::Failed);

    let result = orchestrator.result(&task_id).unwrap();
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_worker_panic_is_recorded_as_failed() {
    let orchestrator = TaskOrchestrator::new();
    let task_id = orchestrator.submit(panicking_work());

    let status = wait_terminal(&orchestrator, &task_id).await;
    assert_eq!(status, TaskStatus::Failed);

    let err = orchestrator.result(&task_id).unwrap_err();
    match task_kind(&err) {
        TaskErrorKind::WorkerFailed { id, message } => {
            assert_eq!(id, &task_id);
            assert!(message.contains("panicked"), "message: {message}");
        }
        other => panic!("expected WorkerFailed, got {other}"),
    }
}

#[tokio::test]
async fn test_batch_respects_concurrency_bound() {
    let orchestrator = TaskOrchestrator::new();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut items = Vec::new();
    for i in 0..5 {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        items.push(async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            sample_result(&format!("item {i}"))
        });
    }

    let results = orchestrator.submit_batch(items, 2).await;

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(ModificationResult::is_success));
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak concurrency was {peak}");
}

#[tokio::test]
async fn test_batch_failure_is_isolated_and_positional() {
    let orchestrator = TaskOrchestrator::new();
    type Work = Pin<Box<dyn Future<Output = ModificationResult> + Send>>;
    let items: Vec<Work> = vec![
        Box::pin(async { sample_result("first") }),
        Box::pin(panicking_work()),
        Box::pin(async { sample_result("third") }),
    ];

    let results = orchestrator.submit_batch(items, 3).await;

    assert_eq!(results.len(), 3);
    assert_eq!(marker_of(&results[0]), "first");
    assert_eq!(marker_of(&results[2]), "third");
    match &results[1] {
        ModificationResult::Failure { error, detail, .. } => {
            assert!(matches!(task_kind(error), TaskErrorKind::WorkerFailed { .. }));
            assert!(detail.contains("panic"), "detail: {detail}");
        }
        ModificationResult::Success { .. } => panic!("middle item should have failed"),
    }
}

#[tokio::test]
async fn test_zero_bound_falls_back_to_config_default() {
    let config = OrchestratorConfig {
        max_concurrent_default: 1,
        retention_cap: 256,
    };
    let orchestrator = TaskOrchestrator::from_config(&config);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut items = Vec::new();
    for _ in 0..3 {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        items.push(async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            sample_result("serial")
        });
    }

    let results = orchestrator.submit_batch(items, 0).await;

    assert_eq!(results.len(), 3);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retention_evicts_oldest_terminal() {
    let config = OrchestratorConfig {
        max_concurrent_default: 4,
        retention_cap: 3,
    };
    let orchestrator = TaskOrchestrator::from_config(&config);

    let mut ids = Vec::new();
    for i in 0..5 {
        let id = orchestrator.submit(async move { sample_result(&format!("story {i}")) });
        wait_terminal(&orchestrator, &id).await;
        ids.push(id);
    }

    let err = orchestrator.status(&ids[0]).unwrap_err();
    assert!(matches!(task_kind(&err), TaskErrorKind::NotFound(_)));
    assert!(orchestrator.status(&ids[1]).is_err());
    assert_eq!(orchestrator.status(&ids[4]).unwrap(), TaskStatus::Completed);
    assert_eq!(marker_of(&orchestrator.result(&ids[4]).unwrap()), "story 4");
}

#[tokio::test]
async fn test_live_tasks_survive_retention_pressure() {
    let config = OrchestratorConfig {
        max_concurrent_default: 4,
        retention_cap: 2,
    };
    let orchestrator = TaskOrchestrator::from_config(&config);

    let slow = |marker: &'static str| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        sample_result(marker)
    };
    let first = orchestrator.submit(slow("one"));
    let second = orchestrator.submit(slow("two"));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let third = orchestrator.submit(async { sample_result("three") });
    wait_terminal(&orchestrator, &third).await;

    // registry holds more records than the cap while tasks are live
    assert!(!orchestrator.status(&first).unwrap().is_terminal());
    assert!(!orchestrator.status(&second).unwrap().is_terminal());
    assert_eq!(marker_of(&orchestrator.result(&third).unwrap()), "three");

    orchestrator.cancel(&first).unwrap();
    orchestrator.cancel(&second).unwrap();
}
