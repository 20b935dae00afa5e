//! End-to-end tests through the facade surface.
//!
//! Every name here comes from the `aesop` re-exports, so these tests double
//! as a check that the facade exposes a workable API.

use aesop::{
    AesopConfig, ContentFilter, MockDriver, ModificationPipeline, ModificationResult,
    PipelineSession, Stock, StoryDocument, StoryStore, TaskOrchestrator, TaskStatus, Turn,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn bakery_document() -> StoryDocument {
    let turn = Turn {
        turn_number: 1,
        result: "A small bakery opens on the corner.".to_string(),
        news: "Flour prices are expected to rise.".to_string(),
        news_tag: "all".to_string(),
        stocks: vec![Stock {
            name: "Bakery".to_string(),
            risk_level: "low".to_string(),
            description: "A family bakery.".to_string(),
            before_value: 100.0,
            current_value: 105.0,
            expectation: "steady growth".to_string(),
        }],
    };
    StoryDocument::try_from(vec![turn]).unwrap()
}

fn revised_json() -> String {
    serde_json::json!([
        {
            "turn": 1,
            "result": "A cozy cafe opens on the corner and the town lines up for coffee.",
            "news": "Bean prices are expected to rise.",
            "news_tag": "all",
            "stocks": [
                {
                    "name": "Cafe",
                    "risk_level": "low",
                    "description": "A family cafe.",
                    "before_value": 100.0,
                    "current_value": 105.0,
                    "expectation": "steady growth"
                }
            ]
        }
    ])
    .to_string()
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
async fn test_modify_through_facade_persists() {
    let dir = TempDir::new().unwrap();
    let store = StoryStore::new(dir.path()).unwrap();
    store
        .save("bakery_tale", "economy", &bakery_document(), None)
        .await
        .unwrap();

    let driver = MockDriver::new().with_response(revised_json());
    let screen = ContentFilter::with_defaults().unwrap();
    let pipeline = ModificationPipeline::new(driver, store)
        .with_screen(Arc::new(screen))
        .with_config(AesopConfig::default().pipeline);

    let mut session = PipelineSession::new("bakery_tale", "economy");
    let result = pipeline
        .modify(&mut session, "rename the bakery to a cafe")
        .await;
    assert!(result.is_success(), "unexpected failure: {result:?}");

    let reopened = StoryStore::new(dir.path()).unwrap();
    let stored = reopened.load("bakery_tale").await.unwrap();
    assert_eq!(stored.into_document().turns()[0].stocks[0].name, "Cafe");
}

#[tokio::test]
async fn test_background_modification_via_orchestrator() {
    let dir = TempDir::new().unwrap();
    let store = StoryStore::new(dir.path()).unwrap();
    store
        .save("bg_tale", "economy", &bakery_document(), None)
        .await
        .unwrap();

    let driver = MockDriver::new().with_response(revised_json());
    let pipeline = ModificationPipeline::new(driver, store);
    let orchestrator = TaskOrchestrator::new();

    let task_id = orchestrator.submit(async move {
        let mut session = PipelineSession::new("bg_tale", "economy");
        pipeline
            .modify(&mut session, "rename the bakery to a cafe")
            .await
    });

    let status = wait_terminal(&orchestrator, &task_id).await;
    assert_eq!(status, TaskStatus::Completed);
    assert!(orchestrator.result(&task_id).unwrap().is_success());

    let reopened = StoryStore::new(dir.path()).unwrap();
    let stored = reopened.load("bg_tale").await.unwrap();
    assert_eq!(stored.into_document().turns()[0].stocks[0].name, "Cafe");
}

#[tokio::test]
async fn test_batch_modifies_through_orchestrator() {
    let dir = TempDir::new().unwrap();
    let store = StoryStore::new(dir.path()).unwrap();
    store
        .save("tale_one", "economy", &bakery_document(), None)
        .await
        .unwrap();
    store
        .save("tale_two", "economy", &bakery_document(), None)
        .await
        .unwrap();

    let driver = MockDriver::new()
        .with_response(revised_json())
        .with_response(revised_json());
    let pipeline = Arc::new(ModificationPipeline::new(driver, store));
    let orchestrator = TaskOrchestrator::new();

    let items: Vec<_> = ["tale_one", "tale_two"]
        .into_iter()
        .map(|name| {
            let pipeline = Arc::clone(&pipeline);
            async move {
                let mut session = PipelineSession::new(name, "economy");
                pipeline
                    .modify(&mut session, "rename the bakery to a cafe")
                    .await
            }
        })
        .collect();

    let results = orchestrator.submit_batch(items, 2).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(ModificationResult::is_success));
}

#[tokio::test]
async fn test_config_wires_the_store() {
    let dir = TempDir::new().unwrap();
    let mut config = AesopConfig::default();
    config.store.stories_dir = dir.path().join("stories");

    let store = StoryStore::from_config(&config.store).unwrap();
    store
        .save("wired_tale", "economy", &bakery_document(), None)
        .await
        .unwrap();

    let names = store.list().await.unwrap();
    assert_eq!(names, ["wired_tale"]);
}
