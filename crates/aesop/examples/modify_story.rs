//! Interactive story modification example.
//!
//! Seeds a small starter story if none exists, then runs one free-text edit
//! request through the full pipeline against the Gemini API and prints the
//! revised turns.
//!
//! # Environment Variables
//!
//! - `GEMINI_API_KEY`: Google Gemini API key (also read from `.env`)
//! - `RUST_LOG`: tracing filter, e.g. `aesop_narrative=debug`
//!
//! # Usage
//!
//! ```bash
//! export GEMINI_API_KEY="your_api_key"
//! cargo run --example modify_story -- "rename the bakery to a cafe"
//! ```

use aesop::{
    AesopConfig, ContentFilter, GeminiDriver, ModificationPipeline, ModificationResult,
    PipelineSession, Stock, StoryDocument, StoryStore, Turn,
};
use std::sync::Arc;
use tracing::info;

const STORY_NAME: &str = "bakery_tale";
const CATEGORY: &str = "economy";

fn starter_story() -> StoryDocument {
    let turns = vec![
        Turn {
            turn_number: 1,
            result: "A small bakery opens on the corner and the whole town lines up for bread."
                .to_string(),
            news: "Flour prices are expected to rise next month.".to_string(),
            news_tag: "all".to_string(),
            stocks: vec![Stock {
                name: "Bakery".to_string(),
                risk_level: "low".to_string(),
                description: "A family bakery with a loyal morning crowd.".to_string(),
                before_value: 100.0,
                current_value: 105.0,
                expectation: "steady growth".to_string(),
            }],
        },
        Turn {
            turn_number: 2,
            result: "The bakery weathers the flour price jump by baking smaller loaves."
                .to_string(),
            news: "A food festival is announced for the town square.".to_string(),
            news_tag: "all".to_string(),
            stocks: vec![Stock {
                name: "Bakery".to_string(),
                risk_level: "low".to_string(),
                description: "A family bakery with a loyal morning crowd.".to_string(),
                before_value: 105.0,
                current_value: 102.0,
                expectation: "recovery after the festival".to_string(),
            }],
        },
    ];
    StoryDocument::try_from(turns).expect("starter story is non-empty")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    aesop::init_telemetry()?;

    let config = AesopConfig::load()?;
    let store = StoryStore::from_config(&config.store)?;

    // Seed the starter story on first run
    if store.load(STORY_NAME).await.is_err() {
        store
            .save(STORY_NAME, CATEGORY, &starter_story(), None)
            .await?;
        info!(story = STORY_NAME, "Seeded starter story");
    }

    let request = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "rename the bakery to a cafe".to_string());

    let driver = GeminiDriver::new()?.with_rpm_limit(10);
    let screen = ContentFilter::new(config.filter.clone())?;
    let pipeline = ModificationPipeline::new(driver, store)
        .with_screen(Arc::new(screen))
        .with_config(config.pipeline.clone());

    let mut session = PipelineSession::new(STORY_NAME, CATEGORY);
    info!(request = %request, "Submitting edit request");

    match pipeline.modify(&mut session, &request).await {
        ModificationResult::Success { document, diagnostics } => {
            println!("Revised story ({} turns):", document.len());
            for turn in &document {
                println!("  turn {}: {}", turn.turn_number, turn.result);
            }
            if let Some(kind) = diagnostics.classification {
                println!("Classified as: {kind}");
            }
            for notice in &diagnostics.notices {
                println!("Notice: {notice}");
            }
        }
        ModificationResult::Failure { error, detail, .. } => {
            eprintln!("Modification failed: {error}");
            eprintln!("  {detail}");
        }
    }

    Ok(())
}
